//! Request level tests against a real database.
//!
//! These need a Postgres database named by `SCRIBE_TEST_DATABASE_URL` and are skipped when it
//! isn't set. Everything runs inside a test transaction that is never committed.
use chrono::{Duration, NaiveDateTime, Utc};
use diesel::{Connection as _, ExpressionMethods, QueryDsl, RunQueryDsl};
use gotham::test::{TestResponse, TestServer};
use http::{header, HeaderValue, StatusCode};

use std::{
    fs,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Once,
    },
};

use crate::{
    category::{self, NewCategory},
    comment::{self, NewComment},
    config::Settings,
    db::{self, Connection, DbConnection},
    location::{self, NewLocation},
    post::{self, NewPost, Post},
    router,
    schema::posts,
    urls,
    user::{self, NewUser, User, COOKIE_NAME},
};

const DATABASE_VAR: &str = "SCRIBE_TEST_DATABASE_URL";
const BOUNDARY: &str = "scribe-form-boundary";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

static UNIQUE: AtomicUsize = AtomicUsize::new(0);
static MIGRATIONS: Once = Once::new();

struct Fixture {
    connection: DbConnection,
    server: TestServer,
    /// Prefix keeping the rows of concurrently running tests apart
    prefix: String,
    /// Uploaded images end up here
    media_dir: PathBuf,
}

impl Fixture {
    fn new() -> Option<Fixture> {
        let url = std::env::var(DATABASE_VAR).ok()?;
        // Tests start concurrently, only one of them may create the schema
        MIGRATIONS.call_once(|| {
            db::connect(&url).unwrap();
        });
        let connection = db::connect(&url).unwrap();
        connection.begin_test_transaction().unwrap();
        let connection = DbConnection::new(connection);

        let prefix = format!(
            "t{}x{}",
            std::process::id(),
            UNIQUE.fetch_add(1, Ordering::SeqCst)
        );
        let media_dir = std::env::temp_dir().join(format!("scribe-media-{}", prefix));
        let config = format!(
            "database_url = {:?}\nhost_address = \"127.0.0.1:0\"\nmedia_dir = {:?}\n",
            url,
            media_dir.to_str().unwrap()
        );
        let settings = Settings::from_slice(config.as_bytes()).unwrap();
        let server = TestServer::new(router(&settings, connection.clone())).unwrap();

        Some(Fixture {
            connection,
            server,
            prefix,
            media_dir,
        })
    }

    fn with<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        let connection = self.connection.lock().unwrap();
        f(&connection)
    }

    fn user(&self, name: &str) -> User {
        let new = NewUser {
            username: format!("{}{}", self.prefix, name),
            first_name: String::from(name),
            last_name: String::new(),
            email: String::new(),
            password: String::from("password123"),
        };
        self.with(|connection| user::create(connection, new).unwrap())
    }

    /// A session cookie for `user`
    fn login(&self, user: &User) -> HeaderValue {
        let session = self.with(|connection| user::start_session(connection, user.id).unwrap());
        HeaderValue::from_str(&format!("{}={}", COOKIE_NAME, session.id)).unwrap()
    }

    fn category(&self, published: bool) -> i32 {
        let slug = format!("{}-{}", self.prefix, UNIQUE.fetch_add(1, Ordering::SeqCst));
        let new = NewCategory {
            title: "Travel",
            description: "Places",
            slug: &slug,
            is_published: published,
        };
        self.with(|connection| category::create(connection, &new).unwrap().id)
    }

    fn post(
        &self,
        author: &User,
        title: &str,
        category: i32,
        published: bool,
        pub_date: NaiveDateTime,
    ) -> Post {
        let new = NewPost {
            title: String::from(title),
            text: String::from("Some text"),
            pub_date,
            author_id: author.id,
            location_id: None,
            category_id: Some(category),
            image: None,
            is_published: published,
        };
        self.with(|connection| post::submit(connection, &new).unwrap())
    }

    fn get(&self, path: &str, cookie: Option<&HeaderValue>) -> TestResponse {
        let client = self.server.client();
        let url = format!("http://localhost{}", path);
        let mut request = client.get(url.as_str());
        if let Some(cookie) = cookie {
            request = request.with_header(header::COOKIE, cookie.clone());
        }
        request.perform().unwrap()
    }

    fn comment(&self, author: &User, post: &Post, text: &str) -> comment::Comment {
        let new = NewComment {
            text: String::from(text),
            post_id: post.id,
            author_id: author.id,
        };
        self.with(|connection| comment::submit(connection, &new).unwrap())
    }

    /// The newest post written by `author`
    fn latest_post(&self, author: &User) -> Post {
        self.with(|connection| {
            posts::table
                .filter(posts::author_id.eq(author.id))
                .order(posts::id.desc())
                .first(connection)
                .unwrap()
        })
    }

    fn post_multipart(&self, path: &str, body: Vec<u8>, cookie: &HeaderValue) -> TestResponse {
        let client = self.server.client();
        let url = format!("http://localhost{}", path);
        let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
        client
            .post(url.as_str(), body, content_type.parse::<mime::Mime>().unwrap())
            .with_header(header::COOKIE, cookie.clone())
            .perform()
            .unwrap()
    }

    fn post_form(&self, path: &str, body: &str, cookie: Option<&HeaderValue>) -> TestResponse {
        let client = self.server.client();
        let url = format!("http://localhost{}", path);
        let mut request = client.post(
            url.as_str(),
            body.to_owned(),
            mime::APPLICATION_WWW_FORM_URLENCODED,
        );
        if let Some(cookie) = cookie {
            request = request.with_header(header::COOKIE, cookie.clone());
        }
        request.perform().unwrap()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.media_dir);
    }
}

/// A `multipart/form-data` body with the given text fields and an optional `image` file.
fn multipart(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, data)) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn location(response: &TestResponse) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

fn body(response: TestResponse) -> String {
    response.read_utf8_body().unwrap()
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

macro_rules! fixture {
    () => {
        match Fixture::new() {
            Some(fixture) => fixture,
            None => {
                eprintln!("{} not set, skipping", DATABASE_VAR);
                return;
            }
        }
    };
}

#[test]
fn unpublished_post_is_hidden_from_others() {
    let f = fixture!();
    let author = f.user("author");
    let other = f.user("other");
    let category = f.category(true);
    let hidden = f.post(&author, "Draft", category, false, now() - Duration::days(1));
    let url = hidden.url();

    assert_eq!(f.get(&url, None).status(), StatusCode::NOT_FOUND);
    assert_eq!(f.get(&url, Some(&f.login(&other))).status(), StatusCode::NOT_FOUND);

    let response = f.get(&url, Some(&f.login(&author)));
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body(response).contains("Draft"));
}

#[test]
fn scheduled_post_and_hidden_category() {
    let f = fixture!();
    let author = f.user("author");
    let published = f.category(true);
    let unpublished = f.category(false);
    let scheduled = f.post(&author, "Later", published, true, now() + Duration::days(1));
    let uncategorized = f.post(&author, "Hidden", unpublished, true, now() - Duration::days(1));

    assert_eq!(f.get(&scheduled.url(), None).status(), StatusCode::NOT_FOUND);
    assert_eq!(f.get(&uncategorized.url(), None).status(), StatusCode::NOT_FOUND);
    assert_eq!(
        f.get(&scheduled.url(), Some(&f.login(&author))).status(),
        StatusCode::OK
    );
}

#[test]
fn feed_lists_only_public_posts() {
    let f = fixture!();
    let author = f.user("author");
    let category = f.category(true);
    let visible = format!("{} visible", f.prefix);
    let draft = format!("{} draft", f.prefix);
    let future = format!("{} future", f.prefix);
    f.post(&author, &visible, category, true, now() - Duration::minutes(1));
    f.post(&author, &draft, category, false, now() - Duration::minutes(1));
    f.post(&author, &future, category, true, now() + Duration::days(1));

    let page = body(f.get("/", None));
    assert!(page.contains(&visible));
    assert!(!page.contains(&draft));
    assert!(!page.contains(&future));
}

#[test]
fn profile_pages_are_split() {
    let f = fixture!();
    let author = f.user("author");
    let category = f.category(true);
    for i in 0..12 {
        let title = format!("{} number {:02}", f.prefix, i);
        f.post(&author, &title, category, true, now() - Duration::minutes(60 - i));
    }
    let profile = author.url();

    let first = body(f.get(&profile, None));
    assert_eq!(first.matches(&format!("{} number", f.prefix)).count(), 10);
    assert!(first.contains("number 11"));
    assert!(!first.contains("number 01"));

    let second = body(f.get(&format!("{}?page=2", profile), None));
    assert_eq!(second.matches(&format!("{} number", f.prefix)).count(), 2);
    assert!(second.contains("number 00"));

    // Out of range and malformed page numbers
    let last = body(f.get(&format!("{}?page=99", profile), None));
    assert!(last.contains("number 00"));
    let garbage = body(f.get(&format!("{}?page=abc", profile), None));
    assert!(garbage.contains("number 11"));
}

#[test]
fn owner_sees_drafts_on_profile() {
    let f = fixture!();
    let author = f.user("author");
    let category = f.category(true);
    let draft = format!("{} draft", f.prefix);
    f.post(&author, &draft, category, false, now());

    assert!(!body(f.get(&author.url(), None)).contains(&draft));
    assert!(body(f.get(&author.url(), Some(&f.login(&author)))).contains(&draft));
}

#[test]
fn only_the_author_edits_a_post() {
    let f = fixture!();
    let author = f.user("author");
    let other = f.user("other");
    let category = f.category(true);
    let original = f.post(&author, "Original", category, true, now());
    let form = format!(
        "title=Changed&text=New&pub_date=2020-01-01T10:00&category={}&is_published=on",
        category
    );

    let response = f.post_form(&original.edit_url(), &form, None);
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/auth/login/"));

    let response = f.post_form(&original.edit_url(), &form, Some(&f.login(&other)));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), original.url());
    let unchanged = f.with(|connection| post::get(connection, original.id).unwrap());
    assert_eq!(unchanged.title, "Original");

    let response = f.post_form(&original.edit_url(), &form, Some(&f.login(&author)));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), original.url());
    let changed = f.with(|connection| post::get(connection, original.id).unwrap());
    assert_eq!(changed.title, "Changed");
}

#[test]
fn invalid_post_form_is_shown_again() {
    let f = fixture!();
    let author = f.user("author");
    let response = f.post_form("/posts/create/", "title=&text=Body", Some(&f.login(&author)));
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body(response).contains(crate::form::REQUIRED));
}

#[test]
fn only_the_author_deletes_a_comment() {
    let f = fixture!();
    let author = f.user("author");
    let commenter = f.user("commenter");
    let category = f.category(true);
    let post = f.post(&author, "Post", category, true, now() - Duration::minutes(1));
    let new = NewComment {
        text: String::from("First!"),
        post_id: post.id,
        author_id: commenter.id,
    };
    let comment = f.with(|connection| comment::submit(connection, &new).unwrap());

    let response = f.post_form(&comment.delete_url(), "", Some(&f.login(&author)));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), post.url());
    assert!(f
        .with(|connection| comment::view(connection, post.id, comment.id))
        .is_ok());

    // A comment is only reachable through its own post
    let elsewhere = f.post(&author, "Other", category, true, now());
    let path = crate::urls::delete_comment(elsewhere.id, comment.id);
    let response = f.post_form(&path, "", Some(&f.login(&commenter)));
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = f.post_form(&comment.delete_url(), "", Some(&f.login(&commenter)));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), post.url());
    assert!(f
        .with(|connection| comment::view(connection, post.id, comment.id))
        .is_err());
}

#[test]
fn comments_need_a_readable_post() {
    let f = fixture!();
    let author = f.user("author");
    let other = f.user("other");
    let category = f.category(true);
    let draft = f.post(&author, "Draft", category, false, now());
    let cookie = f.login(&other);

    let response = f.post_form(&crate::urls::add_comment(draft.id), "text=Hi", Some(&cookie));
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = f.post_form(&crate::urls::add_comment(draft.id), "text=Hi", None);
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/auth/login/"));
}

#[test]
fn registration_logs_in() {
    let f = fixture!();
    let username = format!("{}new", f.prefix);
    let form = format!(
        "username={}&first_name=New&last_name=User&email=new%40example.com&{}",
        username, "password1=password123&password2=password123"
    );
    let response = f.post_form("/auth/registration/", &form, None);
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(cookie.starts_with(COOKIE_NAME));

    // The same username can't be taken twice
    let response = f.post_form("/auth/registration/", &form, None);
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body(response).contains("already exists"));
}

#[test]
fn login_with_wrong_password() {
    let f = fixture!();
    let user = f.user("someone");
    let form = format!("username={}&password=wrong", user.username);
    let response = f.post_form("/auth/login/", &form, None);
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let form = format!("username={}&password=password123&next=/profile/edit/", user.username);
    let response = f.post_form("/auth/login/", &form, None);
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/edit/");
}

#[test]
fn unknown_category_is_not_found() {
    let f = fixture!();
    let hidden = f.category(false);
    let slug = f.with(|connection| category::get(connection, hidden).unwrap().unwrap().slug);
    assert_eq!(
        f.get(&crate::urls::category(&slug), None).status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        f.get("/category/does-not-exist/", None).status(),
        StatusCode::NOT_FOUND
    );
}

#[test]
fn unpublished_location_is_not_shown() {
    let f = fixture!();
    let author = f.user("author");
    let category = f.category(true);
    let shown = format!("{} Oslo", f.prefix);
    let hidden = format!("{} Atlantis", f.prefix);
    let (oslo, atlantis) = f.with(|connection| {
        let oslo = NewLocation {
            name: &shown,
            is_published: true,
        };
        let atlantis = NewLocation {
            name: &hidden,
            is_published: false,
        };
        (
            location::create(connection, &oslo).unwrap().id,
            location::create(connection, &atlantis).unwrap().id,
        )
    });

    let with_location = |location_id| {
        let post = f.post(&author, "Trip", category, true, now() - Duration::minutes(1));
        let changes = post::PostChanges {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: post.pub_date,
            location_id: Some(location_id),
            category_id: post.category_id,
            image: None,
            is_published: true,
        };
        f.with(|connection| post::edit(connection, post.id, &changes).unwrap());
        body(f.get(&post.url(), None))
    };

    assert!(with_location(oslo).contains(&shown));
    assert!(!with_location(atlantis).contains(&hidden));
}

#[test]
fn anonymous_page_request_returns_after_login() {
    let f = fixture!();
    let response = f.get("/posts/create/", None);
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login/?next=%2Fposts%2Fcreate%2F");

    let response = f.get("/profile/edit/", None);
    assert_eq!(location(&response), "/auth/login/?next=%2Fprofile%2Fedit%2F");

    // Form posts only go to the login page
    let response = f.post_form("/posts/create/", "title=Lost", None);
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login/");
}

#[test]
fn comments_are_shown_oldest_first() {
    let f = fixture!();
    let author = f.user("author");
    let category = f.category(true);
    let post = f.post(&author, "Post", category, true, now() - Duration::minutes(1));
    let first = format!("{} first comment", f.prefix);
    let second = format!("{} second comment", f.prefix);
    let third = format!("{} third comment", f.prefix);
    for text in &[&first, &second, &third] {
        f.comment(&author, &post, text);
    }

    let page = body(f.get(&post.url(), None));
    let position = |text: &str| page.find(text).unwrap();
    assert!(position(&first) < position(&second));
    assert!(position(&second) < position(&third));
    assert!(page.contains("Comments (3)"));
}

#[test]
fn only_the_author_edits_a_comment() {
    let f = fixture!();
    let author = f.user("author");
    let commenter = f.user("commenter");
    let category = f.category(true);
    let post = f.post(&author, "Post", category, true, now() - Duration::minutes(1));
    let comment = f.comment(&commenter, &post, "First!");

    let response = f.post_form(&comment.edit_url(), "text=Hijacked", Some(&f.login(&author)));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), post.url());
    let text = f.with(|connection| comment::view(connection, post.id, comment.id).unwrap().text);
    assert_eq!(text, "First!");

    let response = f.post_form(&comment.edit_url(), "text=Second!", Some(&f.login(&commenter)));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), post.url());
    let text = f.with(|connection| comment::view(connection, post.id, comment.id).unwrap().text);
    assert_eq!(text, "Second!");
}

#[test]
fn delete_comment_page_is_only_for_the_author() {
    let f = fixture!();
    let author = f.user("author");
    let other = f.user("other");
    let category = f.category(true);
    let post = f.post(&author, "Post", category, true, now() - Duration::minutes(1));
    let comment = f.comment(&author, &post, "Mine");

    let response = f.get(&comment.delete_url(), Some(&f.login(&other)));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), post.url());

    let response = f.get(&comment.delete_url(), Some(&f.login(&author)));
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn only_the_author_deletes_a_post() {
    let f = fixture!();
    let author = f.user("author");
    let other = f.user("other");
    let category = f.category(true);
    let post = f.post(&author, "Keep me", category, true, now() - Duration::minutes(1));

    let response = f.post_form(&post.delete_url(), "", Some(&f.login(&other)));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), post.url());
    assert!(f.with(|connection| post::get(connection, post.id)).is_ok());
}

#[test]
fn deleting_a_post_deletes_its_comments() {
    let f = fixture!();
    let author = f.user("author");
    let commenter = f.user("commenter");
    let category = f.category(true);
    let post = f.post(&author, "Short lived", category, true, now() - Duration::minutes(1));
    let comment = f.comment(&commenter, &post, "Nice");

    let response = f.post_form(&post.delete_url(), "", Some(&f.login(&author)));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(f.with(|connection| post::get(connection, post.id)).is_err());
    assert!(f
        .with(|connection| comment::view(connection, post.id, comment.id))
        .is_err());
    assert_eq!(f.get(&post.url(), None).status(), StatusCode::NOT_FOUND);
}

#[test]
fn category_feed_lists_only_public_posts() {
    let f = fixture!();
    let author = f.user("author");
    let category = f.category(true);
    let slug = f.with(|connection| category::get(connection, category).unwrap().unwrap().slug);
    let visible = format!("{} visible", f.prefix);
    let draft = format!("{} draft", f.prefix);
    let future = format!("{} future", f.prefix);
    f.post(&author, &visible, category, true, now() - Duration::minutes(1));
    f.post(&author, &draft, category, false, now() - Duration::minutes(1));
    f.post(&author, &future, category, true, now() + Duration::days(1));

    let response = f.get(&urls::category(&slug), None);
    assert_eq!(response.status(), StatusCode::OK);
    let page = body(response);
    assert!(page.contains(&visible));
    assert!(!page.contains(&draft));
    assert!(!page.contains(&future));
}

#[test]
fn listing_counts_comments() {
    let f = fixture!();
    let author = f.user("author");
    let commenter = f.user("commenter");
    let category = f.category(true);
    let talked_about = f.post(&author, "Popular", category, true, now() - Duration::minutes(2));
    f.post(&author, "Quiet", category, true, now() - Duration::minutes(1));
    f.comment(&commenter, &talked_about, "One");
    f.comment(&author, &talked_about, "Two");

    let page = body(f.get(&author.url(), None));
    assert!(page.contains("Comments (2)"));
    assert!(page.contains("Comments (0)"));
}

#[test]
fn uploaded_image_is_stored_and_kept() {
    let f = fixture!();
    let author = f.user("author");
    let cookie = f.login(&author);
    let category = f.category(true);
    let category = category.to_string();
    let fields = [
        ("title", "With a picture"),
        ("text", "Look"),
        ("pub_date", "2020-01-01T10:00"),
        ("category", category.as_str()),
        ("is_published", "on"),
    ];

    let form = multipart(&fields, Some(("../../cat.png", PNG)));
    let response = f.post_multipart("/posts/create/", form, &cookie);
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let created = f.latest_post(&author);
    assert_eq!(created.title, "With a picture");
    let image = created.image.clone().unwrap();
    assert!(image.starts_with("posts_images/"));
    assert!(image.ends_with(".png"));
    assert!(!image.contains("cat"));
    assert_eq!(fs::read(f.media_dir.join(&image)).unwrap(), PNG);

    // Editing without a new file keeps the image
    let response = f.post_multipart(&created.edit_url(), multipart(&fields, None), &cookie);
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let kept = f.with(|connection| post::get(connection, created.id).unwrap());
    assert_eq!(kept.image, Some(image));

    let mut clearing = fields.to_vec();
    clearing.push(("clear_image", "on"));
    let response = f.post_multipart(&created.edit_url(), multipart(&clearing, None), &cookie);
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cleared = f.with(|connection| post::get(connection, created.id).unwrap());
    assert_eq!(cleared.image, None);
}

#[test]
fn non_image_upload_is_rejected() {
    let f = fixture!();
    let author = f.user("author");
    let category = f.category(true).to_string();
    let fields = [
        ("title", "Sneaky"),
        ("text", "Script"),
        ("pub_date", "2020-01-01T10:00"),
        ("category", category.as_str()),
    ];

    let script: &[u8] = b"<?php system($_GET['c']); ?>";
    let form = multipart(&fields, Some(("shell.png", script)));
    let response = f.post_multipart("/posts/create/", form, &f.login(&author));
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body(response).contains(crate::form::INVALID_IMAGE));
    assert!(!f.media_dir.join(crate::upload::IMAGE_DIR).exists());
}
