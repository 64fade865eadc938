use chrono::{naive::NaiveDateTime, Utc};
use comrak::{markdown_to_html, ComrakOptions};
use diesel::{pg::Pg, prelude::*, result::Error as DieselError};

use std::collections::HashMap;

use crate::{
    category::{self, Category},
    comment, date_format,
    db::Connection,
    location::{self, Location},
    paginate::{Page, Window},
    policy,
    schema::{categories, posts},
    urls,
    user::{self, Author, Viewer},
};

const PREVIEW_LEN: usize = 300;

#[derive(Clone, Debug, Queryable, Identifiable)]
pub struct Post {
    pub id: i32,
    pub title: String,
    /// The post's body, in markdown
    pub text: String,
    /// Posts are hidden from the public until this time
    pub pub_date: NaiveDateTime,
    pub author_id: i32,
    pub location_id: Option<i32>,
    pub category_id: Option<i32>,
    /// Path of the post's image, relative to the media directory
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: NaiveDateTime,
}

impl Post {
    /// Used when displaying a preview of the post's text in a list of posts.
    pub fn preview(&self) -> &str {
        let len = self.text.len();
        let end = if len < PREVIEW_LEN {
            len
        } else {
            // Get the last whitespace character before PREVIEW_LEN.
            self.text
                .match_indices(char::is_whitespace)
                .map(|(i, _)| i)
                .take_while(|i| *i < PREVIEW_LEN)
                .last()
                .unwrap_or(len)
        };
        &self.text[..end]
    }

    /// Whether `preview` cuts off part of the text
    pub fn truncated(&self) -> bool {
        self.preview().len() < self.text.len()
    }

    /// The text rendered as HTML. Raw HTML in the text is not passed through.
    pub fn html(&self) -> String {
        markdown_to_html(&self.text, &ComrakOptions::default())
    }

    pub fn image_url(&self) -> Option<String> {
        self.image.as_ref().map(|path| urls::media(path))
    }

    pub fn date(&self) -> String {
        date_format::display(&self.pub_date)
    }

    pub fn url(&self) -> String {
        urls::post(self.id)
    }

    pub fn edit_url(&self) -> String {
        urls::edit_post(self.id)
    }

    pub fn delete_url(&self) -> String {
        urls::delete_post(self.id)
    }
}

/// The author supplied fields of a post
#[derive(Clone, Debug, PartialEq, AsChangeset)]
#[table_name = "posts"]
#[changeset_options(treat_none_as_null = "true")]
pub struct PostChanges {
    pub title: String,
    pub text: String,
    pub pub_date: NaiveDateTime,
    pub location_id: Option<i32>,
    pub category_id: Option<i32>,
    pub image: Option<String>,
    pub is_published: bool,
}

#[derive(Insertable)]
#[table_name = "posts"]
pub struct NewPost {
    pub title: String,
    pub text: String,
    pub pub_date: NaiveDateTime,
    pub author_id: i32,
    pub location_id: Option<i32>,
    pub category_id: Option<i32>,
    pub image: Option<String>,
    pub is_published: bool,
}

impl NewPost {
    pub fn new(changes: PostChanges, author_id: i32) -> Self {
        NewPost {
            title: changes.title,
            text: changes.text,
            pub_date: changes.pub_date,
            author_id,
            location_id: changes.location_id,
            category_id: changes.category_id,
            image: changes.image,
            is_published: changes.is_published,
        }
    }
}

/// A post together with everything shown alongside it in a listing.
#[derive(Clone, Debug)]
pub struct Entry {
    pub post: Post,
    pub author: Author,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comment_count: usize,
}

impl Entry {
    /// The location, unless it has been unpublished
    pub fn shown_location(&self) -> Option<&Location> {
        self.location.as_ref().filter(|location| location.is_published)
    }

    /// The category, unless it has been unpublished
    pub fn shown_category(&self) -> Option<&Category> {
        self.category.as_ref().filter(|category| category.is_published)
    }
}

/// Which posts a listing contains
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// All publicly visible posts
    Public,
    /// Publicly visible posts in one category
    Category(i32),
    /// Posts by one author. Unpublished and scheduled posts are included if `hidden` is set.
    Author { id: i32, hidden: bool },
}

/// Posts anyone may see: published, in a published category, and with a publish date that has
/// passed.
fn public(now: NaiveDateTime) -> posts::BoxedQuery<'static, Pg> {
    let published_categories = categories::table
        .filter(categories::is_published.eq(true))
        .select(categories::id.nullable());

    posts::table
        .filter(posts::is_published.eq(true))
        .filter(posts::pub_date.le(now))
        .filter(posts::category_id.eq_any(published_categories))
        .into_boxed()
}

fn scoped(scope: Scope, now: NaiveDateTime) -> posts::BoxedQuery<'static, Pg> {
    match scope {
        Scope::Public => public(now),
        Scope::Category(id) => public(now).filter(posts::category_id.eq(id)),
        Scope::Author { id, hidden: true } => {
            posts::table.filter(posts::author_id.eq(id)).into_boxed()
        }
        Scope::Author { id, hidden: false } => public(now).filter(posts::author_id.eq(id)),
    }
}

/// Gets one page of a listing, newest first.
pub fn page(
    connection: &Connection,
    scope: Scope,
    requested: Option<&str>,
) -> Result<Page<Entry>, DieselError> {
    let now = Utc::now().naive_utc();

    let total: i64 = scoped(scope, now).count().get_result(connection)?;
    let window = Window::new(requested, total);
    let posts = scoped(scope, now)
        .order((posts::pub_date.desc(), posts::id.desc()))
        .limit(window.limit())
        .offset(window.offset())
        .load::<Post>(connection)?;

    Ok(Page {
        items: annotate(connection, posts)?,
        window,
    })
}

/// The listing of a user's profile page.
pub fn profile_page(
    connection: &Connection,
    viewer: Option<&Viewer>,
    author_id: i32,
    requested: Option<&str>,
) -> Result<Page<Entry>, DieselError> {
    let hidden = policy::lists_hidden_posts(viewer, author_id);
    page(connection, Scope::Author { id: author_id, hidden }, requested)
}

/// Loads the authors, categories, locations and comment counts of a list of posts.
pub fn annotate(connection: &Connection, posts: Vec<Post>) -> Result<Vec<Entry>, DieselError> {
    let authors: HashMap<i32, Author> =
        user::authors(connection, posts.iter().map(|post| post.author_id).collect())?
            .into_iter()
            .map(|author| (author.id, author))
            .collect();
    let categories: HashMap<i32, Category> = category::get_many(
        connection,
        posts.iter().filter_map(|post| post.category_id).collect(),
    )?
    .into_iter()
    .map(|category| (category.id, category))
    .collect();
    let locations: HashMap<i32, Location> = location::get_many(
        connection,
        posts.iter().filter_map(|post| post.location_id).collect(),
    )?
    .into_iter()
    .map(|location| (location.id, location))
    .collect();
    let counts = comment::counts(connection, posts.iter().map(|post| post.id).collect())?;

    posts
        .into_iter()
        .map(|post| {
            let author = authors
                .get(&post.author_id)
                .cloned()
                .ok_or(DieselError::NotFound)?;
            Ok(Entry {
                author,
                category: post.category_id.and_then(|id| categories.get(&id).cloned()),
                location: post.location_id.and_then(|id| locations.get(&id).cloned()),
                comment_count: counts.get(&post.id).cloned().unwrap_or(0),
                post,
            })
        })
        .collect()
}

/// Gets a post if the viewer may read it.
///
/// Authors can read their own posts before they are published, everyone else only sees public
/// posts. `None` means the post does not exist or is hidden from the viewer.
pub fn view(
    connection: &Connection,
    viewer: Option<&Viewer>,
    id: i32,
) -> Result<Option<Entry>, DieselError> {
    let post: Option<Post> = posts::table.find(id).first(connection).optional()?;
    let post = match post {
        Some(post) => post,
        None => return Ok(None),
    };
    let category = match post.category_id {
        Some(category) => category::get(connection, category)?,
        None => None,
    };
    if !policy::readable(viewer, &post, category.as_ref(), Utc::now().naive_utc()) {
        return Ok(None);
    }
    Ok(annotate(connection, vec![post])?.pop())
}

/// Gets a post regardless of whether it's published.
pub fn get(connection: &Connection, id: i32) -> Result<Post, DieselError> {
    posts::table.find(id).first(connection)
}

pub fn submit(connection: &Connection, post: &NewPost) -> Result<Post, DieselError> {
    diesel::insert_into(posts::table)
        .values(post)
        .get_result(connection)
}

pub fn edit(connection: &Connection, id: i32, changes: &PostChanges) -> Result<usize, DieselError> {
    diesel::update(posts::table.find(id))
        .set(changes)
        .execute(connection)
}

/// Deletes a post, and with it its comments.
pub fn delete(connection: &Connection, id: i32) -> Result<usize, DieselError> {
    diesel::delete(posts::table.find(id)).execute(connection)
}
