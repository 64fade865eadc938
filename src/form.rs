//! Submitted forms and their validation.
//!
//! Forms keep the raw submitted strings so they can be shown again when validation fails.
use std::collections::BTreeMap;

use crate::{
    date_format,
    post::{Post, PostChanges},
    upload::Upload,
    user::{NewUser, User, UserProfile},
};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

const TITLE_MAX: usize = 256;
const NAME_MAX: usize = 150;
const EMAIL_MAX: usize = 254;
const PASSWORD_MIN: usize = 8;

/// Field level validation messages
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Errors(BTreeMap<&'static str, Vec<String>>);

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    /// The messages for one field
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Turns the collected messages into a result.
    pub fn check<T>(self, value: T) -> Result<T, Errors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

fn required(errors: &mut Errors, field: &'static str, value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    }
    value.to_owned()
}

fn max_length(errors: &mut Errors, field: &'static str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max, len
            ),
        );
    }
}

/// Parses the id of an optional select box.
fn choice(errors: &mut Errors, field: &'static str, value: &str) -> Option<i32> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match value.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, INVALID_CHOICE);
            None
        }
    }
}

/// Letters, digits and @/./+/-/_ only
fn valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
}

fn valid_email(email: &str) -> bool {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub pub_date: String,
    pub location: String,
    pub category: String,
    /// Checkboxes are only submitted when ticked
    pub is_published: Option<String>,
    /// Ticked to remove the current image
    pub clear_image: Option<String>,
}

impl PostForm {
    /// A blank form for a new post, published now.
    pub fn blank(now: &chrono::NaiveDateTime) -> Self {
        PostForm {
            pub_date: date_format::to_input(now),
            is_published: Some(String::from("on")),
            ..PostForm::default()
        }
    }

    pub fn published(&self) -> bool {
        self.is_published.is_some()
    }

    pub fn clears_image(&self) -> bool {
        self.clear_image.is_some()
    }

    /// Whether `id` is the selected category
    pub fn category_selected(&self, id: &i32) -> bool {
        self.category.trim() == id.to_string()
    }

    /// Whether `id` is the selected location
    pub fn location_selected(&self, id: &i32) -> bool {
        self.location.trim() == id.to_string()
    }

    /// Validates the fields and the uploaded image, if any.
    ///
    /// The returned changes have no image. Storing the upload is up to the caller.
    pub fn validate(&self, image: Option<&Upload>) -> Result<PostChanges, Errors> {
        let mut errors = Errors::new();

        let title = required(&mut errors, "title", &self.title);
        max_length(&mut errors, "title", &title, TITLE_MAX);
        let text = required(&mut errors, "text", &self.text);
        let pub_date = if self.pub_date.trim().is_empty() {
            errors.add("pub_date", REQUIRED);
            None
        } else {
            let parsed = date_format::parse(&self.pub_date);
            if parsed.is_none() {
                errors.add("pub_date", "Enter a valid date/time.");
            }
            parsed
        };
        let location_id = choice(&mut errors, "location", &self.location);
        let category_id = choice(&mut errors, "category", &self.category);
        if let Some(image) = image {
            if image.image_extension().is_none() {
                errors.add("image", INVALID_IMAGE);
            }
        }

        match pub_date {
            Some(pub_date) => errors.check(PostChanges {
                title,
                text,
                pub_date,
                location_id,
                category_id,
                image: None,
                is_published: self.published(),
            }),
            None => Err(errors),
        }
    }
}

impl From<&Post> for PostForm {
    fn from(post: &Post) -> Self {
        let id = |id: Option<i32>| id.map(|id| id.to_string()).unwrap_or_default();
        PostForm {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: date_format::to_input(&post.pub_date),
            location: id(post.location_id),
            category: id(post.category_id),
            is_published: if post.is_published {
                Some(String::from("on"))
            } else {
                None
            },
            clear_image: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<String, Errors> {
        let mut errors = Errors::new();
        let text = required(&mut errors, "text", &self.text);
        errors.check(text)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl ProfileForm {
    fn validate_into(&self, errors: &mut Errors) -> UserProfile {
        let username = required(errors, "username", &self.username);
        max_length(errors, "username", &username, NAME_MAX);
        if !valid_username(&username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, \
                 and @/./+/-/_ characters.",
            );
        }
        let first_name = self.first_name.trim().to_owned();
        max_length(errors, "first_name", &first_name, NAME_MAX);
        let last_name = self.last_name.trim().to_owned();
        max_length(errors, "last_name", &last_name, NAME_MAX);
        let email = self.email.trim().to_owned();
        max_length(errors, "email", &email, EMAIL_MAX);
        if !email.is_empty() && !valid_email(&email) {
            errors.add("email", "Enter a valid email address.");
        }
        UserProfile {
            username,
            first_name,
            last_name,
            email,
        }
    }

    pub fn validate(&self) -> Result<UserProfile, Errors> {
        let mut errors = Errors::new();
        let profile = self.validate_into(&mut errors);
        errors.check(profile)
    }
}

impl From<&User> for ProfileForm {
    fn from(user: &User) -> Self {
        ProfileForm {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
    /// Venus fly trap for spam bots, hidden from humans
    pub phone: String,
}

impl RegistrationForm {
    fn profile(&self) -> ProfileForm {
        ProfileForm {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
        }
    }

    pub fn is_spam(&self) -> bool {
        !self.phone.is_empty()
    }

    pub fn validate(&self) -> Result<NewUser, Errors> {
        let mut errors = Errors::new();
        let profile = self.profile().validate_into(&mut errors);

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else if self.password1.chars().count() < PASSWORD_MIN {
            errors.add(
                "password1",
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    PASSWORD_MIN
                ),
            );
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.check(NewUser {
            username: profile.username,
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: profile.email,
            password: self.password1.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn post_form() -> PostForm {
        PostForm {
            title: String::from("Trip"),
            text: String::from("We went places"),
            pub_date: String::from("2023-04-05T10:00"),
            location: String::from("2"),
            category: String::from("3"),
            is_published: Some(String::from("on")),
            clear_image: None,
        }
    }

    #[test]
    fn valid_post() {
        let changes = post_form().validate(None).unwrap();
        assert_eq!(changes.title, "Trip");
        assert_eq!(
            changes.pub_date,
            NaiveDate::from_ymd(2023, 4, 5).and_hms(10, 0, 0)
        );
        assert_eq!(changes.location_id, Some(2));
        assert_eq!(changes.category_id, Some(3));
        assert_eq!(changes.image, None);
        assert!(changes.is_published);
    }

    #[test]
    fn unticked_checkbox_is_unpublished() {
        let form = PostForm {
            is_published: None,
            ..post_form()
        };
        assert!(!form.validate(None).unwrap().is_published);
    }

    #[test]
    fn blank_choices_are_none() {
        let form = PostForm {
            location: String::new(),
            category: String::new(),
            ..post_form()
        };
        let changes = form.validate(None).unwrap();
        assert_eq!(changes.location_id, None);
        assert_eq!(changes.category_id, None);
    }

    #[test]
    fn missing_fields_are_reported() {
        let errors = PostForm::default().validate(None).unwrap_err();
        assert_eq!(errors.get("title"), [REQUIRED]);
        assert_eq!(errors.get("text"), [REQUIRED]);
        assert_eq!(errors.get("pub_date"), [REQUIRED]);
        assert!(!errors.has("category"));
    }

    #[test]
    fn bad_values_are_reported() {
        let form = PostForm {
            title: "x".repeat(257),
            pub_date: String::from("tomorrow"),
            category: String::from("travel"),
            ..post_form()
        };
        let script = Upload {
            filename: String::from("cat.png"),
            data: b"#!/bin/sh".to_vec(),
        };
        let errors = form.validate(Some(&script)).unwrap_err();
        assert!(errors.has("title"));
        assert!(errors.has("pub_date"));
        assert_eq!(errors.get("category"), [INVALID_CHOICE]);
        assert_eq!(errors.get("image"), [INVALID_IMAGE]);
        assert!(!errors.has("text"));
    }

    #[test]
    fn image_upload_is_accepted() {
        let photo = Upload {
            filename: String::from("cat.jpg"),
            data: b"\xff\xd8\xff\xe0 jpeg".to_vec(),
        };
        let changes = post_form().validate(Some(&photo)).unwrap();
        assert_eq!(changes.image, None);
    }

    #[test]
    fn urlencoded_post_form() {
        let form: PostForm =
            serde_urlencoded::from_str("title=Hi&text=Body&pub_date=2023-01-01&category=1")
                .unwrap();
        assert_eq!(form.title, "Hi");
        assert!(!form.published());
        assert!(!form.clears_image());
        assert!(form.category_selected(&1));
        assert!(!form.location_selected(&1));
    }

    #[test]
    fn comment_needs_text() {
        let empty = CommentForm {
            text: String::from("   "),
        };
        assert_eq!(empty.validate().unwrap_err().get("text"), [REQUIRED]);
        let comment = CommentForm {
            text: String::from(" Nice post! "),
        };
        assert_eq!(comment.validate().unwrap(), "Nice post!");
    }

    fn registration() -> RegistrationForm {
        RegistrationForm {
            username: String::from("ada"),
            first_name: String::from("Ada"),
            last_name: String::from("Lovelace"),
            email: String::from("ada@example.com"),
            password1: String::from("analytical"),
            password2: String::from("analytical"),
            phone: String::new(),
        }
    }

    #[test]
    fn valid_registration() {
        let user = registration().validate().unwrap();
        assert_eq!(user.username, "ada");
        assert_eq!(user.password, "analytical");
    }

    #[test]
    fn registration_passwords() {
        let mismatch = RegistrationForm {
            password2: String::from("different"),
            ..registration()
        };
        assert!(mismatch.validate().unwrap_err().has("password2"));

        let short = RegistrationForm {
            password1: String::from("short"),
            password2: String::from("short"),
            ..registration()
        };
        let errors = short.validate().unwrap_err();
        assert!(errors.has("password1"));
        assert!(!errors.has("password2"));
    }

    #[test]
    fn registration_from_urlencoded() {
        let form: RegistrationForm = serde_urlencoded::from_str(
            "username=ada&first_name=Ada&last_name=&email=\
             &password1=analytical&password2=analytical",
        )
        .unwrap();
        assert_eq!(form.username, "ada");
        assert!(!form.is_spam());
        assert!(form.validate().is_ok());
    }

    #[test]
    fn honeypot() {
        let form = RegistrationForm {
            phone: String::from("555-1234"),
            ..registration()
        };
        assert!(form.is_spam());
    }

    #[test]
    fn profile_fields() {
        let form = ProfileForm {
            username: String::from("ada lovelace"),
            email: String::from("not-an-email"),
            ..ProfileForm::default()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("username"));
        assert!(errors.has("email"));

        let form = ProfileForm {
            username: String::from("ada.l+blog@home"),
            email: String::new(),
            ..ProfileForm::default()
        };
        assert!(form.validate().is_ok());
    }
}
