//! Who may read and who may change posts and comments.
//!
//! Listings only ever contain publicly visible posts, with one exception: a profile owner sees
//! all of their own posts. A single post can additionally be read by its author before it is
//! published. Only the author may change or delete a post or comment.
//!
//! Denials never produce an error page. The viewer is sent somewhere safe instead: anonymous
//! viewers to the login page, everyone else back to the post.
use chrono::NaiveDateTime;

use crate::{category::Category, post::Post, urls, user::Viewer};

/// The outcome of an access check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Allowed,
    /// Not allowed, send the viewer to the given path instead
    DenyRedirect(String),
}

impl Access {
    /// Runs the next check if this one passed.
    pub fn and_then<F>(self, next: F) -> Access
    where
        F: FnOnce() -> Access,
    {
        match self {
            Access::Allowed => next(),
            denied => denied,
        }
    }

    pub fn is_allowed(&self) -> bool {
        *self == Access::Allowed
    }
}

pub fn is_authenticated(viewer: Option<&Viewer>) -> bool {
    viewer.is_some()
}

/// Whether the viewer is the user with id `author`.
pub fn is_author(viewer: Option<&Viewer>, author: i32) -> bool {
    viewer.map_or(false, |viewer| viewer.id == author)
}

/// Whether anyone may see the post.
pub fn is_public(post: &Post, category: Option<&Category>, now: NaiveDateTime) -> bool {
    post.is_published
        && category.map_or(false, |category| category.is_published)
        && post.pub_date <= now
}

/// Whether the viewer may open the post's own page.
pub fn readable(
    viewer: Option<&Viewer>,
    post: &Post,
    category: Option<&Category>,
    now: NaiveDateTime,
) -> bool {
    is_author(viewer, post.author_id) || is_public(post, category, now)
}

/// Whether the viewer may edit or delete an entry written by `author`.
pub fn mutable(viewer: Option<&Viewer>, author: i32) -> bool {
    is_author(viewer, author)
}

/// Whether a listing of `owner`'s posts includes unpublished and scheduled ones.
pub fn lists_hidden_posts(viewer: Option<&Viewer>, owner: i32) -> bool {
    is_author(viewer, owner)
}

/// Allows any signed in viewer. Anonymous viewers go to the login page, which sends them on to
/// `next` afterwards.
pub fn require_login(viewer: Option<&Viewer>, next: Option<&str>) -> Access {
    if is_authenticated(viewer) {
        Access::Allowed
    } else {
        Access::DenyRedirect(urls::login(next))
    }
}

/// Allows only the author, sending everyone else to `fallback`.
pub fn require_author(viewer: Option<&Viewer>, author: i32, fallback: String) -> Access {
    if mutable(viewer, author) {
        Access::Allowed
    } else {
        Access::DenyRedirect(fallback)
    }
}
