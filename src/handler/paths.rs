//! Path and query string extractors shared by the page handlers.
use gotham_derive::{StateData, StaticResponseExtender};

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct PostPath {
    pub post_id: i32,
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct CommentPath {
    pub post_id: i32,
    pub comment_id: i32,
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct CategoryPath {
    pub slug: String,
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct UserPath {
    pub username: String,
}

/// The `page` parameter of paginated listings. Kept as a string so malformed numbers fall back
/// to the first page instead of failing the request.
#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> Option<&str> {
        self.page.as_deref()
    }
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct LoginQuery {
    pub next: Option<String>,
}
