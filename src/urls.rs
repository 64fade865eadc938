//! Paths of the site's pages, used for links and redirects.

pub const INDEX: &str = "/";
pub const LOGIN: &str = "/auth/login/";
pub const CREATE_POST: &str = "/posts/create/";

pub fn post(id: i32) -> String {
    format!("/posts/{}/", id)
}

pub fn edit_post(id: i32) -> String {
    format!("/posts/{}/edit/", id)
}

pub fn delete_post(id: i32) -> String {
    format!("/posts/{}/delete/", id)
}

pub fn add_comment(post: i32) -> String {
    format!("/posts/{}/comment/", post)
}

pub fn edit_comment(post: i32, comment: i32) -> String {
    format!("/posts/{}/edit_comment/{}/", post, comment)
}

pub fn delete_comment(post: i32, comment: i32) -> String {
    format!("/posts/{}/delete_comment/{}/", post, comment)
}

pub fn category(slug: &str) -> String {
    format!("/category/{}/", slug)
}

pub fn profile(username: &str) -> String {
    format!("/profile/{}/", username)
}

/// The login page, returning to `next` afterwards when given.
pub fn login(next: Option<&str>) -> String {
    match next.map(|next| serde_urlencoded::to_string(&[("next", next)])) {
        Some(Ok(query)) => format!("{}?{}", LOGIN, query),
        _ => LOGIN.to_owned(),
    }
}

pub fn media(path: &str) -> String {
    format!("/media/{}", path)
}

/// Only accept local redirect targets after logging in.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") => next,
        _ => INDEX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_paths() {
        assert_eq!(edit_comment(5, 12), "/posts/5/edit_comment/12/");
        assert_eq!(delete_comment(5, 12), "/posts/5/delete_comment/12/");
    }

    #[test]
    fn login_carries_next() {
        assert_eq!(login(None), "/auth/login/");
        assert_eq!(
            login(Some("/posts/create/")),
            "/auth/login/?next=%2Fposts%2Fcreate%2F"
        );
        assert_eq!(
            login(Some("/?page=2&x=1")),
            "/auth/login/?next=%2F%3Fpage%3D2%26x%3D1"
        );
    }

    #[test]
    fn next_must_be_local() {
        assert_eq!(safe_next(Some("/posts/3/")), "/posts/3/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
