//! Request handlers for adding, editing and deleting comments
//!
//! Every handler ends up back at the post the comment belongs to.
use askama::Template;
use gotham::state::{FromState, State};
use hyper::{Body, Response};
use log::info;

use super::{DocumentResult, TemplateExt};
use crate::{
    comment::{self, Comment, NewComment},
    db::{Connection, DbConnection},
    form::{CommentForm, Errors},
    handler::{
        deny, login_required,
        paths::{CommentPath, PostPath},
        see_other, NotFound,
    },
    policy, post, urls,
    user::Viewer,
};

#[derive(Template)]
#[template(path = "comment-form.html")]
struct CommentFormTemplate<'a> {
    viewer: Option<&'a Viewer>,
    form: CommentForm,
    errors: Errors,
    action: String,
    post_url: String,
}

#[derive(Template)]
#[template(path = "comment-delete.html")]
struct DeleteTemplate<'a> {
    viewer: Option<&'a Viewer>,
    comment: Comment,
    post_url: String,
}

/// Adds a comment to a post the viewer can read
pub fn add(state: &State, body: Vec<u8>) -> DocumentResult {
    let viewer = match login_required(state) {
        Ok(viewer) => viewer,
        Err(redirect) => return Ok(redirect),
    };
    let connection = &DbConnection::from_state(state)?;
    let post_id = PostPath::borrow_from(state).post_id;

    post::view(connection, Some(viewer), post_id)?.ok_or(NotFound)?;

    let form: CommentForm = serde_urlencoded::from_bytes(&body)?;
    match form.validate() {
        Ok(text) => {
            let new = NewComment {
                text,
                post_id,
                author_id: viewer.id,
            };
            let comment = comment::submit(connection, &new)?;
            info!(
                "User '{}' commented on post {} (comment {})",
                viewer.username, post_id, comment.id
            );
            Ok(see_other(state, urls::post(post_id)))
        }
        Err(errors) => {
            let template = CommentFormTemplate {
                viewer: Some(viewer),
                form,
                errors,
                action: urls::add_comment(post_id),
                post_url: urls::post(post_id),
            };
            Ok(template.to_response(state))
        }
    }
}

/// Gets the comment in the path, provided the viewer wrote it.
///
/// Anonymous viewers are redirected to the login page and other users to the post.
fn authored<'s>(
    state: &'s State,
    connection: &Connection,
) -> Result<Result<(&'s Viewer, Comment), Response<Body>>, failure::Error> {
    let viewer = match login_required(state) {
        Ok(viewer) => viewer,
        Err(redirect) => return Ok(Err(redirect)),
    };
    let path = CommentPath::borrow_from(state);
    let comment = comment::view(connection, path.post_id, path.comment_id)?;

    let access = policy::require_author(Some(viewer), comment.author_id, urls::post(path.post_id));
    match deny(state, access) {
        Some(redirect) => Ok(Err(redirect)),
        None => Ok(Ok((viewer, comment))),
    }
}

/// Form for editing a comment
pub fn edit(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let (viewer, comment) = match authored(state, connection)? {
        Ok(authored) => authored,
        Err(redirect) => return Ok(redirect),
    };

    let template = CommentFormTemplate {
        viewer: Some(viewer),
        form: CommentForm {
            text: comment.text.clone(),
        },
        errors: Errors::new(),
        action: comment.edit_url(),
        post_url: urls::post(comment.post_id),
    };
    Ok(template.to_response(state))
}

pub fn edit_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let (viewer, comment) = match authored(state, connection)? {
        Ok(authored) => authored,
        Err(redirect) => return Ok(redirect),
    };
    let form: CommentForm = serde_urlencoded::from_bytes(&body)?;

    match form.validate() {
        Ok(text) => {
            comment::edit(connection, comment.id, &text)?;
            Ok(see_other(state, urls::post(comment.post_id)))
        }
        Err(errors) => {
            let template = CommentFormTemplate {
                viewer: Some(viewer),
                form,
                errors,
                action: comment.edit_url(),
                post_url: urls::post(comment.post_id),
            };
            Ok(template.to_response(state))
        }
    }
}

/// Asks for confirmation before deleting a comment
pub fn delete(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let (viewer, comment) = match authored(state, connection)? {
        Ok(authored) => authored,
        Err(redirect) => return Ok(redirect),
    };

    let template = DeleteTemplate {
        viewer: Some(viewer),
        post_url: urls::post(comment.post_id),
        comment,
    };
    Ok(template.to_response(state))
}

pub fn delete_post(state: &State, _body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let (viewer, comment) = match authored(state, connection)? {
        Ok(authored) => authored,
        Err(redirect) => return Ok(redirect),
    };

    comment::delete(connection, comment.id)?;
    info!("User '{}' deleted comment {}", viewer.username, comment.id);
    Ok(see_other(state, urls::post(comment.post_id)))
}
