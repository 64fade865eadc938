//! Templates and request handlers for displaying and writing posts
use askama::Template;
use chrono::Utc;
use diesel::result::Error as DieselError;
use gotham::state::{FromState, State};
use hyper::{Body, Response};
use log::info;

use super::{DocumentResult, TemplateExt};
use crate::{
    category,
    comment::{self, Thread},
    config::Settings,
    db::{Connection, DbConnection},
    form::{self, CommentForm, Errors, PostForm},
    handler::{deny, login_required, paths::PostPath, see_other, NotFound},
    location,
    policy,
    post::{self, Entry, NewPost, Post, PostChanges},
    upload::{self, Upload},
    urls,
    user::Viewer,
};

/// A comment as shown below a post
pub struct CommentView {
    pub thread: Thread,
    /// Whether the viewer may edit and delete the comment
    pub editable: bool,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate<'a> {
    entry: Entry,
    comments: Vec<CommentView>,
    can_edit: bool,
    /// Blank form for adding a comment
    form: CommentForm,
    viewer: Option<&'a Viewer>,
}

/// An option of a select box
pub struct Choice {
    pub id: i32,
    pub label: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "post-form.html")]
struct PostFormTemplate<'a> {
    viewer: Option<&'a Viewer>,
    form: &'a PostForm,
    errors: Errors,
    categories: Vec<Choice>,
    locations: Vec<Choice>,
    action: String,
    /// The post being edited, if any
    post: Option<&'a Post>,
}

#[derive(Template)]
#[template(path = "post-delete.html")]
struct DeleteTemplate<'a> {
    viewer: Option<&'a Viewer>,
    entry: Entry,
}

/// Display a post and its comments
pub fn view(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let id = PostPath::borrow_from(state).post_id;
    let viewer = Viewer::try_borrow_from(state);

    // Return a 404 if the viewer isn't allowed to read the post
    let entry = post::view(connection, viewer, id)?.ok_or(NotFound)?;

    let comments = comment::list(connection, id)?
        .into_iter()
        .map(|thread| CommentView {
            editable: policy::mutable(viewer, thread.comment.author_id),
            thread,
        })
        .collect();
    let template = PostTemplate {
        can_edit: policy::mutable(viewer, entry.post.author_id),
        entry,
        comments,
        form: CommentForm::default(),
        viewer,
    };
    Ok(template.to_response(state))
}

fn render_form(
    state: &State,
    connection: &Connection,
    form: &PostForm,
    errors: Errors,
    post: Option<&Post>,
) -> DocumentResult {
    let categories = category::list(connection)?
        .into_iter()
        .map(|category| Choice {
            selected: form.category_selected(&category.id),
            id: category.id,
            label: category.title,
        })
        .collect();
    let locations = location::list(connection)?
        .into_iter()
        .map(|location| Choice {
            selected: form.location_selected(&location.id),
            id: location.id,
            label: location.name,
        })
        .collect();
    let action = match post {
        Some(post) => post.edit_url(),
        None => urls::CREATE_POST.to_owned(),
    };

    let template = PostFormTemplate {
        viewer: Viewer::try_borrow_from(state),
        form,
        errors,
        categories,
        locations,
        action,
        post,
    };
    Ok(template.to_response(state))
}

/// Reads a submitted post form, either urlencoded or multipart with an image.
fn read_form(state: &State, body: &[u8]) -> Result<(PostForm, Option<Upload>), failure::Error> {
    let boundary = match upload::boundary(state) {
        Some(boundary) => boundary,
        None => return Ok((serde_urlencoded::from_bytes(body)?, None)),
    };
    let (fields, files) = upload::read(body, &boundary)?;
    let form = serde_urlencoded::from_str(&serde_urlencoded::to_string(&fields)?)?;
    let image = files
        .into_iter()
        .find(|(name, _)| name == "image")
        .map(|(_, image)| image);
    Ok((form, image))
}

/// Validates the form, including that the chosen category and location exist.
fn validate(
    connection: &Connection,
    form: &PostForm,
    image: Option<&Upload>,
) -> Result<Result<PostChanges, Errors>, DieselError> {
    let changes = match form.validate(image) {
        Ok(changes) => changes,
        Err(errors) => return Ok(Err(errors)),
    };

    let mut errors = Errors::new();
    if let Some(id) = changes.category_id {
        if !category::exists(connection, id)? {
            errors.add("category", form::INVALID_CHOICE);
        }
    }
    if let Some(id) = changes.location_id {
        if !location::exists(connection, id)? {
            errors.add("location", form::INVALID_CHOICE);
        }
    }
    Ok(errors.check(changes))
}

/// The image path to store: a new upload, nothing if the old image was cleared, else the old one.
fn stored_image(
    state: &State,
    form: &PostForm,
    image: Option<&Upload>,
    current: Option<&Post>,
) -> Result<Option<String>, failure::Error> {
    if let Some(image) = image {
        let media_dir = &Settings::borrow_from(state).media_dir;
        return Ok(Some(image.save_image(media_dir)?));
    }
    if form.clears_image() {
        return Ok(None);
    }
    Ok(current.and_then(|post| post.image.clone()))
}

/// Form for writing a new post
pub fn create(state: &State) -> DocumentResult {
    if let Err(redirect) = login_required(state) {
        return Ok(redirect);
    }
    let connection = &DbConnection::from_state(state)?;

    let form = PostForm::blank(&Utc::now().naive_utc());
    render_form(state, connection, &form, Errors::new(), None)
}

pub fn create_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let viewer = match login_required(state) {
        Ok(viewer) => viewer,
        Err(redirect) => return Ok(redirect),
    };
    let connection = &DbConnection::from_state(state)?;
    let (form, image) = read_form(state, &body)?;

    match validate(connection, &form, image.as_ref())? {
        Ok(mut changes) => {
            changes.image = stored_image(state, &form, image.as_ref(), None)?;
            let created = post::submit(connection, &NewPost::new(changes, viewer.id))?;
            info!("User '{}' wrote post {}", viewer.username, created.id);
            Ok(see_other(state, viewer.url()))
        }
        Err(errors) => render_form(state, connection, &form, errors, None),
    }
}

/// Gets the post in the path, provided the viewer wrote it.
///
/// Anonymous viewers are redirected to the login page and other users to the post.
fn authored<'s>(
    state: &'s State,
    connection: &Connection,
) -> Result<Result<(&'s Viewer, Post), Response<Body>>, failure::Error> {
    let viewer = match login_required(state) {
        Ok(viewer) => viewer,
        Err(redirect) => return Ok(Err(redirect)),
    };
    let id = PostPath::borrow_from(state).post_id;
    let existing = post::get(connection, id)?;

    let access = policy::require_author(Some(viewer), existing.author_id, urls::post(id));
    match deny(state, access) {
        Some(redirect) => Ok(Err(redirect)),
        None => Ok(Ok((viewer, existing))),
    }
}

/// Form for editing an existing post
pub fn edit(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let (_, existing) = match authored(state, connection)? {
        Ok(authored) => authored,
        Err(redirect) => return Ok(redirect),
    };

    render_form(
        state,
        connection,
        &PostForm::from(&existing),
        Errors::new(),
        Some(&existing),
    )
}

pub fn edit_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let (_, existing) = match authored(state, connection)? {
        Ok(authored) => authored,
        Err(redirect) => return Ok(redirect),
    };
    let (form, image) = read_form(state, &body)?;

    match validate(connection, &form, image.as_ref())? {
        Ok(mut changes) => {
            changes.image = stored_image(state, &form, image.as_ref(), Some(&existing))?;
            post::edit(connection, existing.id, &changes)?;
            Ok(see_other(state, existing.url()))
        }
        Err(errors) => render_form(state, connection, &form, errors, Some(&existing)),
    }
}

/// Asks for confirmation before deleting a post
pub fn delete(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let (_, existing) = match authored(state, connection)? {
        Ok(authored) => authored,
        Err(redirect) => return Ok(redirect),
    };

    let entry = post::annotate(connection, vec![existing])?
        .pop()
        .ok_or(NotFound)?;
    let template = DeleteTemplate {
        viewer: Viewer::try_borrow_from(state),
        entry,
    };
    Ok(template.to_response(state))
}

pub fn delete_post(state: &State, _body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let (viewer, existing) = match authored(state, connection)? {
        Ok(authored) => authored,
        Err(redirect) => return Ok(redirect),
    };

    post::delete(connection, existing.id)?;
    info!("User '{}' deleted post {}", viewer.username, existing.id);
    Ok(see_other(state, viewer.url()))
}
