use askama::Template;
use diesel::result::Error as DieselError;
use failure::Fail;
use futures::{future, Future, Stream};
use gotham::{
    handler::{HandlerFuture, IntoHandlerError},
    helpers::http::response::create_temporary_redirect as temp_redirect,
    state::{FromState, State},
};
use http::{Response, StatusCode};
use hyper::{Body, Method, Uri};
use log::error;

use std::borrow::Cow;

use crate::{
    document::TemplateExt,
    policy::{self, Access},
    urls,
    user::Viewer,
};

pub mod paths;
pub mod rss;

/// Returned by handlers when the requested entity doesn't exist or is hidden from the viewer.
#[derive(Debug, Fail)]
#[fail(display = "Not found")]
pub struct NotFound;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    viewer: Option<&'a Viewer>,
    error: String,
}

#[derive(Template)]
#[template(path = "not-found.html")]
pub struct NotFoundTemplate<'a> {
    pub viewer: Option<&'a Viewer>,
}

/// Creates a `HandlerFuture` that runs the given function
pub fn body_handler<F>(mut state: State, op: F) -> Box<HandlerFuture>
where
    F: FnOnce(&State, Vec<u8>) -> Response<Body> + Send + 'static,
{
    let f = Body::take_from(&mut state)
        .concat2()
        .then(|result| match result {
            Ok(body) => {
                let response = op(&state, body.to_vec());
                future::ok((state, response))
            }
            Err(e) => future::err((state, e.into_handler_error())),
        });

    Box::new(f)
}

pub fn error_response(state: &State, error: impl std::fmt::Display) -> Response<Body> {
    let template = ErrorTemplate {
        viewer: Viewer::try_borrow_from(state),
        error: error.to_string(),
    };
    let mut response = template.to_response(state);
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

pub fn not_found(state: &State) -> Response<Body> {
    let template = NotFoundTemplate {
        viewer: Viewer::try_borrow_from(state),
    };
    let mut response = template.to_response(state);
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

fn is_not_found(error: &failure::Error) -> bool {
    error.downcast_ref::<NotFound>().is_some()
        || match error.downcast_ref::<DieselError>() {
            Some(DieselError::NotFound) => true,
            _ => false,
        }
}

pub fn response(state: &State, result: Result<Response<Body>, failure::Error>) -> Response<Body> {
    match result {
        Ok(response) => response,
        Err(ref error) if is_not_found(error) => not_found(state),
        Err(error) => {
            error!("{}", error);
            error_response(state, error)
        }
    }
}

/// Redirects to `location`, switching the method to GET.
pub fn see_other(state: &State, location: impl Into<Cow<'static, str>>) -> Response<Body> {
    let mut response = temp_redirect(state, location);
    *response.status_mut() = StatusCode::SEE_OTHER;
    response
}

/// The viewer, or a redirect to the login page for anonymous requests.
///
/// Page requests come back to the same address after logging in. Form posts don't, their body is
/// lost anyway.
pub fn login_required(state: &State) -> Result<&Viewer, Response<Body>> {
    let viewer = Viewer::try_borrow_from(state);
    let next = match *Method::borrow_from(state) {
        Method::GET => Uri::borrow_from(state)
            .path_and_query()
            .map(|path| path.as_str()),
        _ => None,
    };
    if let Some(redirect) = deny(state, policy::require_login(viewer, next)) {
        return Err(redirect);
    }
    viewer.ok_or_else(|| see_other(state, urls::LOGIN))
}

/// Turns a denied access check into a redirect, or `None` when access is allowed.
pub fn deny(state: &State, access: Access) -> Option<Response<Body>> {
    match access {
        Access::Allowed => None,
        Access::DenyRedirect(target) => Some(see_other(state, target)),
    }
}

#[macro_export]
macro_rules! handler {
    ($handler_fn:path) => {
        |state| {
            let r = crate::handler::response(&state, $handler_fn(&state));
            (state, r)
        }
    };
}

#[macro_export]
macro_rules! body_handler {
    ($handler_fn:path) => {
        |state| {
            crate::handler::body_handler(state, |state, post| {
                crate::handler::response(&state, $handler_fn(state, post))
            })
        }
    };
}
