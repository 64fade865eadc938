//! A multi-user blog.
//!
//! It has the following address scheme:
//! * `/` - Newest public posts, paginated with `?page=<n>`
//! * `/category/<slug>/` - Public posts in a category
//! * `/posts` - Post handling
//!     * `/create/` - Write a post
//!     * `/<id>/` - A post and its comments
//!     * `/<id>/edit/` - Edit a post
//!     * `/<id>/delete/` - Delete a post
//!     * `/<id>/comment/` - Add a comment
//!     * `/<id>/edit_comment/<comment id>/` - Edit a comment
//!     * `/<id>/delete_comment/<comment id>/` - Delete a comment
//! * `/profile` - User profiles
//!     * `/edit/` - Edit your own profile
//!     * `/<username>/` - A user's profile and posts
//! * `/auth` - Accounts
//!     * `/login/`, `/logout/` and `/registration/`
//! * `/feed.rss` - RSS feed
//! * `/static/*` - Stylesheets and such
//! * `/media/*` - Uploaded post images

#![allow(clippy::new_without_default)]

#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;
#[macro_use]
extern crate serde;

pub mod category;
pub mod comment;
pub mod config;
pub mod date_format;
pub mod db;
pub mod document;
pub mod form;
pub mod handler;
pub mod location;
pub mod paginate;
pub mod policy;
pub mod post;
pub mod schema;
pub mod upload;
pub mod urls;
pub mod user;

#[cfg(test)]
mod tests;

use gotham::{
    middleware::cookie::CookieParser,
    middleware::state::StateMiddleware,
    pipeline::new_pipeline,
    pipeline::single::single_pipeline,
    router::builder::{build_router, DefineSingleRoute, DrawRoutes},
    router::response::extender::ResponseExtender,
    router::Router,
    state::{FromState, State},
};
use http::status::StatusCode;
use hyper::{Body, Response};
use log::info;

use crate::{
    config::Settings,
    db::DbConnection,
    handler::{
        paths::{CategoryPath, CommentPath, LoginQuery, PageQuery, PostPath, UserPath},
        NotFoundTemplate,
    },
    user::{SessionMiddleware, Viewer},
};

/// Response extender for 404 errors
pub struct NotFound;

impl ResponseExtender<Body> for NotFound {
    fn extend(&self, state: &mut State, res: &mut Response<Body>) {
        let template = NotFoundTemplate {
            viewer: Viewer::try_borrow_from(state),
        };
        if let Ok(page) = askama::Template::render(&template) {
            res.headers_mut().insert(
                http::header::CONTENT_TYPE,
                http::HeaderValue::from_static("text/html; charset=utf-8"),
            );
            *res.body_mut() = page.into();
        }
    }
}

/// Builds the request router
pub fn router(settings: &Settings, connection: DbConnection) -> Router {
    // Build pipeline
    let (chain, pipelines) = single_pipeline(
        new_pipeline()
            .add(StateMiddleware::new(connection))
            .add(StateMiddleware::new(settings.clone()))
            .add(CookieParser)
            .add(SessionMiddleware)
            .build(),
    );

    build_router(chain, pipelines, |route| {
        use crate::document::{comment, index, post, user};

        route
            .get("/")
            .with_query_string_extractor::<PageQuery>()
            .to(handler!(index::feed));

        route
            .get("/category/:slug")
            .with_path_extractor::<CategoryPath>()
            .with_query_string_extractor::<PageQuery>()
            .to(handler!(index::category));

        route.scope("/posts", |route| {
            route.get("/create").to(handler!(post::create));
            route.post("/create").to(body_handler!(post::create_post));

            route
                .get("/:post_id:[0-9]+")
                .with_path_extractor::<PostPath>()
                .to(handler!(post::view));

            route
                .get("/:post_id:[0-9]+/edit")
                .with_path_extractor::<PostPath>()
                .to(handler!(post::edit));
            route
                .post("/:post_id:[0-9]+/edit")
                .with_path_extractor::<PostPath>()
                .to(body_handler!(post::edit_post));

            route
                .get("/:post_id:[0-9]+/delete")
                .with_path_extractor::<PostPath>()
                .to(handler!(post::delete));
            route
                .post("/:post_id:[0-9]+/delete")
                .with_path_extractor::<PostPath>()
                .to(body_handler!(post::delete_post));

            route
                .post("/:post_id:[0-9]+/comment")
                .with_path_extractor::<PostPath>()
                .to(body_handler!(comment::add));

            route
                .get("/:post_id:[0-9]+/edit_comment/:comment_id:[0-9]+")
                .with_path_extractor::<CommentPath>()
                .to(handler!(comment::edit));
            route
                .post("/:post_id:[0-9]+/edit_comment/:comment_id:[0-9]+")
                .with_path_extractor::<CommentPath>()
                .to(body_handler!(comment::edit_post));

            route
                .get("/:post_id:[0-9]+/delete_comment/:comment_id:[0-9]+")
                .with_path_extractor::<CommentPath>()
                .to(handler!(comment::delete));
            route
                .post("/:post_id:[0-9]+/delete_comment/:comment_id:[0-9]+")
                .with_path_extractor::<CommentPath>()
                .to(body_handler!(comment::delete_post));
        });

        route.scope("/profile", |route| {
            route.get("/edit").to(handler!(user::edit));
            route.post("/edit").to(body_handler!(user::edit_post));

            route
                .get("/:username")
                .with_path_extractor::<UserPath>()
                .with_query_string_extractor::<PageQuery>()
                .to(handler!(user::view));
        });

        route.scope("/auth", |route| {
            route
                .get("/login")
                .with_query_string_extractor::<LoginQuery>()
                .to(handler!(user::login));
            route.post("/login").to(body_handler!(user::login_post));

            route.get("/logout").to(handler!(user::logout));

            route.get("/registration").to(handler!(user::registration));
            route
                .post("/registration")
                .to(body_handler!(user::registration_post));
        });

        route.get("/feed.rss").to(handler!(handler::rss::rss));

        route.get("/static/*").to_dir(settings.static_dir.as_str());
        route.get("/media/*").to_dir(settings.media_dir.as_str());

        // Error responders
        route.add_response_extender(StatusCode::NOT_FOUND, NotFound);
    })
}

fn main() -> Result<(), failure::Error> {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| String::from("info"));
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();

    let settings = Settings::load()?;
    let connection = DbConnection::from_url(&settings.database_url)?;
    let address = settings.host_address.clone();

    info!("Running at {}", address);
    gotham::start(address, router(&settings, connection));
    Ok(())
}
