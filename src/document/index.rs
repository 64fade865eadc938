//! The front page feed and category pages
use askama::Template;
use gotham::state::{FromState, State};

use super::{DocumentResult, TemplateExt};
use crate::{
    category::{self, Category},
    db::DbConnection,
    handler::paths::{CategoryPath, PageQuery},
    paginate::Page,
    post::{self, Entry, Scope},
    user::Viewer,
};

#[derive(Template)]
#[template(path = "index.html")]
pub struct Index<'a> {
    page: Page<Entry>,
    viewer: Option<&'a Viewer>,
}

/// Newest public posts
pub fn feed(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let requested = PageQuery::borrow_from(state).page();

    let page = post::page(connection, Scope::Public, requested)?;

    let template = Index {
        page,
        viewer: Viewer::try_borrow_from(state),
    };
    Ok(template.to_response(state))
}

#[derive(Template)]
#[template(path = "category.html")]
pub struct CategoryTemplate<'a> {
    category: Category,
    page: Page<Entry>,
    viewer: Option<&'a Viewer>,
}

/// Newest public posts of a published category
pub fn category(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let slug = &CategoryPath::borrow_from(state).slug;
    let requested = PageQuery::borrow_from(state).page();

    let category = category::published_by_slug(connection, slug)?;
    let page = post::page(connection, Scope::Category(category.id), requested)?;

    let template = CategoryTemplate {
        category,
        page,
        viewer: Viewer::try_borrow_from(state),
    };
    Ok(template.to_response(state))
}
