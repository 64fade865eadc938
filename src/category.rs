use chrono::NaiveDateTime;
use diesel::{pg::PgConnection as Connection, prelude::*, result::Error as DieselError};

use crate::{schema::categories, urls};

#[derive(Clone, Debug, Queryable, Identifiable)]
#[table_name = "categories"]
pub struct Category {
    pub id: i32,
    pub title: String,
    pub description: String,
    /// Unique identifier used in the category's url
    pub slug: String,
    /// Unpublished categories hide all of their posts from the public
    pub is_published: bool,
    pub created_at: NaiveDateTime,
}

impl Category {
    pub fn url(&self) -> String {
        urls::category(&self.slug)
    }
}

#[derive(Insertable)]
#[table_name = "categories"]
pub struct NewCategory<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub slug: &'a str,
    pub is_published: bool,
}

/// Gets a published category by its slug.
pub fn published_by_slug(connection: &Connection, slug: &str) -> Result<Category, DieselError> {
    use crate::schema::categories::dsl;

    dsl::categories
        .filter(dsl::slug.eq(slug))
        .filter(dsl::is_published.eq(true))
        .first(connection)
}

pub fn get(connection: &Connection, id: i32) -> Result<Option<Category>, DieselError> {
    categories::table.find(id).first(connection).optional()
}

pub fn get_many(connection: &Connection, ids: Vec<i32>) -> Result<Vec<Category>, DieselError> {
    categories::table
        .filter(categories::id.eq_any(ids))
        .load(connection)
}

/// All categories, as choices for the post form.
pub fn list(connection: &Connection) -> Result<Vec<Category>, DieselError> {
    categories::table
        .order(categories::title.asc())
        .load(connection)
}

pub fn exists(connection: &Connection, id: i32) -> Result<bool, DieselError> {
    Ok(get(connection, id)?.is_some())
}

pub fn create(connection: &Connection, category: &NewCategory) -> Result<Category, DieselError> {
    diesel::insert_into(categories::table)
        .values(category)
        .get_result(connection)
}
