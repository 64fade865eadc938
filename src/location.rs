use chrono::NaiveDateTime;
use diesel::{pg::PgConnection as Connection, prelude::*, result::Error as DieselError};

use crate::schema::locations;

#[derive(Clone, Debug, Queryable, Identifiable)]
pub struct Location {
    pub id: i32,
    pub name: String,
    /// Unpublished locations are not shown next to their posts
    pub is_published: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "locations"]
pub struct NewLocation<'a> {
    pub name: &'a str,
    pub is_published: bool,
}

pub fn get_many(connection: &Connection, ids: Vec<i32>) -> Result<Vec<Location>, DieselError> {
    locations::table
        .filter(locations::id.eq_any(ids))
        .load(connection)
}

/// All locations, as choices for the post form.
pub fn list(connection: &Connection) -> Result<Vec<Location>, DieselError> {
    locations::table.order(locations::name.asc()).load(connection)
}

pub fn exists(connection: &Connection, id: i32) -> Result<bool, DieselError> {
    let found: Option<Location> = locations::table.find(id).first(connection).optional()?;
    Ok(found.is_some())
}

pub fn create(connection: &Connection, location: &NewLocation) -> Result<Location, DieselError> {
    diesel::insert_into(locations::table)
        .values(location)
        .get_result(connection)
}
