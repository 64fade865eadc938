use chrono::NaiveDateTime;
use diesel::{
    dsl::sql, sql_types::BigInt, pg::PgConnection as Connection, prelude::*, result::Error as DieselError,
};

use std::collections::HashMap;

use crate::{
    date_format,
    schema::{comments, users},
    urls,
    user::{Author, AUTHOR_COLUMNS},
};

#[derive(Clone, Debug, Queryable, Identifiable)]
pub struct Comment {
    /// The unique id of this comment
    pub id: i32,
    /// The comment's content
    pub text: String,
    /// The id of the post this comment belongs to
    pub post_id: i32,
    /// The user who submitted the comment
    pub author_id: i32,
    /// The time of the comment's submission
    pub created_at: NaiveDateTime,
}

impl Comment {
    pub fn date(&self) -> String {
        date_format::display(&self.created_at)
    }

    pub fn edit_url(&self) -> String {
        urls::edit_comment(self.post_id, self.id)
    }

    pub fn delete_url(&self) -> String {
        urls::delete_comment(self.post_id, self.id)
    }
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "comments"]
pub struct NewComment {
    pub text: String,
    pub post_id: i32,
    pub author_id: i32,
}

/// A comment and the user who wrote it
#[derive(Clone, Debug)]
pub struct Thread {
    pub comment: Comment,
    pub author: Author,
}

/// Gets the comments of a post, oldest first
pub fn list(connection: &Connection, post: i32) -> Result<Vec<Thread>, DieselError> {
    let rows: Vec<(Comment, Author)> = comments::table
        .inner_join(users::table)
        .filter(comments::post_id.eq(post))
        .order((comments::created_at.asc(), comments::id.asc()))
        .select((comments::all_columns, AUTHOR_COLUMNS))
        .load(connection)?;
    Ok(rows
        .into_iter()
        .map(|(comment, author)| Thread { comment, author })
        .collect())
}

/// Counts the comments of each of the given posts. Posts without comments are left out.
pub fn counts(
    connection: &Connection,
    posts: Vec<i32>,
) -> Result<HashMap<i32, usize>, DieselError> {
    let rows: Vec<(i32, i64)> = comments::table
        .filter(comments::post_id.eq_any(posts))
        .group_by(comments::post_id)
        .select((comments::post_id, sql::<BigInt>("COUNT(*)")))
        .load(connection)?;
    Ok(rows
        .into_iter()
        .map(|(post, count)| (post, count as usize))
        .collect())
}

/// Gets a comment, provided it belongs to the given post.
pub fn view(connection: &Connection, post: i32, id: i32) -> Result<Comment, DieselError> {
    comments::table
        .find(id)
        .filter(comments::post_id.eq(post))
        .first(connection)
}

pub fn submit(connection: &Connection, comment: &NewComment) -> Result<Comment, DieselError> {
    diesel::insert_into(comments::table)
        .values(comment)
        .get_result(connection)
}

pub fn edit(connection: &Connection, id: i32, text: &str) -> Result<usize, DieselError> {
    diesel::update(comments::table.find(id))
        .set(comments::text.eq(text))
        .execute(connection)
}

pub fn delete(connection: &Connection, id: i32) -> Result<usize, DieselError> {
    diesel::delete(comments::table.find(id)).execute(connection)
}
