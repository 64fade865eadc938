use bcrypt::BcryptError;
use chrono::{Duration, NaiveDateTime, Utc};
use cookie::CookieJar;
use diesel::{prelude::*, result::Error as DieselError};
use futures::future;
use gotham::{
    handler::HandlerFuture,
    helpers::http::response::create_response,
    middleware::Middleware,
    state::{FromState, State},
};
use gotham_derive::{NewMiddleware, StateData};
use log::{error, info};
use rand::prelude::*;
use sha2::{Digest, Sha256};

use std::fmt;

use crate::{
    db::{Connection, DbConnection},
    schema::{sessions, users},
    urls,
};

const SALT_LEN: usize = 16;
const SESSION_LEN: usize = 24;
const SESSION_DAYS: i64 = 30;

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
// The minimum bcrypt allows, tests hash a lot of passwords
#[cfg(test)]
const HASH_COST: u32 = 4;

pub const COOKIE_NAME: &str = "session";

#[derive(Debug, Queryable, Identifiable)]
pub struct User {
    pub id: i32,
    /// The unique login name, also used in profile urls
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// The hashed password
    hash: String,
    /// The salt for the password
    salt: Vec<u8>,
    pub joined_at: NaiveDateTime,
}

impl User {
    /// Verify the supplied password matches the users
    pub fn verify(&self, password: &str) -> Result<bool, BcryptError> {
        verify(password, &self.salt, &self.hash)
    }

    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name, &self.username)
    }

    pub fn url(&self) -> String {
        urls::profile(&self.username)
    }
}

/// The public part of a user, shown next to their posts and comments.
#[derive(Clone, Debug, Queryable)]
pub struct Author {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

pub type AuthorColumns = (users::id, users::username, users::first_name, users::last_name);

pub const AUTHOR_COLUMNS: AuthorColumns = (
    users::id,
    users::username,
    users::first_name,
    users::last_name,
);

impl Author {
    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name, &self.username)
    }

    pub fn url(&self) -> String {
        urls::profile(&self.username)
    }
}

fn full_name(first: &str, last: &str, username: &str) -> String {
    let name = format!("{} {}", first, last);
    let name = name.trim();
    if name.is_empty() {
        username.to_owned()
    } else {
        name.to_owned()
    }
}

/// A to be created user.
///
/// NOTE: This structure contains the user's unencrypted password, handle it with great care!
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<hidden>")
            .finish()
    }
}

#[derive(Insertable)]
#[table_name = "users"]
struct UserRow {
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    hash: String,
    salt: Vec<u8>,
}

impl NewUser {
    /// Generates a salt and hashes the password.
    fn into_row(self) -> Result<UserRow, BcryptError> {
        let salt = generate_salt().to_vec();
        Ok(UserRow {
            hash: hash(&self.password, &salt)?,
            salt,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
        })
    }
}

/// Editable profile fields
#[derive(Clone, Debug, AsChangeset)]
#[table_name = "users"]
pub struct UserProfile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Login credentials
#[derive(Deserialize)]
pub struct Login {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    password: String,
    /// Where to go after logging in
    pub next: Option<String>,
}

impl Login {
    /// Create a session if username and password is valid
    pub fn login(&self, connection: &Connection) -> Result<Option<Session>, failure::Error> {
        let user = by_username(connection, &self.username)?;
        match user {
            Some(ref user) if user.verify(&self.password)? => {
                let session = start_session(connection, user.id)?;
                info!("User '{}' logged in", user.username);
                Ok(Some(session))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Clone, Debug, Queryable, Insertable)]
pub struct Session {
    pub id: String,
    pub user_id: i32,
    pub expires: NaiveDateTime,
}

impl Session {
    /// Generates a new session.
    ///
    /// NB: Must be inserted into the database for the session to be valid.
    pub fn new(user_id: i32) -> Session {
        // Fill array with random data
        let mut id = [0u8; SESSION_LEN];
        StdRng::from_entropy().fill(&mut id[..]);
        Session {
            id: base64::encode(&id),
            user_id,
            expires: Utc::now().naive_utc() + Duration::days(SESSION_DAYS),
        }
    }
}

/// The logged in user making the current request.
#[derive(Clone, Debug, StateData)]
pub struct Viewer {
    pub id: i32,
    pub username: String,
    /// Id of the session the request was made with
    pub session: String,
}

impl Viewer {
    /// Looks up the owner of an unexpired session.
    pub fn from_session(connection: &Connection, id: &str) -> Result<Option<Viewer>, DieselError> {
        let now = Utc::now().naive_utc();
        let found: Option<(i32, String)> = sessions::table
            .inner_join(users::table)
            .filter(sessions::id.eq(id))
            .filter(sessions::expires.gt(now))
            .select((users::id, users::username))
            .first(connection)
            .optional()?;
        Ok(found.map(|(user_id, username)| Viewer {
            id: user_id,
            username,
            session: id.to_owned(),
        }))
    }

    pub fn url(&self) -> String {
        urls::profile(&self.username)
    }
}

#[derive(Clone, NewMiddleware)]
pub struct SessionMiddleware;

impl Middleware for SessionMiddleware {
    fn call<C>(self, mut state: State, chain: C) -> Box<HandlerFuture>
    where
        C: FnOnce(State) -> Box<HandlerFuture>,
    {
        let put_viewer = |state: &mut State| -> Result<(), failure::Error> {
            let viewer = {
                let connection = DbConnection::from_state(state)?;
                let cookie = CookieJar::borrow_from(state)
                    .get(COOKIE_NAME)
                    .map(|cookie| cookie.value().to_owned());
                match cookie {
                    Some(id) => Viewer::from_session(&connection, &id)?,
                    None => None,
                }
            };
            if let Some(viewer) = viewer {
                state.put(viewer);
            }
            Ok(())
        };
        match put_viewer(&mut state) {
            Ok(()) => Box::new(chain(state)),
            Err(e) => {
                error!("Failed to look up session: {}", e);
                let response = create_response(
                    &state,
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    mime::TEXT_PLAIN,
                    e.to_string(),
                );
                Box::new(future::ok((state, response)))
            }
        }
    }
}

/// Password hashing function. Inspired by [Dropbox's password storage policy][1].
///
/// First the password and salt are combined, then hashed with SHA256 to prevent DoS attacks. The
/// password is then hashed with bcrypt.
///
/// [1]: https://blogs.dropbox.com/tech/2016/09/how-dropbox-securely-stores-your-passwords/
fn hash(key: &str, salt: &[u8]) -> Result<String, BcryptError> {
    // digest the password and salt
    let digest = Sha256::new().chain(key).chain(salt).finalize();
    // Hash the password with bcrypt (base64 encode to avoid zero-bytes).
    bcrypt::hash(base64::encode(&digest), HASH_COST)
}

fn verify(key: &str, salt: &[u8], hash: &str) -> Result<bool, BcryptError> {
    let digest = Sha256::new().chain(key).chain(salt).finalize();
    bcrypt::verify(&base64::encode(&digest), hash)
}

/// Generates a new salt of length `SALT_LEN`
fn generate_salt() -> [u8; SALT_LEN] {
    let mut bytes = [0u8; SALT_LEN];

    StdRng::from_entropy().fill(&mut bytes[..]);

    bytes
}

/// Creates a user
pub fn create(connection: &Connection, user: NewUser) -> Result<User, failure::Error> {
    let user = diesel::insert_into(users::table)
        .values(&user.into_row()?)
        .get_result(connection)?;
    Ok(user)
}

/// Creates and stores a session for the given user.
pub fn start_session(connection: &Connection, user_id: i32) -> Result<Session, DieselError> {
    let session = Session::new(user_id);
    diesel::insert_into(sessions::table)
        .values(&session)
        .execute(connection)?;
    Ok(session)
}

pub fn get(connection: &Connection, id: i32) -> Result<User, DieselError> {
    users::table.find(id).first(connection)
}

pub fn by_username(connection: &Connection, username: &str) -> Result<Option<User>, DieselError> {
    users::table
        .filter(users::username.eq(username))
        .first(connection)
        .optional()
}

/// Checks whether a username is taken by anyone other than `except`.
pub fn username_taken(
    connection: &Connection,
    username: &str,
    except: Option<i32>,
) -> Result<bool, DieselError> {
    let owner = by_username(connection, username)?;
    Ok(match owner {
        Some(owner) => Some(owner.id) != except,
        None => false,
    })
}

/// Gets the authors with the given ids.
pub fn authors(connection: &Connection, ids: Vec<i32>) -> Result<Vec<Author>, DieselError> {
    users::table
        .filter(users::id.eq_any(ids))
        .select(AUTHOR_COLUMNS)
        .load(connection)
}

pub fn logout(connection: &Connection, session: &str) -> Result<usize, DieselError> {
    use crate::schema::sessions::dsl;

    diesel::delete(dsl::sessions.find(session)).execute(connection)
}

pub fn edit_profile(
    connection: &Connection,
    id: i32,
    profile: &UserProfile,
) -> Result<usize, DieselError> {
    use crate::schema::users::dsl;

    diesel::update(dsl::users.find(id))
        .set(profile)
        .execute(connection)
}

#[cfg(test)]
mod tests {
    use super::{full_name, generate_salt, hash, verify, NewUser, Session};

    #[test]
    fn password_roundtrip() {
        let salt = generate_salt();
        let hashed = hash("correct horse", &salt).unwrap();
        assert!(verify("correct horse", &salt, &hashed).unwrap());
        assert!(!verify("battery staple", &salt, &hashed).unwrap());
    }

    #[test]
    fn salt_matters() {
        let hashed = hash("correct horse", &generate_salt()).unwrap();
        assert!(!verify("correct horse", &generate_salt(), &hashed).unwrap());
    }

    #[test]
    fn sessions_are_unique() {
        let a = Session::new(1);
        let b = Session::new(1);
        assert_ne!(a.id, b.id);
        assert_eq!(base64::decode(&a.id).unwrap().len(), super::SESSION_LEN);
    }

    #[test]
    fn display_name_falls_back_to_username() {
        assert_eq!(full_name("Ada", "Lovelace", "ada"), "Ada Lovelace");
        assert_eq!(full_name("Ada", "", "ada"), "Ada");
        assert_eq!(full_name("", "", "ada"), "ada");
    }

    #[test]
    fn debug_hides_password() {
        let user = NewUser {
            username: String::from("ada"),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password: String::from("analytical"),
        };
        let debug = format!("{:?}", user);
        assert!(debug.contains("ada"));
        assert!(!debug.contains("analytical"));
    }
}
