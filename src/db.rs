use diesel_migrations::embed_migrations;
use gotham::state::{FromState, State};
use gotham_derive::StateData;
use log::info;

use std::sync::{Arc, Mutex, MutexGuard};

pub use diesel::pg::PgConnection as Connection;

embed_migrations!();

/// The wrapper for a database connection that can shared via gotham's state data
#[derive(Clone, StateData)]
pub struct DbConnection {
    connection: Arc<Mutex<Connection>>,
}

impl DbConnection {
    pub fn new(connection: Connection) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
        }
    }

    pub fn from_url(url: &str) -> Result<Self, failure::Error> {
        Ok(Self::new(connect(url)?))
    }

    /// Locks the connection stored in the request state.
    pub fn from_state(state: &State) -> Result<MutexGuard<Connection>, failure::Error> {
        Self::borrow_from(state).lock()
    }

    pub fn lock(&self) -> Result<MutexGuard<Connection>, failure::Error> {
        match self.connection.lock() {
            Ok(lock) => Ok(lock),
            Err(_) => Err(failure::err_msg("failed to get lock")),
        }
    }
}

/// Connects to the database and brings the schema up to date.
pub fn connect(url: &str) -> Result<Connection, failure::Error> {
    let connection = diesel::Connection::establish(url)?;

    embedded_migrations::run(&connection)?;
    info!("Database migrations are up to date");

    Ok(connection)
}
