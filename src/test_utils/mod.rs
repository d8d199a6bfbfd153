#![allow(missing_docs)]

pub(crate) mod http;

use rusqlite::Connection;

use crate::db::initialize;

pub(crate) use http::{assert_status_ok, response_json};

/// An in-memory database with all of the application tables.
#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("could not open in-memory database");
    initialize(&connection).expect("could not initialize database");
    connection
}
