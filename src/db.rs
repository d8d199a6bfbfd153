//! Sets up the application's SQLite database.

use rusqlite::Connection;

use crate::{
    Error, family::create_family_tables, recurring::create_recurring_rule_table,
    transaction::create_transaction_tables,
};

/// Create the all of the database tables for the application.
///
/// Safe to call on an existing database, tables that already exist are left alone.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = connection.unchecked_transaction()?;

    create_family_tables(&transaction)?;
    create_recurring_rule_table(&transaction)?;
    create_transaction_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}
