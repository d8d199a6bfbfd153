use rusqlite::{Connection, OptionalExtension};
use time::OffsetDateTime;

use crate::{
    Error,
    family::{Family, FamilyCode, UserName},
};

/// Create a family with `first_user` as its only member.
///
/// # Errors
/// This function will return an [Error::SqlError] if a family with `code` already exists
/// or there is some other SQL error.
pub fn create_family(
    code: &FamilyCode,
    first_user: &UserName,
    connection: &Connection,
) -> Result<Family, Error> {
    let created_at = OffsetDateTime::now_utc();

    let tx = connection.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO family (code, created_at) VALUES (?1, ?2)",
        (code.as_ref(), created_at),
    )?;
    tx.execute(
        "INSERT INTO family_member (family_code, name) VALUES (?1, ?2)",
        (code.as_ref(), first_user.as_ref()),
    )?;
    tx.commit()?;

    tracing::info!("Created family {code} with first member {first_user}");

    Ok(Family {
        code: code.clone(),
        users: vec![first_user.clone()],
        created_at,
    })
}

/// Retrieve the family with `code` and its members in join order.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn find_family(code: &FamilyCode, connection: &Connection) -> Result<Option<Family>, Error> {
    let created_at: Option<OffsetDateTime> = connection
        .prepare("SELECT created_at FROM family WHERE code = :code")?
        .query_row(&[(":code", code.as_ref())], |row| row.get(0))
        .optional()?;

    let Some(created_at) = created_at else {
        return Ok(None);
    };

    let users = connection
        .prepare("SELECT name FROM family_member WHERE family_code = :code ORDER BY id ASC")?
        .query_map(&[(":code", code.as_ref())], |row| {
            let name: String = row.get(0)?;
            Ok(UserName::new_unchecked(&name))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Family {
        code: code.clone(),
        users,
        created_at,
    }))
}

/// Retrieve the family with `code`, creating it with `default_user` as the first member if
/// it does not exist yet.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn find_or_create_family(
    code: &FamilyCode,
    default_user: &UserName,
    connection: &Connection,
) -> Result<Family, Error> {
    match find_family(code, connection)? {
        Some(family) => Ok(family),
        None => create_family(code, default_user, connection),
    }
}

/// Add `user` to the family with `code`, creating the family if the code is unseen.
///
/// Joining a family you are already a member of does nothing.
///
/// # Errors
/// This function will return a:
/// - [Error::FamilyFull] if `user` is new and the family has no free places,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn join_family(
    code: &FamilyCode,
    user: &UserName,
    connection: &Connection,
) -> Result<Family, Error> {
    let Some(mut family) = find_family(code, connection)? else {
        return create_family(code, user, connection);
    };

    if family.has_member(user) {
        return Ok(family);
    }

    if family.is_full() {
        return Err(Error::FamilyFull(code.to_string()));
    }

    connection.execute(
        "INSERT INTO family_member (family_code, name) VALUES (?1, ?2)",
        (code.as_ref(), user.as_ref()),
    )?;
    tracing::info!("{user} joined family {code}");

    family.users.push(user.clone());

    Ok(family)
}

/// Create the family and family member tables in the database.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_family_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS family (
                code TEXT PRIMARY KEY NOT NULL,
                created_at TEXT NOT NULL
            )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS family_member (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                family_code TEXT NOT NULL,
                name TEXT NOT NULL,
                FOREIGN KEY(family_code) REFERENCES family(code) ON UPDATE CASCADE ON DELETE CASCADE,
                UNIQUE(family_code, name)
            )",
        (),
    )?;

    Ok(())
}
