//! Traveler and employee accounts.
//!
//! Passwords are stored and compared as plain text. This matches the existing user data
//! and is a known security defect: hashing is not part of this service yet.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::UserType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Error, Debug)]
pub enum UserError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Email is already registered")]
    EmailTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        user_type: row.get(4)?,
    })
}

/// Create a traveler account. Emails are unique.
pub fn register(conn: &mut Connection, registration: &Registration) -> Result<User, UserError> {
    let tx = conn.transaction()?;
    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM users WHERE email = ?1",
            [&registration.email],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Err(UserError::EmailTaken);
    }

    tx.execute(
        "INSERT INTO users (first_name, last_name, email, password, user_type)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            registration.first_name,
            registration.last_name,
            registration.email,
            registration.password,
            UserType::Traveler
        ],
    )?;
    let user = tx.query_row(
        "SELECT id, first_name, last_name, email, user_type FROM users WHERE id = ?1",
        [tx.last_insert_rowid()],
        user_from_row,
    )?;
    tx.commit()?;
    log::info!("Registered user {} ({})", user.id, user.email);
    Ok(user)
}

/// Check an email/password pair. Unknown emails and wrong passwords are
/// indistinguishable to the caller.
pub fn login(conn: &Connection, email: &str, password: &str) -> Result<User, UserError> {
    let found = conn
        .query_row(
            "SELECT id, first_name, last_name, email, user_type, password FROM users WHERE email = ?1",
            [email],
            |row| Ok((user_from_row(row)?, row.get::<_, String>(5)?)),
        )
        .optional()?;
    match found {
        Some((user, stored)) if stored == password => {
            log::debug!("User {} logged in", user.id);
            Ok(user)
        }
        _ => Err(UserError::InvalidCredentials),
    }
}
