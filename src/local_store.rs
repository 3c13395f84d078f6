//! Durable key-value storage on the device running the app.
//!
//! The transaction list is stored as one JSON snapshot that is overwritten in
//! full after every change. The remembered email and household code are
//! stored under their own keys.

use rusqlite::{Connection, OptionalExtension};

use crate::{Error, transaction::Transaction};

/// The key holding the JSON snapshot of the local transaction list.
pub const TRANSACTIONS_KEY: &str = "budget_app_transactions";
/// The key holding the email address used to sign in.
pub const EMAIL_KEY: &str = "email";
/// The key holding the household code.
pub const HOUSEHOLD_KEY: &str = "household_id";

/// Create the key-value table used for local storage.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_local_storage_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS local_storage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub fn get_item(key: &str, connection: &Connection) -> Result<Option<String>, Error> {
    connection
        .query_row(
            "SELECT value FROM local_storage WHERE key = :key",
            &[(":key", &key)],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
}

pub fn set_item(key: &str, value: &str, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO local_storage (key, value) VALUES (?1, ?2)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (key, value),
    )?;

    Ok(())
}

/// Load the locally saved transaction list.
///
/// A missing or unreadable snapshot yields a list with just the seed
/// transaction, see [Transaction::seed].
pub fn load_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    let Some(raw) = get_item(TRANSACTIONS_KEY, connection)? else {
        return Ok(vec![Transaction::seed()]);
    };

    match serde_json::from_str::<Vec<Transaction>>(&raw) {
        Ok(transactions) => Ok(transactions),
        Err(error) => {
            tracing::warn!("Could not parse saved transactions, using seed data instead: {error}");
            Ok(vec![Transaction::seed()])
        }
    }
}

/// Overwrite the locally saved transaction list with `transactions`.
pub fn save_transactions(transactions: &[Transaction], connection: &Connection) -> Result<(), Error> {
    let snapshot = serde_json::to_string(transactions)?;

    set_item(TRANSACTIONS_KEY, &snapshot, connection)
}

/// The sign in details remembered on this device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HouseholdContext {
    pub email: Option<String>,
    pub household_id: Option<String>,
}

impl HouseholdContext {
    /// Whether both an email and a household code have been saved.
    pub fn is_complete(&self) -> bool {
        self.email.as_deref().is_some_and(|email| !email.is_empty())
            && self.household_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

pub fn load_household_context(connection: &Connection) -> Result<HouseholdContext, Error> {
    Ok(HouseholdContext {
        email: get_item(EMAIL_KEY, connection)?,
        household_id: get_item(HOUSEHOLD_KEY, connection)?,
    })
}

pub fn save_household_context(
    email: &str,
    household_id: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;
    set_item(EMAIL_KEY, email, &transaction)?;
    set_item(HOUSEHOLD_KEY, household_id, &transaction)?;
    transaction.commit()?;

    Ok(())
}
