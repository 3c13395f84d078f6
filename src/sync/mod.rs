//! Decides where transactions are read from and written to, and keeps the
//! in-memory transaction list in step with that store.
//!
//! In local mode the list lives in local storage on this device. In remote
//! mode it lives in the household's hosted store and the in-memory list is a
//! copy of the last fetch plus any changes made since.

#[cfg(test)]
pub(crate) mod fake;
pub mod remote;

use std::{
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard},
};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{AuthProvider, Session},
    local_store::{load_household_context, load_transactions, save_transactions},
    transaction::{NewTransaction, Transaction, TransactionId},
};

pub use remote::{RemoteError, SupabaseTransactionService, TransactionService};

/// Who is acting on the remote store and on behalf of which household.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteScope {
    pub user_id: String,
    pub household_id: String,
    pub access_token: String,
}

/// Where reads and writes go for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceMode {
    Local,
    Remote(RemoteScope),
}

impl PersistenceMode {
    /// Remote mode needs a configured service, a signed in user and a household.
    pub fn resolve(
        remote_configured: bool,
        session: Option<&Session>,
        household_id: Option<&str>,
    ) -> Self {
        match (remote_configured, session, household_id) {
            (true, Some(session), Some(household_id)) if !household_id.is_empty() => {
                PersistenceMode::Remote(RemoteScope {
                    user_id: session.user.id.clone(),
                    household_id: household_id.to_owned(),
                    access_token: session.access_token.clone(),
                })
            }
            _ => PersistenceMode::Local,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, PersistenceMode::Remote(_))
    }
}

/// The list of transactions shown to the user, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn prepend(&mut self, transaction: Transaction) {
        self.transactions.insert(0, transaction);
    }

    /// Remove the transaction with `id`, returning it if it was in the list.
    pub fn remove(&mut self, id: &TransactionId) -> Option<Transaction> {
        let index = self
            .transactions
            .iter()
            .position(|transaction| &transaction.id == id)?;

        Some(self.transactions.remove(index))
    }

    pub fn replace(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
    }
}

/// Routes transaction changes to the store selected by a [PersistenceMode].
///
/// Locks are only held for in-memory work and local storage writes, never
/// while waiting on the remote service.
#[derive(Clone)]
pub struct SyncPolicy {
    ledger: Arc<Mutex<Ledger>>,
    db_connection: Arc<Mutex<Connection>>,
    remote: Option<Arc<dyn TransactionService>>,
}

impl Debug for SyncPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncPolicy")
            .field("ledger", &self.ledger)
            .field("remote_configured", &self.remote.is_some())
            .finish_non_exhaustive()
    }
}

impl SyncPolicy {
    /// Create the policy and fill the ledger from local storage.
    ///
    /// # Errors
    /// Returns an error if local storage cannot be read.
    pub fn new(
        db_connection: Arc<Mutex<Connection>>,
        remote: Option<Arc<dyn TransactionService>>,
    ) -> Result<Self, Error> {
        let policy = Self {
            ledger: Arc::new(Mutex::new(Ledger::default())),
            db_connection,
            remote,
        };

        policy.load_local()?;

        Ok(policy)
    }

    pub fn is_remote_configured(&self) -> bool {
        self.remote.is_some()
    }

    /// A copy of the current transaction list.
    pub fn snapshot(&self) -> Result<Vec<Transaction>, Error> {
        Ok(self.lock_ledger()?.transactions().to_vec())
    }

    /// A copy of the transaction with `id`, if it is in the ledger.
    pub fn find(&self, id: &TransactionId) -> Result<Option<Transaction>, Error> {
        Ok(self
            .lock_ledger()?
            .transactions()
            .iter()
            .find(|transaction| &transaction.id == id)
            .cloned())
    }

    /// Replace the ledger with the list saved in local storage.
    pub fn load_local(&self) -> Result<(), Error> {
        let transactions = {
            let connection = self.lock_db()?;
            load_transactions(&connection)?
        };
        self.lock_ledger()?.replace(transactions);

        Ok(())
    }

    /// Replace the ledger with the list from the store selected by `mode`.
    ///
    /// Remote lists are not written to local storage.
    pub async fn load(&self, mode: &PersistenceMode) -> Result<(), Error> {
        match mode {
            PersistenceMode::Local => self.load_local(),
            PersistenceMode::Remote(scope) => {
                let transactions = self.remote()?.select_by_household(scope).await?;
                tracing::debug!(
                    "Loaded {} transactions for household {}",
                    transactions.len(),
                    scope.household_id
                );
                self.lock_ledger()?.replace(transactions);

                Ok(())
            }
        }
    }

    /// Replace the ledger after the signed in user or household changed.
    ///
    /// Unlike [SyncPolicy::load], a failed remote load empties the ledger so
    /// that records from the previous user or household are not shown.
    pub async fn switch_to(&self, mode: &PersistenceMode) -> Result<(), Error> {
        let result = self.load(mode).await;

        if result.is_err() && mode.is_remote() {
            self.lock_ledger()?.replace(Vec::new());
        }

        result
    }

    /// Store `new_transaction` and add it to the top of the ledger.
    ///
    /// On failure the ledger is left unchanged.
    pub async fn add(
        &self,
        mode: &PersistenceMode,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, Error> {
        match mode {
            PersistenceMode::Local => {
                let transaction = Transaction::new_local(new_transaction);

                let mut ledger = self.lock_ledger()?;
                let mut updated = ledger.clone();
                updated.prepend(transaction.clone());
                let connection = self.lock_db()?;
                save_transactions(updated.transactions(), &connection)?;
                *ledger = updated;

                Ok(transaction)
            }
            PersistenceMode::Remote(scope) => {
                let transaction = self.remote()?.insert(scope, &new_transaction).await?;
                self.lock_ledger()?.prepend(transaction.clone());

                Ok(transaction)
            }
        }
    }

    /// Delete the transaction `id` from the store selected by `mode`.
    ///
    /// Returns the number of records deleted. In remote mode this is zero when
    /// the transaction belongs to another user, in which case the ledger is
    /// left as is.
    ///
    /// # Errors
    /// Returns [Error::DeleteMissingTransaction] if in local mode and `id` is
    /// not in the ledger.
    pub async fn delete(&self, mode: &PersistenceMode, id: &TransactionId) -> Result<usize, Error> {
        match mode {
            PersistenceMode::Local => {
                let mut ledger = self.lock_ledger()?;
                let mut updated = ledger.clone();

                if updated.remove(id).is_none() {
                    return Err(Error::DeleteMissingTransaction);
                }

                let connection = self.lock_db()?;
                save_transactions(updated.transactions(), &connection)?;
                *ledger = updated;

                Ok(1)
            }
            PersistenceMode::Remote(scope) => {
                let rows_affected = self.remote()?.delete(scope, id).await?;

                if rows_affected > 0 {
                    self.lock_ledger()?.remove(id);
                } else {
                    tracing::info!(
                        "Transaction {id} was not deleted, it may belong to another user"
                    );
                }

                Ok(rows_affected)
            }
        }
    }

    fn remote(&self) -> Result<&Arc<dyn TransactionService>, Error> {
        self.remote.as_ref().ok_or_else(|| {
            Error::RemoteServiceError("no remote transaction service is configured".to_owned())
        })
    }

    fn lock_ledger(&self) -> Result<MutexGuard<'_, Ledger>, Error> {
        self.ledger.lock().map_err(|error| {
            tracing::error!("could not acquire ledger lock: {error}");
            Error::LedgerLockError
        })
    }

    fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
    }
}

/// The state needed by handlers that read or change transactions.
#[derive(Clone)]
pub struct SyncState {
    pub sync: SyncPolicy,
    pub auth: Option<Arc<dyn AuthProvider>>,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SyncState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            sync: state.sync.clone(),
            auth: state.auth.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl SyncState {
    /// Work out where this request's reads and writes should go.
    pub fn persistence_mode(&self) -> Result<PersistenceMode, Error> {
        let household_id = {
            let connection = self.db_connection.lock().map_err(|error| {
                tracing::error!("could not acquire database lock: {error}");
                Error::DatabaseLockError
            })?;

            load_household_context(&connection)?.household_id
        };
        let session = self.auth.as_ref().and_then(|auth| auth.session());

        Ok(PersistenceMode::resolve(
            self.sync.is_remote_configured(),
            session.as_ref(),
            household_id.as_deref(),
        ))
    }
}
