//! In-memory transaction services for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    sync::{RemoteError, RemoteScope, TransactionService},
    transaction::{NewTransaction, Transaction, TransactionId},
};

/// Behaves like the hosted store: records are scoped to a household and can
/// only be deleted by their owner.
#[derive(Debug, Default)]
pub(crate) struct FakeTransactionService {
    rows: Mutex<Vec<Transaction>>,
}

impl FakeTransactionService {
    /// Add a record as if `user_id` had created it earlier.
    pub(crate) fn seed(
        &self,
        user_id: &str,
        household_id: &str,
        amount: f64,
        category: &str,
        merchant: &str,
    ) -> Transaction {
        let mut rows = self.rows.lock().unwrap();
        let transaction = Transaction {
            id: TransactionId::new((rows.len() + 1).to_string()),
            amount,
            category: category.to_owned(),
            merchant: merchant.to_owned(),
            inserted_at: Some(format!("2025-03-{:02}T10:00:00+00:00", rows.len() + 1)),
            household_id: Some(household_id.to_owned()),
            user_id: Some(user_id.to_owned()),
        };
        rows.insert(0, transaction.clone());

        transaction
    }
}

#[async_trait]
impl TransactionService for FakeTransactionService {
    async fn select_by_household(
        &self,
        scope: &RemoteScope,
    ) -> Result<Vec<Transaction>, RemoteError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.household_id.as_deref() == Some(scope.household_id.as_str()))
            .cloned()
            .collect())
    }

    async fn insert(
        &self,
        scope: &RemoteScope,
        new_transaction: &NewTransaction,
    ) -> Result<Transaction, RemoteError> {
        let mut rows = self.rows.lock().unwrap();
        let transaction = Transaction {
            id: TransactionId::new((rows.len() + 1).to_string()),
            amount: new_transaction.amount,
            category: new_transaction.category.clone(),
            merchant: new_transaction.merchant.clone(),
            inserted_at: Some("2025-04-01T10:00:00+00:00".to_owned()),
            household_id: Some(scope.household_id.clone()),
            user_id: Some(scope.user_id.clone()),
        };
        rows.insert(0, transaction.clone());

        Ok(transaction)
    }

    async fn delete(&self, scope: &RemoteScope, id: &TransactionId) -> Result<usize, RemoteError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| !(&row.id == id && row.user_id.as_deref() == Some(scope.user_id.as_str())));

        Ok(before - rows.len())
    }
}

/// Fails every request as if the service were unreachable.
#[derive(Debug, Default)]
pub(crate) struct FailingTransactionService;

#[async_trait]
impl TransactionService for FailingTransactionService {
    async fn select_by_household(
        &self,
        _scope: &RemoteScope,
    ) -> Result<Vec<Transaction>, RemoteError> {
        Err(RemoteError::InvalidResponse("service unavailable".to_owned()))
    }

    async fn insert(
        &self,
        _scope: &RemoteScope,
        _new_transaction: &NewTransaction,
    ) -> Result<Transaction, RemoteError> {
        Err(RemoteError::InvalidResponse("service unavailable".to_owned()))
    }

    async fn delete(
        &self,
        _scope: &RemoteScope,
        _id: &TransactionId,
    ) -> Result<usize, RemoteError> {
        Err(RemoteError::InvalidResponse("service unavailable".to_owned()))
    }
}
