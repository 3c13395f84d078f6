//! The hosted transaction store, shared by everyone in a household.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;

use crate::{
    Error,
    sync::RemoteScope,
    transaction::{NewTransaction, Transaction, TransactionId},
};

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("the service responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response from the service: {0}")]
    InvalidResponse(String),
}

impl From<RemoteError> for Error {
    fn from(value: RemoteError) -> Self {
        Error::RemoteServiceError(value.to_string())
    }
}

/// The operations the app needs from a remote transaction store.
#[async_trait]
pub trait TransactionService: Send + Sync {
    /// Get every transaction in the scope's household, newest first.
    async fn select_by_household(&self, scope: &RemoteScope)
    -> Result<Vec<Transaction>, RemoteError>;

    /// Store a new transaction owned by the scope's user and return the stored record.
    async fn insert(
        &self,
        scope: &RemoteScope,
        new_transaction: &NewTransaction,
    ) -> Result<Transaction, RemoteError>;

    /// Delete the transaction `id` if it is owned by the scope's user.
    ///
    /// Returns the number of records that were deleted, which is zero when
    /// the transaction belongs to someone else.
    async fn delete(&self, scope: &RemoteScope, id: &TransactionId) -> Result<usize, RemoteError>;
}

/// The row sent when inserting a transaction.
#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    user_id: &'a str,
    household_id: &'a str,
    category: &'a str,
    merchant: &'a str,
    amount: f64,
}

/// A [TransactionService] backed by the PostgREST API of a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseTransactionService {
    client: Client,
    table_url: String,
    anon_key: String,
}

impl SupabaseTransactionService {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            client: Client::new(),
            table_url: format!("{}/rest/v1/transactions", base_url.trim_end_matches('/')),
            anon_key: anon_key.to_owned(),
        }
    }
}

async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!("Transaction service returned {status}: {body}");

    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl TransactionService for SupabaseTransactionService {
    async fn select_by_household(
        &self,
        scope: &RemoteScope,
    ) -> Result<Vec<Transaction>, RemoteError> {
        let household_filter = format!("eq.{}", scope.household_id);

        let response = self
            .client
            .get(&self.table_url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&scope.access_token)
            .query(&[
                ("select", "*"),
                ("household_id", household_filter.as_str()),
                ("order", "inserted_at.desc"),
            ])
            .send()
            .await?;

        let transactions = check_status(response).await?.json().await?;

        Ok(transactions)
    }

    async fn insert(
        &self,
        scope: &RemoteScope,
        new_transaction: &NewTransaction,
    ) -> Result<Transaction, RemoteError> {
        let row = InsertRow {
            user_id: &scope.user_id,
            household_id: &scope.household_id,
            category: &new_transaction.category,
            merchant: &new_transaction.merchant,
            amount: new_transaction.amount,
        };

        let response = self
            .client
            .post(&self.table_url)
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=representation")
            .bearer_auth(&scope.access_token)
            .json(&row)
            .send()
            .await?;

        let mut inserted: Vec<Transaction> = check_status(response).await?.json().await?;

        if inserted.is_empty() {
            return Err(RemoteError::InvalidResponse(
                "the inserted transaction was not returned".to_owned(),
            ));
        }

        Ok(inserted.swap_remove(0))
    }

    async fn delete(&self, scope: &RemoteScope, id: &TransactionId) -> Result<usize, RemoteError> {
        let id_filter = format!("eq.{id}");
        let user_filter = format!("eq.{}", scope.user_id);

        let response = self
            .client
            .delete(&self.table_url)
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=representation")
            .bearer_auth(&scope.access_token)
            .query(&[("id", id_filter.as_str()), ("user_id", user_filter.as_str())])
            .send()
            .await?;

        let deleted: Vec<serde_json::Value> = check_status(response).await?.json().await?;

        Ok(deleted.len())
    }
}
