//! Defines the core data models for transactions.

use std::fmt::Display;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::OffsetDateTime;

// ============================================================================
// MODELS
// ============================================================================

/// The category given to expenses that were submitted without one.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// The category given to income that was submitted without an income kind.
pub const INCOME_LABEL: &str = "Income";

/// The opaque, stable identifier of a [Transaction].
///
/// Locally created transactions get an ID made from the creation time and a
/// random suffix. Remote transactions use whatever the transaction service
/// assigned, which may be a number or a string in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionId(String);

impl TransactionId {
    /// Create an ID from an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new ID for a transaction that only exists on this device.
    pub fn generate_local() -> Self {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let suffix: u16 = rand::thread_rng().gen_range(0..10_000);

        Self(format!("{millis}-{suffix:04}"))
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for TransactionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        })
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money earned (positive) or spent (negative).
    pub amount: f64,
    /// The display label used to group the transaction.
    pub category: String,
    /// Where the money was spent. Always empty for income.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub merchant: String,
    /// When the transaction was created, if the store records it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inserted_at: Option<String>,
    /// The household the transaction is shared with (remote records only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub household_id: Option<String>,
    /// The user that created the transaction (remote records only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Transaction {
    /// Create a transaction that only exists on this device from `new_transaction`.
    pub fn new_local(new_transaction: NewTransaction) -> Self {
        Self {
            id: TransactionId::generate_local(),
            amount: new_transaction.amount,
            category: new_transaction.category,
            merchant: new_transaction.merchant,
            inserted_at: None,
            household_id: None,
            user_id: None,
        }
    }

    /// The transaction that is shown when there is no usable saved data.
    pub fn seed() -> Self {
        Self {
            id: TransactionId::generate_local(),
            amount: 1200.0,
            category: INCOME_LABEL.to_owned(),
            merchant: "Salary".to_owned(),
            inserted_at: None,
            household_id: None,
            user_id: None,
        }
    }

    /// Whether the transaction is income (including zero amounts).
    pub fn is_income(&self) -> bool {
        self.amount >= 0.0
    }

    /// The text to display as the main label of the transaction.
    pub fn title(&self) -> &str {
        if self.merchant.is_empty() {
            &self.category
        } else {
            &self.merchant
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// The validated data for a transaction that has not been stored yet.
///
/// The sign of `amount` encodes whether it is income or an expense.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    /// The display label used to group the transaction.
    pub category: String,
    /// Where the money was spent, may be empty.
    pub merchant: String,
    /// The signed amount of the transaction.
    pub amount: f64,
}

impl NewTransaction {
    /// Create an expense. The amount is always stored as a negative number.
    pub fn expense(amount: f64, category: &str, merchant: &str) -> Self {
        let category = if category.is_empty() {
            UNCATEGORIZED_LABEL
        } else {
            category
        };

        Self {
            category: category.to_owned(),
            merchant: merchant.to_owned(),
            amount: -amount.abs(),
        }
    }

    /// Create an income. The amount is always stored as a positive number.
    pub fn income(amount: f64, income_kind: &str) -> Self {
        let category = if income_kind.is_empty() {
            INCOME_LABEL
        } else {
            income_kind
        };

        Self {
            category: category.to_owned(),
            merchant: String::new(),
            amount: amount.abs(),
        }
    }
}
