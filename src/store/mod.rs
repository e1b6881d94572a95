pub mod memory;
pub mod postgrest;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;

/// Name of the remote table holding expense rows.
pub const EXPENSES_TABLE: &str = "expenses";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid store URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid credential header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode store response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A stored expense row as returned by the list query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub date: String,
    #[serde(deserialize_with = "de_amount")]
    pub amount: f64,
    pub category: String,
    #[serde(default, deserialize_with = "de_text")]
    pub subcategory: String,
    #[serde(default, deserialize_with = "de_text")]
    pub note: String,
}

/// Row payload for an insert. The id is always assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewExpense {
    pub date: String,
    pub amount: f64,
    pub category: String,
    pub subcategory: String,
    pub note: String,
}

/// Projection used by the summarize query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryAmount {
    pub category: String,
    #[serde(deserialize_with = "de_amount")]
    pub amount: f64,
}

/// What the store handed back for an insert: the returned rows plus the raw
/// response text for diagnostics.
#[derive(Debug, Clone)]
pub struct InsertResponse {
    pub rows: Vec<Value>,
    pub raw: String,
}

/// The remote expenses table. One shared instance serves every tool call.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn insert(&self, expense: &NewExpense) -> Result<InsertResponse, StoreError>;

    /// Rows with `start_date <= date <= end_date`, ascending by id.
    async fn select_range(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<Expense>, StoreError>;

    /// Category and amount of rows in the date range, optionally restricted
    /// to one category.
    async fn select_amounts(
        &self,
        start_date: &str,
        end_date: &str,
        category: Option<&str>,
    ) -> Result<Vec<CategoryAmount>, StoreError>;
}

/// Accepts a JSON number or a numeric string.
pub(crate) fn de_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid amount '{}': {}", s, e))),
    }
}

// Nullable text columns come back as null.
fn de_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expense_accepts_string_amount_and_null_text() {
        let expense: Expense = serde_json::from_value(json!({
            "id": 7,
            "date": "2024-03-01",
            "amount": "12.50",
            "category": "food",
            "subcategory": null,
        }))
        .unwrap();

        assert_eq!(expense.amount, 12.5);
        assert_eq!(expense.subcategory, "");
        assert_eq!(expense.note, "");
    }

    #[test]
    fn test_category_amount_accepts_integer_amount() {
        let row: CategoryAmount =
            serde_json::from_value(json!({"category": "transport", "amount": 20})).unwrap();
        assert_eq!(row.amount, 20.0);
    }

    #[test]
    fn test_amount_rejects_garbage() {
        let result: Result<CategoryAmount, _> =
            serde_json::from_value(json!({"category": "food", "amount": "lots"}));
        assert!(result.is_err());
    }
}
