//! The three expense operations exposed as tools.
//!
//! Each operation is one round trip to the [`ExpenseStore`]; nothing is kept
//! locally between calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::store::{CategoryAmount, Expense, ExpenseStore, NewExpense, StoreError, de_amount};

#[derive(Debug, Clone, Deserialize)]
pub struct AddExpenseParams {
    pub date: String,
    #[serde(deserialize_with = "de_amount")]
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateRangeParams {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummarizeParams {
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AddExpenseResult {
    Ok { id: i64 },
    Error { message: String, raw: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total_amount: f64,
}

pub async fn add_expense(
    store: &dyn ExpenseStore,
    params: AddExpenseParams,
) -> Result<AddExpenseResult, StoreError> {
    let expense = NewExpense {
        date: params.date,
        amount: params.amount,
        category: params.category,
        subcategory: params.subcategory,
        note: params.note,
    };

    let response = store.insert(&expense).await?;

    match response.rows.first().and_then(|row| row.get("id")).and_then(Value::as_i64) {
        Some(id) => {
            debug!("Inserted expense {}", id);
            Ok(AddExpenseResult::Ok { id })
        }
        None => {
            warn!("Insert returned no row: {}", response.raw);
            Ok(AddExpenseResult::Error {
                message: "Insert failed".to_string(),
                raw: response.raw,
            })
        }
    }
}

pub async fn list_expenses(
    store: &dyn ExpenseStore,
    params: DateRangeParams,
) -> Result<Vec<Expense>, StoreError> {
    store
        .select_range(&params.start_date, &params.end_date)
        .await
}

pub async fn summarize(
    store: &dyn ExpenseStore,
    params: SummarizeParams,
) -> Result<Vec<CategoryTotal>, StoreError> {
    // An empty filter string means no filter.
    let category = params.category.as_deref().filter(|c| !c.is_empty());

    let rows = store
        .select_amounts(&params.start_date, &params.end_date, category)
        .await?;

    Ok(summarize_rows(&rows))
}

/// Fold rows into per-category totals, sorted by category name.
pub fn summarize_rows(rows: &[CategoryAmount]) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.category.as_str()).or_insert(0.0) += row.amount;
    }

    totals
        .into_iter()
        .map(|(category, total_amount)| CategoryTotal {
            category: category.to_string(),
            total_amount,
        })
        .collect()
}
