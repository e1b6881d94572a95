use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{CategoryAmount, Expense, ExpenseStore, InsertResponse, NewExpense, StoreError};

/// In-process stand-in for the remote table. Filters with the same string
/// comparison the remote store applies to `date`.
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<Expense>>,
    reject_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent inserts come back with no rows.
    pub fn reject_inserts(&self, reject: bool) {
        self.reject_inserts.store(reject, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

fn in_range(date: &str, start_date: &str, end_date: &str) -> bool {
    date >= start_date && date <= end_date
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn insert(&self, expense: &NewExpense) -> Result<InsertResponse, StoreError> {
        if self.reject_inserts.load(Ordering::SeqCst) {
            return Ok(InsertResponse {
                rows: Vec::new(),
                raw: "data=[]".to_string(),
            });
        }

        let mut rows = self.rows.write().await;
        let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let stored = Expense {
            id,
            date: expense.date.clone(),
            amount: expense.amount,
            category: expense.category.clone(),
            subcategory: expense.subcategory.clone(),
            note: expense.note.clone(),
        };
        rows.push(stored.clone());

        let row = json!(stored);
        Ok(InsertResponse {
            raw: format!("data=[{}]", row),
            rows: vec![row],
        })
    }

    async fn select_range(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<Expense>, StoreError> {
        let rows = self.rows.read().await;
        let mut matched: Vec<Expense> = rows
            .iter()
            .filter(|r| in_range(&r.date, start_date, end_date))
            .cloned()
            .collect();
        matched.sort_by_key(|r| r.id);
        Ok(matched)
    }

    async fn select_amounts(
        &self,
        start_date: &str,
        end_date: &str,
        category: Option<&str>,
    ) -> Result<Vec<CategoryAmount>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|r| in_range(&r.date, start_date, end_date))
            .filter(|r| category.is_none_or(|c| r.category == c))
            .map(|r| CategoryAmount {
                category: r.category.clone(),
                amount: r.amount,
            })
            .collect())
    }
}
