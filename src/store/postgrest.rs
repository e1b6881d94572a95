use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{
    CategoryAmount, EXPENSES_TABLE, Expense, ExpenseStore, InsertResponse, NewExpense, StoreError,
};
use crate::config::Config;

const LIST_COLUMNS: &str = "id,date,amount,category,subcategory,note";
const SUMMARY_COLUMNS: &str = "category,amount";

/// Expenses table reached through the Supabase PostgREST endpoint.
pub struct PostgrestStore {
    client: Client,
    endpoint: Url,
}

impl PostgrestStore {
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let endpoint = Url::parse(&format!(
            "{}/rest/v1/{}",
            config.supabase_url.trim_end_matches('/'),
            EXPENSES_TABLE
        ))?;

        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(&config.service_role_key)?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_role_key))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn fetch<T: DeserializeOwned>(&self, params: &[(&str, String)]) -> Result<Vec<T>, StoreError> {
        let mut url = self.endpoint.clone();
        {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in params {
                query_pairs.append_pair(key, value);
            }
        }

        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn range_params(start_date: &str, end_date: &str) -> [(&'static str, String); 2] {
    [
        ("date", format!("gte.{}", start_date)),
        ("date", format!("lte.{}", end_date)),
    ]
}

#[async_trait]
impl ExpenseStore for PostgrestStore {
    async fn insert(&self, expense: &NewExpense) -> Result<InsertResponse, StoreError> {
        debug!("POST {}", self.endpoint);
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Prefer", "return=representation")
            .json(expense)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rows = match serde_json::from_str::<Value>(&body) {
            Ok(Value::Array(rows)) => rows,
            _ => Vec::new(),
        };

        Ok(InsertResponse {
            rows,
            raw: format!("status={} body={}", status.as_u16(), body),
        })
    }

    async fn select_range(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<Expense>, StoreError> {
        let mut params = vec![("select", LIST_COLUMNS.to_string())];
        params.extend(range_params(start_date, end_date));
        params.push(("order", "id.asc".to_string()));

        self.fetch(&params).await
    }

    async fn select_amounts(
        &self,
        start_date: &str,
        end_date: &str,
        category: Option<&str>,
    ) -> Result<Vec<CategoryAmount>, StoreError> {
        let mut params = vec![("select", SUMMARY_COLUMNS.to_string())];
        params.extend(range_params(start_date, end_date));
        if let Some(category) = category {
            params.push(("category", format!("eq.{}", category)));
        }

        self.fetch(&params).await
    }
}
