//! Org API seam and its REST implementation
//!
//! The exporter only needs three capabilities from the source org: describe an
//! object, run a query, and run a count query. [`OrgApi`] captures exactly that
//! so the pipeline can run against the live REST API or an in-memory fake.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::header::ACCEPT;
use serde_json::Value;

use super::metadata::{ObjectSchema, parse_describe};
use super::models::Session;
use super::query::{Query, QueryResult};
use super::resilience::{ResilienceConfig, RetryPolicy};

/// Capabilities the exporter consumes from the source org
#[async_trait]
pub trait OrgApi: Send + Sync {
    /// Fetch the describe result for one object
    async fn describe(&self, object: &str) -> Result<ObjectSchema>;

    /// Run a select query, following result pages
    async fn query(&self, query: &Query) -> Result<QueryResult>;

    /// Run a `SELECT COUNT()` query and return the matching row count
    async fn count(&self, query: &Query) -> Result<u64>;
}

/// [`OrgApi`] over the REST API, authenticated with a bearer token
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    session: Session,
    retry: RetryPolicy,
}

impl RestClient {
    pub fn new(session: Session, resilience: &ResilienceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(resilience.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            session,
            retry: RetryPolicy::new(resilience.retry.clone()),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn get_json(&self, url: &str, operation: &str) -> Result<Value> {
        let http = &self.http;
        let token = self.session.access_token.as_str();

        debug!("GET {}", url);
        let body = self
            .retry
            .execute(operation, || async move {
                http.get(url)
                    .bearer_auth(token)
                    .header(ACCEPT, "application/json")
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<Value>()
                    .await
            })
            .await
            .with_context(|| format!("{} failed", operation))?;

        Ok(body)
    }

    async fn run_query(&self, query: &Query) -> Result<QueryResult> {
        let soql = query.to_soql();
        let url = format!(
            "{}/query?q={}",
            self.session.data_url(),
            urlencoding::encode(&soql)
        );
        let operation = format!("query {}", query.object);

        let body = self.get_json(&url, &operation).await?;
        let mut result: QueryResult = serde_json::from_value(body)
            .with_context(|| format!("Unexpected query response for {}", query.object))?;

        while result.has_more() {
            let Some(next) = result.next_records_url.clone() else {
                break;
            };
            let url = format!("{}{}", self.session.instance_url, next);
            let body = self.get_json(&url, &operation).await?;
            let page: QueryResult = serde_json::from_value(body)
                .with_context(|| format!("Unexpected query page for {}", query.object))?;
            result.absorb(page);
        }

        Ok(result)
    }
}

#[async_trait]
impl OrgApi for RestClient {
    async fn describe(&self, object: &str) -> Result<ObjectSchema> {
        let url = format!(
            "{}/sobjects/{}/describe",
            self.session.data_url(),
            urlencoding::encode(object)
        );
        let body = self.get_json(&url, &format!("describe {}", object)).await?;
        parse_describe(body)
    }

    async fn query(&self, query: &Query) -> Result<QueryResult> {
        self.run_query(query).await
    }

    async fn count(&self, query: &Query) -> Result<u64> {
        if !query.is_count() {
            anyhow::bail!("count() called with a select query: {}", query);
        }
        Ok(self.run_query(query).await?.total_size)
    }
}
