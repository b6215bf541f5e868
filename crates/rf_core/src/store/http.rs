//! PostgREST-style HTTP job store client.
//!
//! Wire contract:
//! - Claim-candidate: `GET {base}/{table}?status=eq.queued&
//!   order=created_at.asc&limit=1&select=*`
//! - Conditional claim: `PATCH {base}/{table}?id=eq.{id}&status=eq.queued`
//!   with `Prefer: return=representation`; an empty result set means the
//!   claim was lost.
//! - Update: `PATCH {base}/{table}?id=eq.{id}` with a partial body.
//!
//! Store calls are short and carry a bounded timeout; engine calls are
//! the long-running ones and are not time-boxed here.

use std::time::Duration;

use crate::config::StoreSettings;
use crate::models::{JobRecord, JobUpdate};

use super::{JobStore, StoreError, StoreResult};

/// Blocking HTTP client for the remote job store.
#[derive(Debug)]
pub struct HttpJobStore {
    base_url: String,
    table: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl HttpJobStore {
    /// Build a client from store settings (with environment overrides
    /// applied for the URL and service key).
    pub fn from_settings(settings: &StoreSettings) -> StoreResult<Self> {
        let base_url = settings.resolved_url().ok_or_else(|| {
            StoreError::NotConfigured("set store.url or RF_STORE_URL".to_string())
        })?;
        let api_key = settings.resolved_api_key().ok_or_else(|| {
            StoreError::NotConfigured("set store.api_key or RF_SERVICE_KEY".to_string())
        })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            table: settings.table.clone(),
            api_key,
            client,
        })
    }

    fn table_url(&self, query: &str) -> String {
        format!("{}/rest/v1/{}?{}", self.base_url, self.table, query)
    }

    fn check_status(response: reqwest::blocking::Response) -> StoreResult<reqwest::blocking::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StoreError::Failed {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

impl JobStore for HttpJobStore {
    fn fetch_candidate(&self) -> StoreResult<Option<JobRecord>> {
        let url = self.table_url("status=eq.queued&order=created_at.asc&limit=1&select=*");
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .send()?;
        let response = Self::check_status(response)?;

        let mut jobs: Vec<JobRecord> = response.json()?;
        Ok(if jobs.is_empty() {
            None
        } else {
            Some(jobs.remove(0))
        })
    }

    fn try_claim(&self, job_id: &str) -> StoreResult<bool> {
        // The status filter makes this a conditional update: the store
        // only transitions rows that are still queued, and the returned
        // representation tells us whether we won.
        let url = self.table_url(&format!("id=eq.{}&status=eq.queued", job_id));
        let response = self
            .client
            .patch(&url)
            .header("apikey", &self.api_key)
            .header("Prefer", "return=representation")
            .json(&JobUpdate::processing())
            .send()?;
        let response = Self::check_status(response)?;

        let claimed: Vec<JobRecord> = response.json()?;
        Ok(!claimed.is_empty())
    }

    fn update(&self, job_id: &str, update: &JobUpdate) -> StoreResult<()> {
        let url = self.table_url(&format!("id=eq.{}", job_id));
        let response = self
            .client
            .patch(&url)
            .header("apikey", &self.api_key)
            .json(update)
            .send()?;
        Self::check_status(response)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str) -> StoreSettings {
        StoreSettings {
            url: url.to_string(),
            api_key: "test-key".to_string(),
            ..StoreSettings::default()
        }
    }

    #[test]
    fn builds_table_urls() {
        let store = HttpJobStore::from_settings(&settings("https://store.example.com/")).unwrap();
        assert_eq!(
            store.table_url("id=eq.job-1"),
            "https://store.example.com/rest/v1/render_jobs?id=eq.job-1"
        );
    }

    #[test]
    fn missing_url_is_not_configured() {
        let mut s = settings("");
        s.api_key = "key".to_string();
        // Guard against an ambient override leaking into the test.
        if std::env::var("RF_STORE_URL").is_err() {
            let err = HttpJobStore::from_settings(&s).unwrap_err();
            assert!(matches!(err, StoreError::NotConfigured(_)));
        }
    }
}
