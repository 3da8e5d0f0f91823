use std::time::Duration;

use async_trait::async_trait;

use merx_core::catalog::{CatalogProduct, ProductCatalogClient};
use merx_core::error::{OrderError, OrderResult};

/// HTTP implementation of the catalog boundary.
///
/// Posts the deduplicated id set to the catalog service and gets back the
/// products it recognizes. Every transport-level failure, including the
/// client-side timeout, surfaces as `CatalogUnavailable`; no retries happen
/// here.
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProductCatalogClient for HttpCatalogClient {
    async fn validate(&self, ids: &[i64]) -> OrderResult<Vec<CatalogProduct>> {
        let url = format!("{}/products/validate", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(&ids)
            .send()
            .await
            .map_err(|e| OrderError::CatalogUnavailable(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| OrderError::CatalogUnavailable(e.to_string()))?;

        response
            .json::<Vec<CatalogProduct>>()
            .await
            .map_err(|e| OrderError::CatalogUnavailable(format!("malformed catalog response: {e}")))
    }
}
