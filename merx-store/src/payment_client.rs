use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use merx_core::error::{OrderError, OrderResult};
use merx_core::payment::{PaymentSessionClient, SessionLineItem};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest<'a> {
    order_id: Uuid,
    currency: &'a str,
    items: Vec<SessionLineItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    session_reference: String,
}

/// HTTP implementation of the payment session boundary. Transport failures
/// and timeouts surface as `PaymentUnavailable`.
pub struct HttpPaymentSessionClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPaymentSessionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PaymentSessionClient for HttpPaymentSessionClient {
    async fn create_session(
        &self,
        order_id: Uuid,
        currency: &str,
        items: Vec<SessionLineItem>,
    ) -> OrderResult<String> {
        let url = format!("{}/payments/sessions", self.base_url);
        let request = CreateSessionRequest {
            order_id,
            currency,
            items,
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| OrderError::PaymentUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| OrderError::PaymentUnavailable(e.to_string()))?;

        let body: CreateSessionResponse = response
            .json()
            .await
            .map_err(|e| OrderError::PaymentUnavailable(format!("malformed session response: {e}")))?;

        Ok(body.session_reference)
    }
}
