use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrderResult;

/// One priced line as the payment provider expects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLineItem {
    pub name: String,
    pub price: i64,
    pub quantity: i32,
}

/// Remote-call boundary to the payment provider.
///
/// Creating a session never mutates order state: settlement is confirmed
/// asynchronously through the payment webhook, not from this call.
#[async_trait]
pub trait PaymentSessionClient: Send + Sync {
    /// Obtain an opaque checkout session reference for a priced order.
    async fn create_session(
        &self,
        order_id: Uuid,
        currency: &str,
        items: Vec<SessionLineItem>,
    ) -> OrderResult<String>;
}
