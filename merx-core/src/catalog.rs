use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OrderResult;

/// A product as the external catalog service reports it.
///
/// Read-only to this engine; `price` is in minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub available: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Remote-call boundary to the product catalog service.
///
/// `validate` may omit ids the catalog does not recognize; callers must
/// treat any missing id as invalid. No retries happen here; a transport
/// failure or timeout surfaces as `OrderError::CatalogUnavailable` and the
/// retry decision belongs to the caller.
#[async_trait]
pub trait ProductCatalogClient: Send + Sync {
    async fn validate(&self, ids: &[i64]) -> OrderResult<Vec<CatalogProduct>>;
}
