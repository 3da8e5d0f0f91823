use uuid::Uuid;

/// Error taxonomy shared by every layer of the order engine.
///
/// Each variant is a stable kind the transport layer can map onto its own
/// status codes. Transient upstream failures (`CatalogUnavailable`,
/// `PaymentUnavailable`, `ConcurrentModification`) are safe for the caller
/// to retry; the rest are not.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Product {0} is not in the catalog or is unavailable")]
    UnknownProduct(i64),

    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: i64, quantity: i32 },

    #[error("Product catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Payment provider unavailable: {0}")]
    PaymentUnavailable(String),

    #[error("Order {0} not found")]
    NotFound(Uuid),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Order {0} was modified concurrently, re-read and retry")]
    ConcurrentModification(Uuid),

    #[error("Persistence failure: {0}")]
    Persistence(String),
}

pub type OrderResult<T> = Result<T, OrderError>;
