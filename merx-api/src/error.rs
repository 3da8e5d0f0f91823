use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use merx_core::error::OrderError;

/// Transport-level wrapper turning engine errors into HTTP responses with
/// a stable status per error kind.
#[derive(Debug)]
pub struct AppError(pub OrderError);

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self.0 {
            OrderError::Validation(_)
            | OrderError::UnknownProduct(_)
            | OrderError::InvalidQuantity { .. } => (StatusCode::BAD_REQUEST, self.0.to_string()),
            OrderError::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            OrderError::InvalidTransition { .. } | OrderError::ConcurrentModification(_) => {
                (StatusCode::CONFLICT, self.0.to_string())
            }
            OrderError::CatalogUnavailable(_) | OrderError::PaymentUnavailable(_) => {
                tracing::warn!("Upstream unavailable: {}", self.0);
                (StatusCode::SERVICE_UNAVAILABLE, self.0.to_string())
            }
            OrderError::Persistence(msg) => {
                tracing::error!("Persistence failure: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn status_of(err: OrderError) -> StatusCode {
        AppError(err).into_response().status()
    }

    #[test]
    fn error_kinds_map_to_stable_status_codes() {
        assert_eq!(
            status_of(OrderError::Validation("empty".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(OrderError::UnknownProduct(9)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(OrderError::NotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(OrderError::InvalidTransition {
                from: "PENDING".into(),
                to: "DELIVERED".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(OrderError::ConcurrentModification(Uuid::new_v4())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(OrderError::CatalogUnavailable("timeout".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(OrderError::Persistence("pool exhausted".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
