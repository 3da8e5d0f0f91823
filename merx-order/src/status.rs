//! Pure decision function for order status transitions.
//!
//! Allowed edges: PENDING → PAID, PENDING → CANCELLED, PAID → DELIVERED,
//! PAID → CANCELLED. DELIVERED and CANCELLED are terminal. Requesting the
//! status the order already has is an idempotent no-op, not an error, so a
//! retried status-change request stays safe.

use merx_core::error::{OrderError, OrderResult};

use crate::models::OrderStatus;

/// Outcome of a transition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Target equals current; nothing to write.
    Unchanged,
    /// A legal edge; the caller should apply the new status.
    Apply,
}

/// True only for edges in the allowed graph. Same-status is not an edge.
pub fn can_transition(current: OrderStatus, target: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (current, target),
        (Pending, Paid) | (Pending, Cancelled) | (Paid, Delivered) | (Paid, Cancelled)
    )
}

/// Validate a requested transition.
pub fn check_transition(current: OrderStatus, target: OrderStatus) -> OrderResult<Transition> {
    if current == target {
        return Ok(Transition::Unchanged);
    }
    if can_transition(current, target) {
        return Ok(Transition::Apply);
    }
    Err(OrderError::InvalidTransition {
        from: current.to_string(),
        to: target.to_string(),
    })
}
