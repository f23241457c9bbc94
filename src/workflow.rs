use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Lifecycle of an order. Created as `Pending`, moves forward through
/// `Processing` and `Shipped` to `Delivered`, or diverts to `Cancelled`
/// from any non-terminal state. `Delivered` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Status assigned at order creation, regardless of client input.
    pub const INITIAL: OrderStatus = OrderStatus::Pending;

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        legal_next_states(*self).is_empty()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

/// The transition table. Terminal states return an empty slice.
pub fn legal_next_states(current: OrderStatus) -> &'static [OrderStatus] {
    match current {
        OrderStatus::Pending => &[OrderStatus::Processing, OrderStatus::Cancelled],
        OrderStatus::Processing => &[OrderStatus::Shipped, OrderStatus::Cancelled],
        OrderStatus::Shipped => &[OrderStatus::Delivered, OrderStatus::Cancelled],
        OrderStatus::Delivered => &[],
        OrderStatus::Cancelled => &[],
    }
}

/// Rejects anything not in the transition table. Enforced on every
/// mutating path, including the admin escape hatch.
pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> Result<(), AppError> {
    if legal_next_states(from).contains(&to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_moves_to_processing_or_cancelled() {
        assert_eq!(
            legal_next_states(OrderStatus::Pending),
            &[OrderStatus::Processing, OrderStatus::Cancelled][..]
        );
    }

    #[test]
    fn terminal_states_have_no_outgoing_transitions() {
        assert!(legal_next_states(OrderStatus::Delivered).is_empty());
        assert!(legal_next_states(OrderStatus::Cancelled).is_empty());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn forward_chain_is_legal() {
        assert!(validate_transition(OrderStatus::Pending, OrderStatus::Processing).is_ok());
        assert!(validate_transition(OrderStatus::Processing, OrderStatus::Shipped).is_ok());
        assert!(validate_transition(OrderStatus::Shipped, OrderStatus::Delivered).is_ok());
    }

    #[test]
    fn cancel_is_legal_from_any_non_terminal_state() {
        for from in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ] {
            assert!(validate_transition(from, OrderStatus::Cancelled).is_ok());
        }
    }

    #[test]
    fn skipping_ahead_is_rejected() {
        let err = validate_transition(OrderStatus::Pending, OrderStatus::Delivered).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("pending"), "message should name current status: {msg}");
        assert!(msg.contains("delivered"), "message should name requested status: {msg}");
    }

    #[test]
    fn leaving_a_terminal_state_is_rejected() {
        assert!(validate_transition(OrderStatus::Delivered, OrderStatus::Processing).is_err());
        assert!(validate_transition(OrderStatus::Cancelled, OrderStatus::Pending).is_err());
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("paid".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn initial_status_is_pending() {
        assert_eq!(OrderStatus::INITIAL, OrderStatus::Pending);
    }
}
