//! Order Lifecycle
//!
//! ```text
//! pending -> awaiting_payment -> processing -> shipped -> completed
//!    |              |
//!    +--------------+--> cancelled
//! ```
//!
//! `completed` and `cancelled` are terminal. Any move not drawn above fails with
//! [`LifecycleError::InvalidTransition`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use thiserror::Error;

/// Errors raised by the order lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// The requested status change is not in the transition table.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: OrderStatus,

        /// Requested status
        to: OrderStatus,
    },

    /// Payment can only be started while the order awaits payment.
    #[error("payment is not available while the order is {0}")]
    PaymentUnavailable(OrderStatus),

    /// Payment needs a carrier and a shipping cost.
    #[error("no shipping method selected")]
    ShippingNotSelected,

    /// Shipping can no longer be changed once the order is being processed.
    #[error("shipping cannot be changed while the order is {0}")]
    ShippingLocked(OrderStatus),

    /// A status string from the data API did not match any status.
    #[error("unknown order status {0:?}")]
    UnknownStatus(String),
}

/// Order status
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, not yet confirmed for payment
    Pending,

    /// Confirmed, waiting for the customer to pay
    AwaitingPayment,

    /// Paid, being prepared by the store
    Processing,

    /// Handed to the carrier
    Shipped,

    /// Received by the customer
    Completed,

    /// Cancelled before payment
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 6] = [
        Self::Pending,
        Self::AwaitingPayment,
        Self::Processing,
        Self::Shipped,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Statuses reachable in one step.
    pub fn allowed_next(self) -> SmallVec<[OrderStatus; 2]> {
        match self {
            Self::Pending => smallvec![Self::AwaitingPayment, Self::Cancelled],
            Self::AwaitingPayment => smallvec![Self::Processing, Self::Cancelled],
            Self::Processing => smallvec![Self::Shipped],
            Self::Shipped => smallvec![Self::Completed],
            Self::Completed | Self::Cancelled => SmallVec::new(),
        }
    }

    /// Whether `next` is reachable in one step.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Validate a move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] if `next` is not reachable in one step.
    pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus, LifecycleError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(LifecycleError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Whether the action is legal in this status.
    pub fn permits(self, action: OrderAction) -> bool {
        self.can_transition_to(action.target())
    }

    /// No transition leaves a terminal status.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Wire name used by the data API.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AwaitingPayment => "awaiting_payment",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| LifecycleError::UnknownStatus(s.to_string()))
    }
}

/// Customer or admin action that moves an order along.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    /// Confirm the order and ask for payment
    RequestPayment,

    /// Record a successful payment
    Pay,

    /// Hand the order to the carrier
    Ship,

    /// Confirm delivery
    Complete,

    /// Cancel the order
    Cancel,
}

impl OrderAction {
    /// Every action.
    pub const ALL: [OrderAction; 5] = [
        Self::RequestPayment,
        Self::Pay,
        Self::Ship,
        Self::Complete,
        Self::Cancel,
    ];

    /// Status the action moves an order to.
    pub const fn target(self) -> OrderStatus {
        match self {
            Self::RequestPayment => OrderStatus::AwaitingPayment,
            Self::Pay => OrderStatus::Processing,
            Self::Ship => OrderStatus::Shipped,
            Self::Complete => OrderStatus::Completed,
            Self::Cancel => OrderStatus::Cancelled,
        }
    }
}
