//! Order and invoice status machines.
//!
//! Orders start in `processing`, reach `processed` once paid, and are then
//! driven by the fulfillment worker through `deploying` to `deployed` or
//! `failed`. Every move is forward-only and no move skips `deploying`.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::types as events;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Processing,
    Processed,
    Deploying,
    Deployed,
    Failed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Processing,
        OrderStatus::Processed,
        OrderStatus::Deploying,
        OrderStatus::Deployed,
        OrderStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "processing",
            OrderStatus::Processed => "processed",
            OrderStatus::Deploying => "deploying",
            OrderStatus::Deployed => "deployed",
            OrderStatus::Failed => "failed",
        }
    }

    /// `deployed` and `failed` are never left automatically.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Deployed | OrderStatus::Failed)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Processing, OrderStatus::Processed)
                | (OrderStatus::Processed, OrderStatus::Deploying)
                | (OrderStatus::Deploying, OrderStatus::Deployed)
                | (OrderStatus::Deploying, OrderStatus::Failed)
        )
    }

    /// Returns `next` when the edge exists.
    pub fn transition(self, next: OrderStatus) -> Result<OrderStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError::Order { from: self, to: next })
        }
    }

    /// Event emitted when an order enters this status.
    pub fn event_name(&self) -> &'static str {
        match self {
            OrderStatus::Processing => events::ORDER_CREATED,
            OrderStatus::Processed => events::ORDER_PROCESSED,
            OrderStatus::Deploying => events::ORDER_DEPLOYING,
            OrderStatus::Deployed => events::ORDER_DEPLOYED,
            OrderStatus::Failed => events::ORDER_FAILED,
        }
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
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
    Refunded,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 4] = [
        InvoiceStatus::Pending,
        InvoiceStatus::Paid,
        InvoiceStatus::Cancelled,
        InvoiceStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
            InvoiceStatus::Refunded => "refunded",
        }
    }

    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        matches!(
            (self, next),
            (InvoiceStatus::Pending, InvoiceStatus::Paid)
                | (InvoiceStatus::Pending, InvoiceStatus::Cancelled)
                | (InvoiceStatus::Pending, InvoiceStatus::Refunded)
                | (InvoiceStatus::Paid, InvoiceStatus::Refunded)
        )
    }

    pub fn transition(self, next: InvoiceStatus) -> Result<InvoiceStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError::Invoice { from: self, to: next })
        }
    }

    /// Event emitted on settlement; `pending` is only ever an initial state.
    pub fn event_name(&self) -> Option<&'static str> {
        match self {
            InvoiceStatus::Pending => None,
            InvoiceStatus::Paid => Some(events::INVOICE_PAID),
            InvoiceStatus::Cancelled => Some(events::INVOICE_CANCELLED),
            InvoiceStatus::Refunded => Some(events::INVOICE_REFUNDED),
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Order cannot move from '{from}' to '{to}'")]
    Order { from: OrderStatus, to: OrderStatus },
    #[error("Invoice cannot move from '{from}' to '{to}'")]
    Invoice { from: InvoiceStatus, to: InvoiceStatus },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown status '{0}'")]
pub struct UnknownStatus(pub String);
