//! # Portal Core Orders
//!
//! The order and invoice status machines and the [`OrderManager`] that
//! creates orders from user submissions and settles invoices.
//!
//! An order is created in `processing`, becomes `processed` once its invoice
//! is paid, and is then picked up by the fulfillment worker.
pub mod error;
pub mod manager;
pub mod state;

pub use error::OrderError;
pub use manager::{OrderDetails, OrderManager, SubmittedFields};
pub use state::{InvoiceStatus, OrderStatus, TransitionError};

// Test module declaration
#[cfg(test)]
mod tests;
