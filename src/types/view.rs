//! Transport-side read models
//!
//! Views are what the service hands back to callers. Unlike the entities in
//! [`super::transaction`], every identifier and server-stamped field is
//! required: a view is only ever produced from a persisted row.

use super::transaction::{DescriptionId, PaymentMethodId, Status, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Projection of a persisted [`Description`](super::Description)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionView {
    pub id: DescriptionId,
    pub value: Decimal,
    pub establishment: String,
    pub merchant_code: String,
    pub nsu: String,
    pub authorization_code: String,
    pub status: Status,
}

/// Projection of a persisted [`PaymentMethod`](super::PaymentMethod)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodView {
    pub id: PaymentMethodId,
    pub payment_type: String,
    pub instalments: u32,
}

/// Projection of a persisted [`Transaction`](super::Transaction)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: TransactionId,
    pub description: DescriptionView,
    pub payment_method: PaymentMethodView,
}

impl TransactionView {
    /// Current authorization state
    pub fn status(&self) -> Status {
        self.description.status
    }
}
