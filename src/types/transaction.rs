//! Persistence-side entities for the payment transaction service
//!
//! A [`Transaction`] owns exactly one [`Description`] and references one
//! [`PaymentMethod`]. Identifiers and the server-stamped fields are optional
//! here because the same shapes carry prospective payments (nothing assigned
//! yet) and persisted rows (everything assigned).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transaction identifier, assigned by the store on insert
pub type TransactionId = u64;

/// Description identifier, assigned by the store on insert
pub type DescriptionId = u64;

/// Payment method identifier, assigned by the store on insert
pub type PaymentMethodId = u64;

/// Authorization state of a transaction's description
///
/// A persisted transaction is always in one of these two states. `pay`
/// always lands in `Authorized`; `reverse` moves it to `Denied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Payment accepted by the authorizer
    Authorized,

    /// Payment reversed (voided)
    Denied,
}

impl Status {
    /// Upper-case wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Authorized => "AUTHORIZED",
            Status::Denied => "DENIED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AUTHORIZED" => Ok(Status::Authorized),
            "DENIED" => Ok(Status::Denied),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Payment details owned by a transaction
///
/// `value`, `establishment` and `merchant_code` are carried through the
/// service unchanged. `nsu`, `authorization_code` and `status` are
/// server-owned: absent on a prospective payment, always present once
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    /// Store-assigned identifier
    pub id: Option<DescriptionId>,

    /// Payment amount
    pub value: Decimal,

    /// Name of the establishment that took the payment
    pub establishment: String,

    /// Merchant code of the establishment
    pub merchant_code: String,

    /// Network sequence number stamped on authorization
    pub nsu: Option<String>,

    /// Authorization code stamped on authorization
    pub authorization_code: Option<String>,

    /// Current authorization state
    pub status: Option<Status>,
}

impl Description {
    /// Create a description for a prospective payment
    ///
    /// All server-owned fields start out absent.
    pub fn new(
        value: Decimal,
        establishment: impl Into<String>,
        merchant_code: impl Into<String>,
    ) -> Self {
        Description {
            id: None,
            value,
            establishment: establishment.into(),
            merchant_code: merchant_code.into(),
            nsu: None,
            authorization_code: None,
            status: None,
        }
    }
}

/// How a transaction was paid
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentMethod {
    /// Store-assigned identifier
    pub id: Option<PaymentMethodId>,

    /// Payment type as supplied by the caller (e.g. `DEBITO`)
    pub payment_type: String,

    /// Number of instalments
    pub instalments: u32,
}

impl PaymentMethod {
    /// Create a payment method that has not been persisted yet
    pub fn new(payment_type: impl Into<String>, instalments: u32) -> Self {
        PaymentMethod {
            id: None,
            payment_type: payment_type.into(),
            instalments,
        }
    }
}

/// A payment transaction
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Store-assigned identifier
    pub id: Option<TransactionId>,

    /// Owned payment details (one-to-one)
    pub description: Description,

    /// Referenced payment method
    pub payment_method: PaymentMethod,
}

impl Transaction {
    /// Create a prospective transaction with no identifiers assigned
    pub fn new(description: Description, payment_method: PaymentMethod) -> Self {
        Transaction {
            id: None,
            description,
            payment_method,
        }
    }

    /// Name of the first server-owned field that is present, if any
    ///
    /// Fields are checked in a fixed order so rejections are deterministic.
    /// A transaction is eligible for insertion only when this returns `None`.
    pub fn server_owned_field(&self) -> Option<&'static str> {
        let present = [
            ("id", self.id.is_some()),
            ("description.id", self.description.id.is_some()),
            ("payment_method.id", self.payment_method.id.is_some()),
            ("description.status", self.description.status.is_some()),
            ("description.nsu", self.description.nsu.is_some()),
            (
                "description.authorization_code",
                self.description.authorization_code.is_some(),
            ),
        ];

        present
            .into_iter()
            .find(|(_, is_present)| *is_present)
            .map(|(field, _)| field)
    }
}
