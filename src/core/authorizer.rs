//! Authorization stamping
//!
//! The service does not talk to a real acquirer. [`FixedAuthorizer`] stamps
//! every accepted payment with the same network sequence number and
//! authorization code.

use super::traits::Authorizer;
use crate::types::Transaction;

/// Network sequence number stamped by [`FixedAuthorizer`]
pub const FIXED_NSU: &str = "1234567890";

/// Authorization code stamped by [`FixedAuthorizer`]
pub const FIXED_AUTHORIZATION_CODE: &str = "147258369";

/// Fields an authorizer assigns to an accepted payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub nsu: String,
    pub authorization_code: String,
}

/// Authorizer that always returns [`FIXED_NSU`] and [`FIXED_AUTHORIZATION_CODE`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedAuthorizer;

impl Authorizer for FixedAuthorizer {
    fn authorize(&self, _transaction: &Transaction) -> Authorization {
        Authorization {
            nsu: FIXED_NSU.to_string(),
            authorization_code: FIXED_AUTHORIZATION_CODE.to_string(),
        }
    }
}
