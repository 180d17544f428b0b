//! Entity to view projection
//!
//! Field-by-field copy from persisted entities to transport views,
//! preserving the nested structure. A persisted entity always carries its
//! identifiers and server-stamped fields; if one is missing the store handed
//! back a malformed row and projection fails with a store failure.

use crate::types::{
    Description, DescriptionView, PaymentError, PaymentMethod, PaymentMethodView, Transaction,
    TransactionView,
};

fn required<T: Clone>(value: &Option<T>, field: &str) -> Result<T, PaymentError> {
    value
        .clone()
        .ok_or_else(|| PaymentError::store_failure("project", format!("persisted {} is missing", field)))
}

impl TryFrom<&Description> for DescriptionView {
    type Error = PaymentError;

    fn try_from(description: &Description) -> Result<Self, Self::Error> {
        Ok(DescriptionView {
            id: required(&description.id, "description.id")?,
            value: description.value,
            establishment: description.establishment.clone(),
            merchant_code: description.merchant_code.clone(),
            nsu: required(&description.nsu, "description.nsu")?,
            authorization_code: required(&description.authorization_code, "description.authorization_code")?,
            status: required(&description.status, "description.status")?,
        })
    }
}

impl TryFrom<&PaymentMethod> for PaymentMethodView {
    type Error = PaymentError;

    fn try_from(payment_method: &PaymentMethod) -> Result<Self, Self::Error> {
        Ok(PaymentMethodView {
            id: required(&payment_method.id, "payment_method.id")?,
            payment_type: payment_method.payment_type.clone(),
            instalments: payment_method.instalments,
        })
    }
}

impl TryFrom<&Transaction> for TransactionView {
    type Error = PaymentError;

    fn try_from(transaction: &Transaction) -> Result<Self, Self::Error> {
        Ok(TransactionView {
            id: required(&transaction.id, "id")?,
            description: DescriptionView::try_from(&transaction.description)?,
            payment_method: PaymentMethodView::try_from(&transaction.payment_method)?,
        })
    }
}

/// Project a persisted transaction to its view
pub fn project(transaction: &Transaction) -> Result<TransactionView, PaymentError> {
    TransactionView::try_from(transaction)
}

/// Project every transaction, failing on the first malformed one
pub fn project_all(transactions: &[Transaction]) -> Result<Vec<TransactionView>, PaymentError> {
    transactions.iter().map(project).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Status;
    use rust_decimal::Decimal;

    fn persisted(id: u64) -> Transaction {
        Transaction {
            id: Some(id),
            description: Description {
                id: Some(id + 10),
                value: Decimal::new(49650, 2),
                establishment: "PUC Minas".to_string(),
                merchant_code: "00000000000000".to_string(),
                nsu: Some("1234567890".to_string()),
                authorization_code: Some("147258369".to_string()),
                status: Some(Status::Authorized),
            },
            payment_method: PaymentMethod {
                id: Some(id + 20),
                payment_type: "DEBITO".to_string(),
                instalments: 1,
            },
        }
    }

    #[test]
    fn test_project_copies_every_field() {
        let view = project(&persisted(1)).unwrap();

        assert_eq!(view.id, 1);
        assert_eq!(view.description.id, 11);
        assert_eq!(view.description.value, Decimal::new(49650, 2));
        assert_eq!(view.description.establishment, "PUC Minas");
        assert_eq!(view.description.merchant_code, "00000000000000");
        assert_eq!(view.description.nsu, "1234567890");
        assert_eq!(view.description.authorization_code, "147258369");
        assert_eq!(view.status(), Status::Authorized);
        assert_eq!(view.payment_method.id, 21);
        assert_eq!(view.payment_method.payment_type, "DEBITO");
        assert_eq!(view.payment_method.instalments, 1);
    }

    #[test]
    fn test_project_fails_on_missing_store_field() {
        let mut transaction = persisted(1);
        transaction.description.nsu = None;

        let error = project(&transaction).unwrap_err();
        assert_eq!(
            error,
            PaymentError::store_failure("project", "persisted description.nsu is missing")
        );
    }

    #[test]
    fn test_project_all_preserves_order() {
        let views = project_all(&[persisted(3), persisted(1)]).unwrap();
        let ids: Vec<_> = views.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }
}
