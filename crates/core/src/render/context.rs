//! Data printed on generated documents.

use chrono::NaiveDate;
use permitflow_shared::types::Money;

use crate::workflow::types::PositionType;

/// Application particulars for a generated document.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    /// Human-readable application number.
    pub application_number: String,
    /// Applicant's full name.
    pub applicant_name: String,
    /// Position applied for.
    pub position: PositionType,
    /// Date printed on the document.
    pub issued_on: NaiveDate,
    /// Fee, printed on the challan.
    pub fee: Option<Money>,
    /// Gateway order id, printed on the challan.
    pub order_id: Option<String>,
    /// Gateway transaction id, printed on the challan.
    pub transaction_ref: Option<String>,
}

impl DocumentContext {
    /// Context without payment details.
    #[must_use]
    pub fn new(
        application_number: impl Into<String>,
        applicant_name: impl Into<String>,
        position: PositionType,
        issued_on: NaiveDate,
    ) -> Self {
        Self {
            application_number: application_number.into(),
            applicant_name: applicant_name.into(),
            position,
            issued_on,
            fee: None,
            order_id: None,
            transaction_ref: None,
        }
    }

    /// Adds payment details.
    #[must_use]
    pub fn with_payment(mut self, fee: Money, order_id: String, transaction_ref: Option<String>) -> Self {
        self.fee = Some(fee);
        self.order_id = Some(order_id);
        self.transaction_ref = transaction_ref;
        self
    }
}
