//! Registration fees per position type.

use std::collections::HashMap;

use permitflow_shared::config::FeeEntry;
use permitflow_shared::types::{Currency, Money};

use super::error::PaymentError;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::PositionType;

/// Fee lookup in paise.
#[derive(Debug, Clone)]
pub struct FeeSchedule {
    fees: HashMap<PositionType, i64>,
    currency: Currency,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::with_defaults(Currency::Inr)
    }
}

impl FeeSchedule {
    /// Built-in schedule.
    #[must_use]
    pub fn with_defaults(currency: Currency) -> Self {
        let fees = PositionType::ALL
            .into_iter()
            .map(|position| (position, default_fee_paise(position)))
            .collect();
        Self { fees, currency }
    }

    /// Returns a copy with configured fees applied.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for unknown positions or non-positive amounts.
    pub fn with_overrides(mut self, entries: &[FeeEntry]) -> Result<Self, WorkflowError> {
        for entry in entries {
            let position = PositionType::parse(&entry.position_type).ok_or_else(|| {
                WorkflowError::Validation(format!(
                    "unknown position type '{}'",
                    entry.position_type
                ))
            })?;
            if entry.amount_paise <= 0 {
                return Err(WorkflowError::Validation(format!(
                    "fee for {position} must be positive"
                )));
            }
            self.fees.insert(position, entry.amount_paise);
        }
        Ok(self)
    }

    /// Fee for a position.
    ///
    /// # Errors
    ///
    /// Returns `FeeNotConfigured` if the position has no fee.
    pub fn fee_for(&self, position: PositionType) -> Result<Money, PaymentError> {
        self.fees
            .get(&position)
            .map(|paise| Money::from_minor_units(*paise, self.currency))
            .ok_or(PaymentError::FeeNotConfigured(position))
    }
}

const fn default_fee_paise(position: PositionType) -> i64 {
    match position {
        PositionType::Architect => 500_000,
        PositionType::StructuralEngineer => 400_000,
        PositionType::LicenceEngineer => 300_000,
        PositionType::Supervisor1 => 200_000,
        PositionType::Supervisor2 => 150_000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let schedule = FeeSchedule::default();
        let fee = schedule.fee_for(PositionType::Architect).unwrap();
        assert_eq!(fee.amount, dec!(5000.00));
        assert_eq!(fee.to_minor_units(), Some(500_000));
        assert_eq!(
            schedule.fee_for(PositionType::Supervisor2).unwrap().format_amount(),
            "1500.00"
        );
    }

    #[test]
    fn test_override() {
        let schedule = FeeSchedule::default()
            .with_overrides(&[FeeEntry {
                position_type: "supervisor1".to_string(),
                amount_paise: 123_450,
            }])
            .unwrap();
        assert_eq!(
            schedule.fee_for(PositionType::Supervisor1).unwrap().format_amount(),
            "1234.50"
        );
    }

    #[test]
    fn test_invalid_override() {
        let zero = FeeEntry {
            position_type: "architect".to_string(),
            amount_paise: 0,
        };
        assert!(FeeSchedule::default().with_overrides(&[zero]).is_err());
        let unknown = FeeEntry {
            position_type: "pilot".to_string(),
            amount_paise: 100,
        };
        assert!(FeeSchedule::default().with_overrides(&[unknown]).is_err());
    }
}
