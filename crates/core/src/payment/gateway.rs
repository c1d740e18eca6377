//! Redirect-and-callback payment gateway.

use std::collections::BTreeMap;
use std::str::FromStr;

use permitflow_shared::config::PaymentConfig;
use permitflow_shared::types::{Currency, Money};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::checksum::Checksum;
use super::error::PaymentError;
use super::types::{CallbackOutcome, PaymentCallback, PaymentRedirect};

/// Builds redirect forms and verifies callbacks for one merchant account.
#[derive(Debug, Clone)]
pub struct PaymentGateway {
    gateway_url: String,
    merchant_id: String,
    return_url: String,
    currency: Currency,
    checksum: Checksum,
}

impl PaymentGateway {
    /// Creates a gateway from configuration.
    #[must_use]
    pub fn from_config(config: &PaymentConfig) -> Self {
        Self {
            gateway_url: config.gateway_url.clone(),
            merchant_id: config.merchant_id.clone(),
            return_url: config.return_url.clone(),
            currency: config.currency,
            checksum: Checksum::new(config.checksum_secret.clone()),
        }
    }

    /// Currency fees are charged in.
    #[must_use]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// A fresh, unique order id.
    #[must_use]
    pub fn new_order_id() -> String {
        format!("PFO-{}", Uuid::now_v7().simple())
    }

    /// Form the applicant posts to the gateway.
    #[must_use]
    pub fn redirect(&self, order_id: &str, amount: &Money) -> PaymentRedirect {
        let amount_str = amount.format_amount();
        let currency = amount.currency.to_string();
        let checksum = self.checksum.compute(&[
            &self.merchant_id,
            order_id,
            &amount_str,
            &currency,
            &self.return_url,
        ]);

        let fields = BTreeMap::from([
            ("merchant_id".to_string(), self.merchant_id.clone()),
            ("order_id".to_string(), order_id.to_string()),
            ("amount".to_string(), amount_str),
            ("currency".to_string(), currency),
            ("return_url".to_string(), self.return_url.clone()),
            ("checksum".to_string(), checksum),
        ]);

        PaymentRedirect {
            url: self.gateway_url.clone(),
            method: "POST",
            fields,
        }
    }

    /// Checksum the gateway is expected to put on a callback.
    #[must_use]
    pub fn callback_checksum(
        &self,
        order_id: &str,
        transaction_id: &str,
        status: &str,
        amount: &str,
    ) -> String {
        self.checksum
            .compute(&[order_id, transaction_id, status, amount])
    }

    /// Verifies a callback against the amount that was requested.
    ///
    /// The checksum is checked first; nothing else in an unauthenticated
    /// callback is trusted before that.
    ///
    /// # Errors
    ///
    /// * `ChecksumMismatch` for a forged or corrupted callback
    /// * `UnknownStatus` for an unrecognised gateway status
    /// * `InvalidAmount` / `AmountMismatch` for a success with the wrong amount
    pub fn verify_callback(
        &self,
        callback: &PaymentCallback,
        expected_paise: i64,
    ) -> Result<CallbackOutcome, PaymentError> {
        self.checksum.verify(
            &[
                &callback.order_id,
                &callback.transaction_id,
                &callback.status,
                &callback.amount,
            ],
            &callback.checksum,
        )?;

        match callback.status.to_ascii_lowercase().as_str() {
            "success" | "completed" | "captured" => {
                let received = parse_paise(&callback.amount)?;
                if received != expected_paise {
                    return Err(PaymentError::AmountMismatch {
                        expected: expected_paise,
                        received,
                    });
                }
                Ok(CallbackOutcome::Succeeded {
                    transaction_id: callback.transaction_id.clone(),
                    amount_paise: received,
                })
            }
            "failure" | "failed" | "cancelled" | "aborted" => Ok(CallbackOutcome::Failed {
                transaction_id: callback.transaction_id.clone(),
                reason: callback.status.clone(),
            }),
            other => Err(PaymentError::UnknownStatus(other.to_string())),
        }
    }
}

fn parse_paise(amount: &str) -> Result<i64, PaymentError> {
    let value = Decimal::from_str(amount.trim())
        .map_err(|_| PaymentError::InvalidAmount(amount.to_string()))?;
    if value.is_sign_negative() || value.is_zero() || value.scale() > 2 {
        return Err(PaymentError::InvalidAmount(amount.to_string()));
    }
    Money::new(value, Currency::Inr)
        .to_minor_units()
        .ok_or_else(|| PaymentError::InvalidAmount(amount.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn gateway() -> PaymentGateway {
        PaymentGateway::from_config(&PaymentConfig {
            gateway_url: "https://pay.example/checkout".to_string(),
            merchant_id: "PMC001".to_string(),
            checksum_secret: "s3cret".to_string(),
            return_url: "https://permits.example/payments/return".to_string(),
            currency: Currency::Inr,
            fees: vec![],
        })
    }

    fn callback(gw: &PaymentGateway, status: &str, amount: &str) -> PaymentCallback {
        PaymentCallback {
            order_id: "PFO-1".to_string(),
            transaction_id: "TXN-9".to_string(),
            status: status.to_string(),
            amount: amount.to_string(),
            checksum: gw.callback_checksum("PFO-1", "TXN-9", status, amount),
        }
    }

    #[test]
    fn test_redirect_fields() {
        let gw = gateway();
        let redirect = gw.redirect("PFO-1", &Money::from_minor_units(250_000, Currency::Inr));
        assert_eq!(redirect.url, "https://pay.example/checkout");
        assert_eq!(redirect.method, "POST");
        assert_eq!(redirect.fields["amount"], "2500.00");
        assert_eq!(redirect.fields["currency"], "INR");
        assert_eq!(redirect.fields["merchant_id"], "PMC001");
        assert_eq!(redirect.fields["checksum"].len(), 64);
    }

    #[test]
    fn test_order_ids_are_unique() {
        assert_ne!(PaymentGateway::new_order_id(), PaymentGateway::new_order_id());
    }

    #[test]
    fn test_successful_callback() {
        let gw = gateway();
        let outcome = gw
            .verify_callback(&callback(&gw, "success", "2500.00"), 250_000)
            .unwrap();
        assert_eq!(
            outcome,
            CallbackOutcome::Succeeded {
                transaction_id: "TXN-9".to_string(),
                amount_paise: 250_000,
            }
        );
    }

    #[test]
    fn test_failed_callback_ignores_amount() {
        let gw = gateway();
        let outcome = gw
            .verify_callback(&callback(&gw, "failed", "0"), 250_000)
            .unwrap();
        assert!(matches!(outcome, CallbackOutcome::Failed { .. }));
    }

    #[test]
    fn test_tampered_callback() {
        let gw = gateway();
        let mut cb = callback(&gw, "success", "2500.00");
        cb.amount = "1.00".to_string();
        assert!(matches!(
            gw.verify_callback(&cb, 250_000),
            Err(PaymentError::ChecksumMismatch)
        ));
    }

    #[test]
    fn test_amount_mismatch() {
        let gw = gateway();
        assert!(matches!(
            gw.verify_callback(&callback(&gw, "success", "2000.00"), 250_000),
            Err(PaymentError::AmountMismatch {
                expected: 250_000,
                received: 200_000
            })
        ));
    }

    #[test]
    fn test_unknown_status() {
        let gw = gateway();
        assert!(matches!(
            gw.verify_callback(&callback(&gw, "pending_review", "2500.00"), 250_000),
            Err(PaymentError::UnknownStatus(_))
        ));
    }

    #[rstest]
    #[case("2500", Ok(250_000))]
    #[case("2500.5", Ok(250_050))]
    #[case(" 0.01 ", Ok(1))]
    #[case("0", Err(()))]
    #[case("-5.00", Err(()))]
    #[case("1.001", Err(()))]
    #[case("abc", Err(()))]
    fn test_parse_paise(#[case] input: &str, #[case] expected: Result<i64, ()>) {
        assert_eq!(parse_paise(input).map_err(|_| ()), expected);
    }
}
