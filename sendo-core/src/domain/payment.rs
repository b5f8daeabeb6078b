//! Money-movement requests and the PIN that authorizes them

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::result::{Error, Result};
use super::Recipient;

/// Number of digits in a Sendo passcode
pub const PIN_LENGTH: usize = 4;

/// 4-digit passcode sent in `X-Passcode`
///
/// Wiped from memory on drop, redacted from `Debug`, never serialized.
#[derive(Clone, PartialEq, Eq, ZeroizeOnDrop)]
pub struct Pin(String);

impl Pin {
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let mut code = code.into();
        if code.len() != PIN_LENGTH || !code.bytes().all(|b| b.is_ascii_digit()) {
            code.zeroize();
            return Err(Error::validation(format!(
                "PIN must be exactly {} digits",
                PIN_LENGTH
            )));
        }
        Ok(Self(code))
    }

    /// Raw digits, for the request header only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

impl FromStr for Pin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s.trim())
    }
}

/// Amounts must be strictly positive
pub fn validate_amount(amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(Error::validation("Amount must be greater than zero"));
    }
    Ok(amount)
}

/// Ephemeral wallet-to-wallet transfer form
#[derive(Debug, Clone, Default)]
pub struct TransferRequest {
    pub destination_wallet_id: String,
    pub amount: Option<Decimal>,
    pub verified_recipient: Option<Recipient>,
}

impl TransferRequest {
    pub fn payload(&self) -> Result<TransferFundsPayload> {
        let to_wallet = self.destination_wallet_id.trim();
        if to_wallet.is_empty() {
            return Err(Error::validation("Destination wallet is required"));
        }
        let amount = self
            .amount
            .ok_or_else(|| Error::validation("Amount is required"))
            .and_then(validate_amount)?;

        Ok(TransferFundsPayload {
            to_wallet: to_wallet.to_string(),
            amount,
        })
    }
}

/// Ephemeral withdrawal form
#[derive(Debug, Clone, Default)]
pub struct WithdrawalRequest {
    pub phone: String,
    pub amount: Option<Decimal>,
}

impl WithdrawalRequest {
    pub fn payload(&self, merchant_id: i64) -> Result<WithdrawalPayload> {
        let phone = self.phone.trim();
        if phone.is_empty() {
            return Err(Error::validation("Phone number is required"));
        }
        let amount = self
            .amount
            .ok_or_else(|| Error::validation("Amount is required"))
            .and_then(validate_amount)?;

        Ok(WithdrawalPayload {
            phone: phone.to_string(),
            amount_to_withdraw: amount,
            id_merchant: merchant_id,
        })
    }
}

/// Body of `POST /merchant/transfer-funds`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferFundsPayload {
    pub to_wallet: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Body of `POST /merchant/withdrawal-request`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalPayload {
    pub phone: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_to_withdraw: Decimal,
    pub id_merchant: i64,
}

/// What the server returns for an accepted transfer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_requires_four_digits() {
        assert!(Pin::new("1234").is_ok());
        assert!(Pin::new("123").is_err());
        assert!(Pin::new("12345").is_err());
        assert!(Pin::new("12a4").is_err());
        assert!(Pin::new("١٢٣٤").is_err());
        assert_eq!(" 0042 ".parse::<Pin>().unwrap().expose(), "0042");
    }

    #[test]
    fn test_pin_debug_is_redacted() {
        let pin = Pin::new("9876").unwrap();
        assert!(!format!("{:?}", pin).contains("9876"));
    }

    #[test]
    fn test_amount_must_be_positive() {
        assert!(validate_amount(Decimal::ZERO).is_err());
        assert!(validate_amount(Decimal::new(-5, 0)).is_err());
        assert!(validate_amount(Decimal::new(1, 2)).is_ok());
    }

    #[test]
    fn test_transfer_payload_serializes_amount_as_number() {
        let request = TransferRequest {
            destination_wallet_id: " SND-4421 ".into(),
            amount: Some(Decimal::new(25000, 0)),
            verified_recipient: None,
        };
        let json = serde_json::to_value(request.payload().unwrap()).unwrap();
        assert_eq!(json["toWallet"], "SND-4421");
        assert_eq!(json["amount"].as_f64(), Some(25000.0));
    }

    #[test]
    fn test_withdrawal_payload_shape() {
        let request = WithdrawalRequest {
            phone: "+237690000000".into(),
            amount: Some(Decimal::new(5000, 0)),
        };
        let json = serde_json::to_value(request.payload(42).unwrap()).unwrap();
        assert_eq!(json["phone"], "+237690000000");
        assert_eq!(json["amountToWithdraw"].as_f64(), Some(5000.0));
        assert_eq!(json["idMerchant"], 42);

        let missing = WithdrawalRequest {
            phone: String::new(),
            amount: Some(Decimal::ONE),
        };
        assert!(matches!(missing.payload(42), Err(Error::Validation(_))));
    }
}
