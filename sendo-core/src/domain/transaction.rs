//! Merchant transaction domain model
//!
//! Transactions are server records; this side only reads and filters them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Page;

/// Server-side transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Blocked,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 4] = [
        Self::Pending,
        Self::Completed,
        Self::Failed,
        Self::Blocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Blocked => "BLOCKED",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown status '{}' (expected PENDING, COMPLETED, FAILED or BLOCKED)",
                    s
                )
            })
    }
}

/// The underlying ledger transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetail {
    pub id: i64,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub exchange_rates: Option<Decimal>,
    #[serde(default)]
    pub sendo_fees: Option<Decimal>,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tva: Option<Decimal>,
    #[serde(default)]
    pub partner_fees: Option<Decimal>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub status: TransactionStatus,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub transaction_reference: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A commission line on a merchant account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantTransaction {
    pub id: i64,
    #[serde(default)]
    pub transaction_id: Option<i64>,
    #[serde(default)]
    pub partner_id: Option<i64>,
    /// Commission amount credited to the merchant
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub is_withdrawn: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub transaction: TransactionDetail,
}

impl MerchantTransaction {
    pub fn status(&self) -> TransactionStatus {
        self.transaction.status
    }

    pub fn currency(&self) -> &str {
        &self.transaction.currency
    }

    /// Case-insensitive match over the visible text columns
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        let tx = &self.transaction;
        let haystacks = [
            Some(self.id.to_string()),
            tx.transaction_id.clone(),
            Some(tx.kind.clone()),
            Some(tx.status.as_str().to_string()),
            tx.description.clone(),
            tx.method.clone(),
            tx.provider.clone(),
            tx.transaction_reference.clone(),
            Some(tx.amount.to_string()),
        ];

        haystacks
            .iter()
            .flatten()
            .any(|value| value.to_lowercase().contains(&needle))
    }
}

/// `GET /merchant/transactions/:id/all` payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantTransactionPage {
    #[serde(flatten)]
    pub page: Page<MerchantTransaction>,
    #[serde(default)]
    pub total_commission: Decimal,
}

/// Listing filters; status and dates go to the server, search stays local
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub status: Option<TransactionStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: Option<String>,
}

impl TransactionFilter {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.search.as_deref().map_or(true, |s| s.trim().is_empty())
    }

    /// Query parameters understood by the listing endpoint
    pub fn server_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status".to_string(), status.as_str().to_string()));
        }
        if let Some(start) = self.start_date {
            params.push(("startDate".to_string(), start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end_date {
            params.push(("endDate".to_string(), end.format("%Y-%m-%d").to_string()));
        }
        params
    }

    pub fn validate(&self) -> Result<(), String> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(format!("Start date {} is after end date {}", start, end));
            }
        }
        Ok(())
    }
}
