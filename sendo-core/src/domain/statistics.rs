//! Merchant statistics (`GET /admin/statistics/merchant/:id`)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MerchantContact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantOverview {
    pub id: i64,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub type_account: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub user: MerchantContact,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    #[serde(default)]
    pub total_fees: Decimal,
    #[serde(default)]
    pub total_withdrawn: Decimal,
    #[serde(default)]
    pub available_balance: Decimal,
    #[serde(default)]
    pub pending_withdrawals: Decimal,
    #[serde(default)]
    pub total_transactions: u64,
}

/// Parent transaction reference inside a fee line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeTransactionRef {
    pub id: String,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFee {
    pub id: i64,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub is_withdrawn: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub transaction: Option<FeeTransactionRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantStatistics {
    pub merchant: MerchantOverview,
    #[serde(default)]
    pub summary: StatisticsSummary,
    #[serde(default)]
    pub recent_fees: Vec<RecentFee>,
    /// Shape varies by withdrawal channel; kept raw
    #[serde(default)]
    pub recent_withdrawals: Vec<serde_json::Value>,
}

/// Optional date window shared by statistics and commission queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
}

impl DateRange {
    pub fn query(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(start) = self.start_date {
            params.push(("startDate".to_string(), start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end_date {
            params.push(("endDate".to_string(), end.format("%Y-%m-%d").to_string()));
        }
        params
    }
}
