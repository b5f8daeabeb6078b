//! User profile domain model (`GET /users/me`)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Role attached to a user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    pub id: i64,
    pub name: String,
}

/// Wallet summary embedded in the profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSummary {
    pub id: i64,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub matricule: String,
}

/// Merchant account link; absent for non-merchant users
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantRef {
    pub id: i64,
    #[serde(default)]
    pub type_account: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// The authenticated user's profile, persisted as `user-info`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub is_verified_email: bool,
    #[serde(default, rename = "isVerifiedKYC")]
    pub is_verified_kyc: bool,
    #[serde(default)]
    pub roles: Vec<RoleRef>,
    #[serde(default)]
    pub wallet: Option<WalletSummary>,
    #[serde(default)]
    pub merchant: Option<MerchantRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// "First Last", falling back to whichever part is present
    pub fn display_name(&self) -> String {
        match (self.firstname.trim(), self.lastname.trim()) {
            ("", "") => self.email.clone(),
            (first, "") => first.to_string(),
            ("", last) => last.to_string(),
            (first, last) => format!("{} {}", first, last),
        }
    }

    pub fn merchant_id(&self) -> Option<i64> {
        self.merchant.as_ref().map(|m| m.id)
    }

    pub fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name.eq_ignore_ascii_case(name))
    }
}
