//! Wallet lookup model (`GET /wallet/:id`)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Owner of a wallet, as exposed by the lookup endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletUser {
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
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: i64,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub matricule: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub user: Option<WalletUser>,
}

/// What the sender sees about a verified destination.
///
/// Never carries the wallet balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub matricule: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub currency: String,
}

impl From<&Wallet> for Recipient {
    fn from(wallet: &Wallet) -> Self {
        let (name, email, phone) = match &wallet.user {
            Some(user) => {
                let name = format!("{} {}", user.firstname.trim(), user.lastname.trim())
                    .trim()
                    .to_string();
                let email = (!user.email.is_empty()).then(|| user.email.clone());
                (name, email, user.phone.clone())
            }
            None => (String::new(), None, None),
        };

        Self {
            matricule: wallet.matricule.clone(),
            name: if name.is_empty() {
                wallet.matricule.clone()
            } else {
                name
            },
            email,
            phone,
            currency: wallet.currency.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_from_wallet() {
        let wallet: Wallet = serde_json::from_value(serde_json::json!({
            "id": 9,
            "balance": 99000,
            "currency": "XAF",
            "status": "ACTIVE",
            "userId": 12,
            "matricule": "SND-4421",
            "user": {
                "id": 12,
                "firstname": "Jean",
                "lastname": "Mbarga",
                "email": "jean@example.com",
                "phone": "+237690000000",
                "picture": null
            }
        }))
        .unwrap();

        let recipient = Recipient::from(&wallet);
        assert_eq!(recipient.name, "Jean Mbarga");
        assert_eq!(recipient.matricule, "SND-4421");
        assert_eq!(recipient.email.as_deref(), Some("jean@example.com"));
    }

    #[test]
    fn test_recipient_without_user_falls_back_to_matricule() {
        let wallet: Wallet = serde_json::from_value(serde_json::json!({
            "id": 9,
            "matricule": "SND-4421",
            "user": null
        }))
        .unwrap();
        assert_eq!(Recipient::from(&wallet).name, "SND-4421");
    }
}
