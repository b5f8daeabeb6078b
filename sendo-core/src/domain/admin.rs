//! Role and account administration types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::result::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Account status an administrator can set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Suspended => "SUSPENDED",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "SUSPENDED" => Ok(Self::Suspended),
            other => Err(format!(
                "Unknown user status '{}' (expected ACTIVE or SUSPENDED)",
                other
            )),
        }
    }
}

/// Body of `PUT /admin/users/attribute-role`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoles {
    pub user_id: i64,
    pub roles_id: Vec<i64>,
}

/// Body of `DELETE /admin/users/remove-role`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRole {
    pub user_id: i64,
    pub role_id: i64,
}

/// Body of `POST /users`: an invited account with its role
///
/// Optional fields are sent as `null` when absent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<String>,
    pub place_of_birth: Option<String>,
    pub role_id: i64,
    pub country: Option<String>,
}

impl NewUser {
    /// Trimmed copy with a lower-case email; rejects what the server would
    pub fn normalized(&self) -> Result<Self, Error> {
        let optional = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };
        let user = Self {
            firstname: self.firstname.trim().to_string(),
            lastname: self.lastname.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: optional(&self.phone),
            address: optional(&self.address),
            date_of_birth: optional(&self.date_of_birth),
            place_of_birth: optional(&self.place_of_birth),
            role_id: self.role_id,
            country: optional(&self.country),
        };

        for (label, value) in [("First name", &user.firstname), ("Last name", &user.lastname)] {
            if value.is_empty() || value.chars().count() > 50 {
                return Err(Error::validation(format!(
                    "{} is required (at most 50 characters)",
                    label
                )));
            }
        }
        let (local, domain) = user.email.split_once('@').unwrap_or(("", ""));
        if local.is_empty() || !domain.contains('.') || user.email.len() > 100 {
            return Err(Error::validation("A valid email is required"));
        }
        if let Some(phone) = &user.phone {
            let digits = phone.chars().all(|c| c.is_ascii_digit());
            if !digits || !(9..=15).contains(&phone.len()) {
                return Err(Error::validation("Phone must be 9 to 15 digits"));
            }
        }
        if user.address.as_ref().is_some_and(|a| a.chars().count() > 200) {
            return Err(Error::validation("Address is limited to 200 characters"));
        }
        if user.role_id <= 0 {
            return Err(Error::validation("A role is required"));
        }
        Ok(user)
    }
}
