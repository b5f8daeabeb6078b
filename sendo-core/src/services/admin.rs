//! Role administration, user status and merchant statistics

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::domain::result::{Error, Result};
use crate::domain::{
    AssignRoles, DateRange, MerchantStatistics, NewUser, RemoveRole, Role, UserStatus,
};
use crate::services::api::SendoApi;

pub struct AdminService {
    api: Arc<SendoApi>,
}

fn role_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Role name is required"));
    }
    Ok(name)
}

fn check_range(range: &DateRange) -> Result<()> {
    match (range.start_date, range.end_date) {
        (Some(start), Some(end)) if start > end => Err(Error::validation(
            "Start date must not be after end date",
        )),
        _ => Ok(()),
    }
}

impl AdminService {
    pub fn new(api: Arc<SendoApi>) -> Self {
        Self { api }
    }

    pub async fn roles(&self) -> Result<Vec<Role>> {
        let mut roles = self.api.roles().await?;
        roles.sort_by_key(|r| r.id);
        Ok(roles)
    }

    pub async fn create_role(&self, name: &str) -> Result<Role> {
        let role = self.api.create_role(role_name(name)?).await?;
        tracing::info!(role_id = role.id, "role created");
        Ok(role)
    }

    pub async fn rename_role(&self, role_id: i64, name: &str) -> Result<Role> {
        self.api.update_role(role_id, role_name(name)?).await
    }

    pub async fn assign_roles(&self, user_id: i64, role_ids: Vec<i64>) -> Result<()> {
        if role_ids.is_empty() {
            return Err(Error::validation("Select at least one role"));
        }
        let mut roles_id = role_ids;
        roles_id.sort_unstable();
        roles_id.dedup();
        self.api
            .assign_roles(&AssignRoles { user_id, roles_id })
            .await
    }

    pub async fn remove_role(&self, user_id: i64, role_id: i64) -> Result<()> {
        self.api.remove_role(&RemoveRole { user_id, role_id }).await
    }

    /// Create an account holding one role
    pub async fn invite_user(&self, user: &NewUser) -> Result<()> {
        let user = user.normalized()?;
        self.api.create_user(&user).await?;
        tracing::info!(role_id = user.role_id, "user invited");
        Ok(())
    }

    pub async fn set_user_status(&self, email: &str, status: UserStatus) -> Result<()> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(Error::validation("A valid email address is required"));
        }
        self.api.change_user_status(email, status).await?;
        tracing::info!(%status, "user status changed");
        Ok(())
    }

    /// Statistics for `merchant_id`, or for the logged-in merchant
    pub async fn merchant_statistics(
        &self,
        merchant_id: Option<i64>,
        range: &DateRange,
    ) -> Result<MerchantStatistics> {
        check_range(range)?;
        let merchant_id = match merchant_id {
            Some(id) => id,
            None => self.api.merchant_id().await?,
        };
        self.api.merchant_statistics(merchant_id, range).await
    }

    pub async fn commissions(&self, range: &DateRange, kind: Option<&str>) -> Result<JsonValue> {
        check_range(range)?;
        let kind = kind.map(str::trim).filter(|k| !k.is_empty());
        self.api.commissions(range, kind).await
    }
}
