//! Typed Sendo endpoints over an [`ApiGateway`]
//!
//! Every authenticated call goes through [`SendoApi::send`], which attaches
//! the bearer token and is the one place a 401 ends the session.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::domain::result::{Error, Result};
use crate::domain::{
    envelope_status, open_envelope, AssignRoles, Credentials, DateRange, KycDocumentType,
    KycFile, KycUploadResult, MerchantStatistics, MerchantTransaction, MerchantTransactionPage,
    NewUser, Pin, RemoveRole, Role, TransactionFilter, TransferFundsPayload, TransferReceipt,
    UserProfile, UserStatus, Wallet, WithdrawalPayload,
};
use crate::ports::{ApiGateway, ApiRequest, FormPart};
use crate::services::session::SessionStore;

/// Login body
#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

fn decode<T: DeserializeOwned>(value: JsonValue) -> Result<T> {
    Ok(open_envelope(value)?)
}

/// A user-supplied id placed in the URL path; it must stay one segment
fn path_id<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(format!("{} is required", what)));
    }
    if value == "."
        || value == ".."
        || value.chars().any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_control())
    {
        return Err(Error::validation(format!("{} contains invalid characters", what)));
    }
    Ok(value)
}

/// Body of `POST /users/send-passcode`; the server takes the code as a number
#[derive(Serialize)]
struct PasscodeBody {
    passcode: u16,
}

pub struct SendoApi {
    gateway: Arc<dyn ApiGateway>,
    session: Arc<SessionStore>,
    auth_path: String,
}

impl SendoApi {
    pub fn new(gateway: Arc<dyn ApiGateway>, session: Arc<SessionStore>) -> Self {
        Self::with_auth_path(gateway, session, "/auth")
    }

    /// `auth_path` prefixes the login and logout routes
    pub fn with_auth_path(
        gateway: Arc<dyn ApiGateway>,
        session: Arc<SessionStore>,
        auth_path: impl Into<String>,
    ) -> Self {
        let auth_path = auth_path.into();
        Self {
            gateway,
            session,
            auth_path: format!("/{}", auth_path.trim_matches('/')),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Authenticated call; a 401 expires the session
    async fn send(&self, request: ApiRequest) -> Result<JsonValue> {
        let token = self.session.access_token()?;
        let description = request.describe();

        match self.gateway.execute(request.bearer(token)).await {
            Err(e) if e.is_unauthorized() => {
                tracing::warn!(request = %description, "server rejected the session");
                self.session.expire()?;
                Err(Error::Unauthorized)
            }
            other => other,
        }
    }

    async fn send_decoded<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        decode(self.send(request).await?)
    }

    // === Auth ===

    /// `POST {auth}/login`; does not touch the session store
    pub async fn login(&self, email: &str, password: &str) -> Result<Credentials> {
        let request = ApiRequest::post(format!("{}/login", self.auth_path))
            .json(&LoginBody { email, password })?;
        decode(self.gateway.execute(request).await?)
    }

    pub async fn logout(&self, device_id: &str) -> Result<()> {
        let request = ApiRequest::post(format!("{}/logout", self.auth_path))
            .json(&serde_json::json!({ "deviceId": device_id }))?;
        self.send(request).await.map(|_| ())
    }

    pub async fn me(&self) -> Result<UserProfile> {
        self.send_decoded(ApiRequest::get("/users/me")).await
    }

    /// Whether a passcode is configured
    ///
    /// The body's `status` decides when the server sends one; otherwise a
    /// 2xx means yes and any other non-auth client error means no.
    pub async fn has_pincode(&self) -> Result<bool> {
        match self.send(ApiRequest::get("/users/check-pincode")).await {
            Ok(body) => Ok(envelope_status(&body).map_or(true, |status| status == 200)),
            Err(Error::Api { status, .. }) if (400..500).contains(&status) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Set or replace the account passcode (`POST /users/send-passcode`)
    pub async fn set_passcode(&self, pin: &Pin) -> Result<()> {
        let passcode = pin
            .expose()
            .parse()
            .map_err(|_| Error::validation("PIN must be 4 digits"))?;
        let request = ApiRequest::post("/users/send-passcode").json(&PasscodeBody { passcode })?;
        let body = self.send(request).await?;
        check_body_status(&body)
    }

    /// Check a PIN against the stored one (`GET /users/check-pincode/:pin`)
    ///
    /// `Ok(false)` when the server rejects the code.
    pub async fn verify_pincode(&self, pin: &Pin) -> Result<bool> {
        let request = ApiRequest::get(format!("/users/check-pincode/{}", pin.expose()))
            .described_as("GET /users/check-pincode/****");
        match self.send(request).await {
            Ok(body) => Ok(envelope_status(&body).map_or(true, |status| status == 200)),
            Err(Error::Api { status, .. }) if status == 400 || status == 403 => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create an account with one role (`POST /users`)
    pub async fn create_user(&self, user: &NewUser) -> Result<()> {
        let request = ApiRequest::post("/users").json(user)?;
        let body = self.send(request).await?;
        check_body_status(&body)
    }

    /// Merchant id from the cached profile, fetching `/users/me` if needed
    pub async fn merchant_id(&self) -> Result<i64> {
        let profile = match self.session.profile() {
            Some(profile) => profile,
            None => {
                let profile = self.me().await?;
                self.session.set_profile(profile.clone())?;
                profile
            }
        };
        profile
            .merchant_id()
            .ok_or_else(|| Error::validation("This account is not a merchant account"))
    }

    // === Merchant ===

    pub async fn merchant_transactions(
        &self,
        merchant_id: i64,
        page: u32,
        limit: u32,
        filter: &TransactionFilter,
    ) -> Result<MerchantTransactionPage> {
        let request = ApiRequest::get(format!("/merchant/transactions/{}/all", merchant_id))
            .query("page", page)
            .query("limit", limit)
            .queries(filter.server_params());
        self.send_decoded(request).await
    }

    pub async fn merchant_transaction(&self, transaction_id: i64) -> Result<MerchantTransaction> {
        self.send_decoded(ApiRequest::get(format!("/merchant/transactions/{}", transaction_id)))
            .await
    }

    pub async fn wallet(&self, wallet_id: &str) -> Result<Wallet> {
        let wallet_id = path_id(wallet_id, "Wallet id")?;
        self.send_decoded(ApiRequest::get(format!("/wallet/{}", wallet_id)))
            .await
    }

    pub async fn transfer_funds(
        &self,
        payload: &TransferFundsPayload,
        pin: &Pin,
    ) -> Result<TransferReceipt> {
        let request = ApiRequest::post("/merchant/transfer-funds")
            .json(payload)?
            .passcode(pin);
        self.send_optional(request).await
    }

    /// The server answers with an empty `data`
    pub async fn withdrawal_request(&self, payload: &WithdrawalPayload, pin: &Pin) -> Result<()> {
        let request = ApiRequest::post("/merchant/withdrawal-request")
            .json(payload)?
            .passcode(pin);
        self.send(request).await.map(|_| ())
    }

    // === Admin ===

    pub async fn roles(&self) -> Result<Vec<Role>> {
        self.send_decoded(ApiRequest::get("/admin/roles")).await
    }

    pub async fn create_role(&self, name: &str) -> Result<Role> {
        let request = ApiRequest::post("/admin/roles").json(&serde_json::json!({ "name": name }))?;
        self.send_decoded(request).await
    }

    pub async fn update_role(&self, role_id: i64, name: &str) -> Result<Role> {
        let request = ApiRequest::put(format!("/admin/roles/{}", role_id))
            .json(&serde_json::json!({ "name": name }))?;
        self.send_decoded(request).await
    }

    pub async fn assign_roles(&self, body: &AssignRoles) -> Result<()> {
        let request = ApiRequest::put("/admin/users/attribute-role").json(body)?;
        self.send(request).await.map(|_| ())
    }

    pub async fn remove_role(&self, body: &RemoveRole) -> Result<()> {
        let request = ApiRequest::delete("/admin/users/remove-role").json(body)?;
        self.send(request).await.map(|_| ())
    }

    pub async fn change_user_status(&self, email: &str, status: UserStatus) -> Result<()> {
        let request = ApiRequest::put("/admin/users/change-status")
            .query("email", email)
            .query("status", status);
        self.send(request).await.map(|_| ())
    }

    pub async fn merchant_statistics(
        &self,
        merchant_id: i64,
        range: &DateRange,
    ) -> Result<MerchantStatistics> {
        let request = ApiRequest::get(format!("/admin/statistics/merchant/{}", merchant_id))
            .queries(range.query());
        self.send_decoded(request).await
    }

    /// Commission report; its shape is not fixed, so it stays raw JSON
    pub async fn commissions(&self, range: &DateRange, kind: Option<&str>) -> Result<JsonValue> {
        let mut request = ApiRequest::get("/admin/commission").queries(range.query());
        if let Some(kind) = kind {
            request = request.query("type", kind);
        }
        self.send_decoded(request).await
    }

    // === KYC ===

    pub async fn kyc_upload(
        &self,
        document_type: KycDocumentType,
        files: Vec<KycFile>,
    ) -> Result<KycUploadResult> {
        let mut parts = vec![FormPart::Text {
            name: "type".to_string(),
            value: document_type.as_str().to_string(),
        }];
        parts.extend(files.into_iter().map(|file| FormPart::File {
            name: "files".to_string(),
            file,
        }));

        let request = ApiRequest::post("/kyc/onboarding-merchant").multipart(parts);
        self.send_optional(request).await
    }

    pub async fn kyc_replace(&self, public_id: &str, file: KycFile) -> Result<KycUploadResult> {
        let public_id = path_id(public_id, "Document id")?;
        let request = ApiRequest::put(format!("/kyc/{}", public_id)).multipart(vec![FormPart::File {
            name: "file".to_string(),
            file,
        }]);
        self.send_optional(request).await
    }

    /// Like `send_decoded`, but a missing `data` decodes to the default
    async fn send_optional<T: DeserializeOwned + Default>(&self, request: ApiRequest) -> Result<T> {
        let value = self.send(request).await?;
        match value.get("data") {
            Some(JsonValue::Null) | None => Ok(T::default()),
            Some(data) => Ok(serde_json::from_value(data.clone())?),
        }
    }
}

/// Some endpoints answer 2xx with a failing `status` in the body
fn check_body_status(body: &JsonValue) -> Result<()> {
    match envelope_status(body) {
        Some(status) if !(200..300).contains(&status) => {
            let message = body
                .get("message")
                .and_then(JsonValue::as_str)
                .unwrap_or("Request was not accepted");
            Err(Error::api(status, message))
        }
        _ => Ok(()),
    }
}
