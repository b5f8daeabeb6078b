//! Money-movement flow: destination, amount, confirmation, PIN, submit
//!
//! One [`PaymentFlow`] drives either wallet transfers or withdrawals to a
//! phone number. Transfers must verify their destination wallet before they
//! can be confirmed; withdrawals go straight from destination to
//! confirmation.
//!
//! ```text
//! Idle -> DestinationEntered -> Verified -> Confirmed -> PinEntered -> Submitting -> Success
//!                                                           ^                        |
//!                                                           +-------- Failed <-------+
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use rust_decimal::Decimal;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::domain::result::{Error, Result};
use crate::domain::{
    validate_amount, Pin, Recipient, TransferReceipt, TransferRequest, WithdrawalRequest,
};
use crate::ports::{ConfirmationPrompt, Confirmer};
use crate::services::api::SendoApi;
use crate::services::transactions::TransactionBoard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Transfer,
    Withdrawal,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Withdrawal => "withdrawal",
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Idle,
    DestinationEntered,
    Verified,
    Confirmed,
    PinEntered,
    Submitting,
    Success,
    Failed,
}

/// Result of an accepted submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub kind: PaymentKind,
    /// Only transfers return a receipt
    pub receipt: Option<TransferReceipt>,
    pub board_reloaded: bool,
}

#[derive(Default)]
struct FlowData {
    transfer: TransferRequest,
    withdrawal: WithdrawalRequest,
    pin: Option<Pin>,
    destination_error: Option<String>,
    pin_error: Option<String>,
    last_error: Option<String>,
    cancel: Option<CancellationToken>,
}

struct Inner {
    state: FlowState,
    data: FlowData,
}

impl Inner {
    fn reset(&mut self) {
        self.state = FlowState::Idle;
        self.data = FlowData::default();
    }
}

enum Submission {
    Transfer(crate::domain::TransferFundsPayload),
    Withdrawal(crate::domain::WithdrawalPayload),
}

pub struct PaymentFlow {
    kind: PaymentKind,
    api: Arc<SendoApi>,
    board: Arc<TransactionBoard>,
    confirmer: Arc<dyn Confirmer>,
    clear_pin_on_failure: bool,
    inner: Mutex<Inner>,
}

impl PaymentFlow {
    pub fn new(
        kind: PaymentKind,
        api: Arc<SendoApi>,
        board: Arc<TransactionBoard>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        Self {
            kind,
            api,
            board,
            confirmer,
            clear_pin_on_failure: false,
            inner: Mutex::new(Inner {
                state: FlowState::Idle,
                data: FlowData::default(),
            }),
        }
    }

    /// Drop the entered PIN after a failed submission
    pub fn clear_pin_on_failure(mut self, clear: bool) -> Self {
        self.clear_pin_on_failure = clear;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn kind(&self) -> PaymentKind {
        self.kind
    }

    pub fn state(&self) -> FlowState {
        self.lock().state
    }

    pub fn recipient(&self) -> Option<Recipient> {
        self.lock().data.transfer.verified_recipient.clone()
    }

    pub fn destination_error(&self) -> Option<String> {
        self.lock().data.destination_error.clone()
    }

    pub fn pin_error(&self) -> Option<String> {
        self.lock().data.pin_error.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().data.last_error.clone()
    }

    pub fn has_pin(&self) -> bool {
        self.lock().data.pin.is_some()
    }

    /// Token of the submission in flight, if any
    pub fn cancel_handle(&self) -> Option<CancellationToken> {
        self.lock().data.cancel.clone()
    }

    /// Wallet matricule for transfers, phone number for withdrawals
    ///
    /// Changing the destination discards any verification and confirmation.
    pub fn set_destination(&self, destination: &str) {
        let destination = destination.trim().to_string();
        let mut inner = self.lock();
        if inner.state == FlowState::Submitting {
            return;
        }
        let amount = self.current_amount(&inner);
        inner.data = FlowData::default();
        match self.kind {
            PaymentKind::Transfer => {
                inner.data.transfer.destination_wallet_id = destination.clone();
                inner.data.transfer.amount = amount;
            }
            PaymentKind::Withdrawal => {
                inner.data.withdrawal.phone = destination.clone();
                inner.data.withdrawal.amount = amount;
            }
        }
        inner.state = if destination.is_empty() {
            FlowState::Idle
        } else {
            FlowState::DestinationEntered
        };
    }

    fn current_amount(&self, inner: &Inner) -> Option<Decimal> {
        match self.kind {
            PaymentKind::Transfer => inner.data.transfer.amount,
            PaymentKind::Withdrawal => inner.data.withdrawal.amount,
        }
    }

    /// Rejects zero and negative amounts; a new amount needs a new confirmation
    pub fn set_amount(&self, amount: Decimal) -> Result<()> {
        let mut inner = self.lock();
        if inner.state == FlowState::Submitting {
            return Err(Error::validation("A submission is already in progress"));
        }
        let amount = match validate_amount(amount) {
            Ok(amount) => Some(amount),
            Err(e) => {
                self.store_amount(&mut inner, None);
                return Err(e);
            }
        };
        self.store_amount(&mut inner, amount);

        if matches!(
            inner.state,
            FlowState::Confirmed | FlowState::PinEntered | FlowState::Failed | FlowState::Success
        ) {
            inner.data.pin = None;
            inner.data.pin_error = None;
            inner.state = self.unconfirmed_state(&inner);
        }
        Ok(())
    }

    fn store_amount(&self, inner: &mut Inner, amount: Option<Decimal>) {
        match self.kind {
            PaymentKind::Transfer => inner.data.transfer.amount = amount,
            PaymentKind::Withdrawal => inner.data.withdrawal.amount = amount,
        }
    }

    fn unconfirmed_state(&self, inner: &Inner) -> FlowState {
        let destination = match self.kind {
            PaymentKind::Transfer => &inner.data.transfer.destination_wallet_id,
            PaymentKind::Withdrawal => &inner.data.withdrawal.phone,
        };
        if destination.is_empty() {
            FlowState::Idle
        } else if inner.data.transfer.verified_recipient.is_some() {
            FlowState::Verified
        } else {
            FlowState::DestinationEntered
        }
    }

    /// Look up the destination wallet (`GET /wallet/:id`)
    ///
    /// A failed lookup leaves an error on the flow and blocks confirmation.
    pub async fn verify_destination(&self, wallet_id: &str) -> Result<Recipient> {
        if self.kind != PaymentKind::Transfer {
            return Err(Error::validation("Withdrawals have no destination to verify"));
        }
        if self.state() == FlowState::Submitting {
            return Err(Error::validation("A submission is already in progress"));
        }
        self.set_destination(wallet_id);
        let wallet_id = wallet_id.trim().to_string();
        if wallet_id.is_empty() {
            let err = Error::validation("Destination wallet is required");
            self.lock().data.destination_error = Some(err.user_message());
            return Err(err);
        }

        let looked_up = self.api.wallet(&wallet_id).await;

        let mut inner = self.lock();
        if inner.data.transfer.destination_wallet_id != wallet_id {
            // destination changed while the lookup was in flight
            return Err(Error::Cancelled);
        }
        match looked_up {
            Ok(wallet) => {
                let recipient = Recipient::from(&wallet);
                inner.data.transfer.verified_recipient = Some(recipient.clone());
                inner.data.destination_error = None;
                inner.state = FlowState::Verified;
                tracing::debug!("destination wallet verified");
                Ok(recipient)
            }
            Err(e) => {
                let (message, err) = match e.status() {
                    Some(400) | Some(404) => {
                        ("Wallet not found".to_string(), Error::not_found(wallet_id))
                    }
                    _ => (e.user_message(), e),
                };
                inner.data.transfer.verified_recipient = None;
                inner.data.destination_error = Some(message);
                inner.state = FlowState::DestinationEntered;
                Err(err)
            }
        }
    }

    /// Whether everything needed for the confirmation prompt is in place
    pub fn can_confirm(&self) -> bool {
        let inner = self.lock();
        self.prompt_for(&inner).is_ok()
    }

    fn prompt_for(&self, inner: &Inner) -> Result<ConfirmationPrompt> {
        if matches!(inner.state, FlowState::Submitting | FlowState::Idle) {
            return Err(Error::validation("Nothing to confirm"));
        }
        match self.kind {
            PaymentKind::Transfer => {
                let transfer = &inner.data.transfer;
                let payload = transfer.payload()?;
                let recipient = match (&transfer.verified_recipient, &inner.data.destination_error) {
                    (Some(recipient), None) => recipient,
                    _ => return Err(Error::validation("Destination wallet is not verified")),
                };
                Ok(ConfirmationPrompt::new(
                    "Confirm transfer",
                    format!(
                        "Send {} to {} ({})?",
                        display_amount(payload.amount, Some(&recipient.currency)),
                        recipient.name,
                        recipient.matricule
                    ),
                ))
            }
            PaymentKind::Withdrawal => {
                let withdrawal = &inner.data.withdrawal;
                let amount = withdrawal
                    .amount
                    .ok_or_else(|| Error::validation("Amount is required"))
                    .and_then(validate_amount)?;
                if withdrawal.phone.is_empty() {
                    return Err(Error::validation("Phone number is required"));
                }
                let currency = self
                    .api
                    .session()
                    .profile()
                    .and_then(|p| p.wallet)
                    .map(|w| w.currency);
                Ok(ConfirmationPrompt::new(
                    "Confirm withdrawal",
                    format!(
                        "Withdraw {} to {}?",
                        display_amount(amount, currency.as_deref()),
                        withdrawal.phone
                    ),
                ))
            }
        }
    }

    /// Ask the user; declining resets the flow without touching anything else
    pub async fn confirm(&self) -> Result<bool> {
        let prompt = {
            let inner = self.lock();
            self.prompt_for(&inner)?
        };

        if !self.confirmer.confirm(&prompt).await {
            tracing::debug!(kind = %self.kind, "confirmation declined");
            self.lock().reset();
            return Ok(false);
        }

        let mut inner = self.lock();
        if inner.state == FlowState::Idle {
            // dismissed while the prompt was open
            return Err(Error::Cancelled);
        }
        inner.state = FlowState::Confirmed;
        Ok(true)
    }

    pub fn enter_pin(&self, pin: Pin) -> Result<()> {
        let mut inner = self.lock();
        if !matches!(
            inner.state,
            FlowState::Confirmed | FlowState::PinEntered | FlowState::Failed
        ) {
            return Err(Error::validation("Confirm the operation before entering the PIN"));
        }
        inner.data.pin = Some(pin);
        inner.data.pin_error = None;
        inner.state = FlowState::PinEntered;
        Ok(())
    }

    pub async fn submit_with_pin(&self, pin: Pin) -> Result<SubmitOutcome> {
        self.enter_pin(pin)?;
        self.submit().await
    }

    /// Send the confirmed operation with the entered PIN
    ///
    /// Succeeds once per flow; a failure keeps the flow open for another
    /// attempt. [`PaymentFlow::dismiss`] aborts a submission in flight.
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        let (pin, cancel, prepared) = {
            let mut inner = self.lock();
            if !matches!(inner.state, FlowState::PinEntered | FlowState::Failed) {
                return Err(Error::validation("Nothing ready to submit"));
            }
            let Some(pin) = inner.data.pin.clone() else {
                return Err(Error::validation("PIN is required"));
            };
            let prepared = match self.kind {
                PaymentKind::Transfer => inner.data.transfer.payload().map(Submission::Transfer),
                PaymentKind::Withdrawal => Ok(Submission::Withdrawal(
                    inner.data.withdrawal.payload(0)?,
                )),
            }?;
            let cancel = CancellationToken::new();
            inner.data.cancel = Some(cancel.clone());
            inner.data.last_error = None;
            inner.data.pin_error = None;
            inner.state = FlowState::Submitting;
            (pin, cancel, prepared)
        };

        let request = async {
            match prepared {
                Submission::Transfer(payload) => {
                    self.api.transfer_funds(&payload, &pin).await.map(Some)
                }
                Submission::Withdrawal(mut payload) => {
                    payload.id_merchant = self.api.merchant_id().await?;
                    self.api.withdrawal_request(&payload, &pin).await.map(|_| None)
                }
            }
        };

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(kind = %self.kind, "submission cancelled");
                return Err(Error::Cancelled);
            }
            result = request => result,
        };
        drop(pin);

        let receipt = {
            let mut inner = self.lock();
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            match result {
                Ok(receipt) => {
                    inner.data = FlowData::default();
                    inner.state = FlowState::Success;
                    receipt
                }
                Err(e) => {
                    let e = classify_failure(e);
                    tracing::warn!(kind = %self.kind, error = %e, "submission failed");
                    if matches!(e, Error::InvalidPin(_)) {
                        inner.data.pin_error = Some(e.user_message());
                    } else {
                        inner.data.last_error = Some(e.user_message());
                    }
                    if self.clear_pin_on_failure {
                        inner.data.pin = None;
                    }
                    inner.data.cancel = None;
                    inner.state = FlowState::Failed;
                    if matches!(e, Error::Unauthorized) {
                        // the session is gone, nothing left to retry
                        inner.reset();
                    }
                    return Err(e);
                }
            }
        };
        tracing::info!(kind = %self.kind, "submission accepted");

        let board_reloaded = match self.board.reload().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "could not reload transactions after submission");
                false
            }
        };
        Ok(SubmitOutcome {
            kind: self.kind,
            receipt,
            board_reloaded,
        })
    }

    /// Close the flow: abort a submission in flight and forget everything
    pub fn dismiss(&self) {
        let mut inner = self.lock();
        if let Some(cancel) = inner.data.cancel.take() {
            cancel.cancel();
        }
        inner.reset();
    }
}

/// A rejected passcode comes back as 403, or as 400 naming the PIN
fn classify_failure(e: Error) -> Error {
    match e {
        Error::Api { status: 403, message } => Error::InvalidPin(message),
        Error::Api { status: 400, message } if mentions_pin(&message) => Error::InvalidPin(message),
        other => other,
    }
}

fn mentions_pin(message: &str) -> bool {
    message
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| matches!(word, "pin" | "pincode" | "passcode"))
}

fn display_amount(amount: Decimal, currency: Option<&str>) -> String {
    match currency.filter(|c| !c.is_empty()) {
        Some(currency) => format!("{} {}", amount.normalize(), currency),
        None => amount.normalize().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::MemoryStore;
    use crate::adapters::scripted::{Scripted, ScriptedConfirmer, ScriptedGateway};
    use crate::domain::Credentials;
    use crate::ports::Method;
    use crate::services::session::SessionStore;
    use crate::config::DEFAULT_PAGE_SIZE;

    const TRANSFER: &str = "/merchant/transfer-funds";
    const WITHDRAW: &str = "/merchant/withdrawal-request";
    const LIST: &str = "/merchant/transactions/42/all";

    fn setup(
        kind: PaymentKind,
        confirmer: Arc<ScriptedConfirmer>,
    ) -> (Arc<ScriptedGateway>, PaymentFlow) {
        let gateway = Arc::new(ScriptedGateway::new());
        let session = Arc::new(SessionStore::new(
            Arc::new(MemoryStore::new()),
            chrono::Duration::hours(24),
        ));
        session.establish(Credentials::new("tok", None)).unwrap();
        session
            .set_profile(
                serde_json::from_value(serde_json::json!({
                    "id": 7,
                    "merchant": { "id": 42 },
                    "wallet": { "id": 1, "currency": "XAF", "matricule": "SND-0001" }
                }))
                .unwrap(),
            )
            .unwrap();
        let api = Arc::new(SendoApi::new(gateway.clone(), session));
        let board = Arc::new(TransactionBoard::new(api.clone(), DEFAULT_PAGE_SIZE));
        gateway.on(
            Method::Get,
            LIST,
            Scripted::data(serde_json::json!({ "page": 1, "totalPages": 0, "totalItems": 0, "items": [] })),
        );
        (gateway, PaymentFlow::new(kind, api, board, confirmer))
    }

    fn flow(kind: PaymentKind, confirmer: ScriptedConfirmer) -> (Arc<ScriptedGateway>, PaymentFlow) {
        setup(kind, Arc::new(confirmer))
    }

    fn script_wallet(gateway: &ScriptedGateway) {
        gateway.on(
            Method::Get,
            "/wallet/SND-4421",
            Scripted::data(serde_json::json!({
                "id": 9,
                "matricule": "SND-4421",
                "currency": "XAF",
                "balance": 999999,
                "user": { "id": 3, "firstname": "Awa", "lastname": "Ndiaye", "email": "awa@example.com" }
            })),
        );
    }

    async fn confirmed_transfer(gateway: &ScriptedGateway, flow: &PaymentFlow) {
        script_wallet(gateway);
        flow.set_amount(Decimal::new(25000, 0)).unwrap();
        flow.verify_destination("SND-4421").await.unwrap();
        assert!(flow.confirm().await.unwrap());
    }

    #[tokio::test]
    async fn test_verified_transfer_succeeds() {
        let (gateway, flow) = flow(PaymentKind::Transfer, ScriptedConfirmer::accepting());
        gateway.on(
            Method::Post,
            TRANSFER,
            Scripted::data(serde_json::json!({ "transactionId": "TX-1" })),
        );
        confirmed_transfer(&gateway, &flow).await;

        let outcome = flow.submit_with_pin(Pin::new("1234").unwrap()).await.unwrap();
        assert_eq!(outcome.receipt.unwrap().transaction_id.as_deref(), Some("TX-1"));
        assert!(outcome.board_reloaded);
        assert_eq!(flow.state(), FlowState::Success);
        assert!(flow.recipient().is_none());
        assert!(!flow.has_pin());

        let calls = gateway.calls_to(Method::Post, TRANSFER);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].passcode.as_ref().unwrap().expose(), "1234");
        assert_eq!(calls[0].json.as_ref().unwrap()["toWallet"], "SND-4421");
    }

    #[tokio::test]
    async fn test_prompt_shows_recipient_not_balance() {
        let confirmer = Arc::new(ScriptedConfirmer::accepting());
        let (gateway, flow) = setup(PaymentKind::Transfer, confirmer.clone());
        confirmed_transfer(&gateway, &flow).await;

        let prompt = &confirmer.prompts()[0];
        assert_eq!(prompt.title, "Confirm transfer");
        assert!(prompt.message.contains("Awa Ndiaye"));
        assert!(prompt.message.contains("25000 XAF"));
        assert!(!prompt.message.contains("999999"));
    }

    #[tokio::test]
    async fn test_non_positive_amount_blocks_everything() {
        let (gateway, flow) = flow(PaymentKind::Transfer, ScriptedConfirmer::accepting());
        script_wallet(&gateway);
        flow.verify_destination("SND-4421").await.unwrap();

        assert!(flow.set_amount(Decimal::ZERO).is_err());
        assert!(flow.set_amount(Decimal::new(-10, 0)).is_err());
        assert!(!flow.can_confirm());
        assert!(flow.confirm().await.is_err());
        assert!(gateway.calls_to(Method::Post, TRANSFER).is_empty());
    }

    #[tokio::test]
    async fn test_unknown_wallet_blocks_confirmation() {
        let (gateway, flow) = flow(PaymentKind::Transfer, ScriptedConfirmer::accepting());
        gateway.on(Method::Get, "/wallet/NOPE", Scripted::fail(404, "Wallet not found"));
        flow.set_amount(Decimal::new(100, 0)).unwrap();

        let err = flow.verify_destination("NOPE").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(flow.destination_error().as_deref(), Some("Wallet not found"));
        assert!(!flow.can_confirm());
    }

    #[tokio::test]
    async fn test_empty_wallet_id_makes_no_call() {
        let (gateway, flow) = flow(PaymentKind::Transfer, ScriptedConfirmer::accepting());
        assert!(matches!(
            flow.verify_destination("   ").await,
            Err(Error::Validation(_))
        ));
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_declined_confirmation_resets() {
        let (gateway, flow) = flow(PaymentKind::Transfer, ScriptedConfirmer::declining());
        script_wallet(&gateway);
        flow.set_amount(Decimal::new(100, 0)).unwrap();
        flow.verify_destination("SND-4421").await.unwrap();

        assert!(!flow.confirm().await.unwrap());
        assert_eq!(flow.state(), FlowState::Idle);
        assert!(flow.recipient().is_none());
        // only the wallet lookup went out
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_pin_keeps_pin_and_allows_retry() {
        let (gateway, flow) = flow(PaymentKind::Transfer, ScriptedConfirmer::accepting());
        gateway
            .on(Method::Post, TRANSFER, Scripted::fail(400, "Invalid passcode"))
            .on(Method::Post, TRANSFER, Scripted::data(serde_json::json!({})));
        confirmed_transfer(&gateway, &flow).await;

        let err = flow.submit_with_pin(Pin::new("0000").unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPin(_)));
        assert_eq!(flow.state(), FlowState::Failed);
        assert!(flow.pin_error().is_some());
        assert!(flow.has_pin());

        flow.submit_with_pin(Pin::new("1234").unwrap()).await.unwrap();
        assert_eq!(gateway.calls_to(Method::Post, TRANSFER).len(), 2);
    }

    #[tokio::test]
    async fn test_clear_pin_on_failure() {
        let (gateway, flow) = flow(PaymentKind::Transfer, ScriptedConfirmer::accepting());
        let flow = flow.clear_pin_on_failure(true);
        gateway.on(Method::Post, TRANSFER, Scripted::fail(403, "Forbidden"));
        confirmed_transfer(&gateway, &flow).await;

        assert!(flow.submit_with_pin(Pin::new("0000").unwrap()).await.is_err());
        assert!(!flow.has_pin());
        assert!(matches!(flow.submit().await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_generic_failure_is_not_a_pin_error() {
        let (gateway, flow) = flow(PaymentKind::Transfer, ScriptedConfirmer::accepting());
        gateway.on(Method::Post, TRANSFER, Scripted::fail(400, "Insufficient balance"));
        confirmed_transfer(&gateway, &flow).await;

        let err = flow.submit_with_pin(Pin::new("1234").unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 400, .. }));
        assert!(flow.pin_error().is_none());
        assert_eq!(flow.last_error().as_deref(), Some("Insufficient balance"));
    }

    #[tokio::test]
    async fn test_withdrawal_skips_verification() {
        let (gateway, flow) = flow(PaymentKind::Withdrawal, ScriptedConfirmer::accepting());
        gateway.on(Method::Post, WITHDRAW, Scripted::data(serde_json::Value::Null));

        flow.set_destination("+237690000000");
        flow.set_amount(Decimal::new(5000, 0)).unwrap();
        assert!(flow.can_confirm());
        assert!(flow.confirm().await.unwrap());
        let outcome = flow.submit_with_pin(Pin::new("1234").unwrap()).await.unwrap();
        assert!(outcome.receipt.is_none());

        let call = &gateway.calls_to(Method::Post, WITHDRAW)[0];
        let body = call.json.as_ref().unwrap();
        assert_eq!(body["phone"], "+237690000000");
        assert_eq!(body["idMerchant"], 42);
        assert_eq!(body["amountToWithdraw"].as_f64(), Some(5000.0));
    }

    #[tokio::test]
    async fn test_dismiss_aborts_submission() {
        let (gateway, flow) = flow(PaymentKind::Transfer, ScriptedConfirmer::accepting());
        let flow = Arc::new(flow);
        gateway.on(Method::Post, TRANSFER, Scripted::Hang);
        confirmed_transfer(&gateway, &flow).await;
        flow.enter_pin(Pin::new("1234").unwrap()).unwrap();

        let task = {
            let flow = flow.clone();
            tokio::spawn(async move { flow.submit().await })
        };
        while flow.state() != FlowState::Submitting {
            tokio::task::yield_now().await;
        }
        assert!(flow.cancel_handle().is_some());
        flow.dismiss();

        assert!(matches!(task.await.unwrap(), Err(Error::Cancelled)));
        assert_eq!(flow.state(), FlowState::Idle);
        assert!(gateway.calls_to(Method::Get, LIST).is_empty());
    }

    #[tokio::test]
    async fn test_no_lookup_while_submitting() {
        let (gateway, flow) = flow(PaymentKind::Transfer, ScriptedConfirmer::accepting());
        let flow = Arc::new(flow);
        gateway.on(Method::Post, TRANSFER, Scripted::Hang);
        confirmed_transfer(&gateway, &flow).await;
        flow.enter_pin(Pin::new("1234").unwrap()).unwrap();

        let task = {
            let flow = flow.clone();
            tokio::spawn(async move { flow.submit().await })
        };
        while flow.state() != FlowState::Submitting {
            tokio::task::yield_now().await;
        }

        let err = flow.verify_destination("SND-4421").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(flow.state(), FlowState::Submitting);
        assert_eq!(gateway.calls_to(Method::Get, "/wallet/SND-4421").len(), 1);

        flow.dismiss();
        assert!(matches!(task.await.unwrap(), Err(Error::Cancelled)));
    }

    #[test]
    fn test_pin_failure_classification() {
        assert!(matches!(classify_failure(Error::api(403, "")), Error::InvalidPin(_)));
        assert!(matches!(
            classify_failure(Error::api(400, "Code PIN incorrect")),
            Error::InvalidPin(_)
        ));
        assert!(matches!(
            classify_failure(Error::api(400, "Shipping failed")),
            Error::Api { .. }
        ));
        assert!(matches!(classify_failure(Error::Unauthorized), Error::Unauthorized));
    }
}
