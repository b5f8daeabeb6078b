//! Sendo Core - client logic for the Sendo merchant platform
//!
//! This crate implements the client side following hexagonal architecture:
//!
//! - **domain**: Server records and client-side request forms (Transaction, Wallet, Pin, etc.)
//! - **ports**: Trait definitions for external dependencies (ApiGateway, KeyValueStore, Confirmer)
//! - **services**: Session, transaction board, payment flow, admin, KYC, event log
//! - **adapters**: Concrete implementations (reqwest, JSON file store, scripted doubles)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::file_store::JsonFileStore;
use adapters::http::HttpGateway;
use config::Config;
use ports::{ApiGateway, Confirmer, KeyValueStore};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use services::{EntryPoint, LogEvent, LoggingService};
pub use domain::{
    MerchantTransaction, Pin, Recipient, SessionState, TransactionFilter, TransactionStatus,
    UserProfile,
};

/// Main context for Sendo operations
///
/// Wires one session store into every service. Cheap to share: the
/// services that outlive a single call are behind `Arc`.
pub struct SendoContext {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub api: Arc<SendoApi>,
    pub auth: Arc<AuthService>,
    pub board: Arc<TransactionBoard>,
    pub admin: AdminService,
    pub kyc: KycService,
}

impl SendoContext {
    /// Context over the real API, with the session persisted in `sendo_dir`
    pub fn new(sendo_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(sendo_dir).with_context(|| {
            format!("Failed to create Sendo directory {}", sendo_dir.display())
        })?;
        let config = Config::load(sendo_dir)?;

        let gateway = HttpGateway::new(&config.api_url, config.request_timeout())?;
        let store = JsonFileStore::new(sendo_dir);

        Ok(Self::with_parts(config, Arc::new(gateway), Arc::new(store))?)
    }

    /// Context over any gateway and store (scripted doubles in tests)
    pub fn with_parts(
        config: Config,
        gateway: Arc<dyn ApiGateway>,
        store: Arc<dyn KeyValueStore>,
    ) -> domain::result::Result<Self> {
        let session = Arc::new(SessionStore::rehydrate(store, config.session_ttl())?);
        let api = Arc::new(SendoApi::with_auth_path(
            gateway,
            Arc::clone(&session),
            config.auth_path.clone(),
        ));
        let auth = Arc::new(AuthService::new(Arc::clone(&api), Arc::clone(&session)));
        let board = Arc::new(TransactionBoard::new(Arc::clone(&api), config.page_size));
        let admin = AdminService::new(Arc::clone(&api));
        let kyc = KycService::new(Arc::clone(&api));

        Ok(Self {
            config,
            session,
            api,
            auth,
            board,
            admin,
            kyc,
        })
    }

    pub fn transfer_flow(&self, confirmer: Arc<dyn Confirmer>) -> PaymentFlow {
        self.payment_flow(PaymentKind::Transfer, confirmer)
    }

    pub fn withdrawal_flow(&self, confirmer: Arc<dyn Confirmer>) -> PaymentFlow {
        self.payment_flow(PaymentKind::Withdrawal, confirmer)
    }

    fn payment_flow(&self, kind: PaymentKind, confirmer: Arc<dyn Confirmer>) -> PaymentFlow {
        PaymentFlow::new(kind, Arc::clone(&self.api), Arc::clone(&self.board), confirmer)
            .clear_pin_on_failure(self.config.clear_pin_on_failure)
    }
}
