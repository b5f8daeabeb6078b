//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area and shares the session
//! through an `Arc<SessionStore>`.

mod admin;
pub mod api;
mod auth;
mod kyc;
pub mod logging;
pub mod session;
pub mod transactions;
pub mod transfer;

pub use admin::AdminService;
pub use api::SendoApi;
pub use auth::AuthService;
pub use kyc::KycService;
pub use logging::{EntryPoint, EventCount, LogEntry, LogEvent, LoggingService};
pub use session::SessionStore;
pub use transactions::{BoardSnapshot, TransactionBoard};
pub use transfer::{FlowState, PaymentFlow, PaymentKind, SubmitOutcome};
