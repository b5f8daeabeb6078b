//! Core domain entities
//!
//! Pure data structures with validation logic - no I/O. Everything the
//! server owns is read-only here; the only client-side rules are the ones
//! enforced before a request leaves (positive amounts, 4-digit PINs, file
//! checks).

mod admin;
mod envelope;
mod kyc;
mod payment;
mod session;
mod statistics;
mod transaction;
mod user;
mod wallet;
pub mod result;

pub use admin::{AssignRoles, NewUser, RemoveRole, Role, UserStatus};
pub use envelope::{envelope_status, open_envelope, Page};
pub use kyc::{KycDocumentType, KycFile, KycUploadResult, MAX_KYC_FILE_BYTES};
pub use payment::{
    validate_amount, Pin, TransferFundsPayload, TransferReceipt, TransferRequest,
    WithdrawalPayload, WithdrawalRequest, PIN_LENGTH,
};
pub use session::{Credentials, Session, SessionState};
pub use statistics::{
    DateRange, FeeTransactionRef, MerchantContact, MerchantOverview, MerchantStatistics,
    RecentFee, StatisticsSummary,
};
pub use transaction::{
    MerchantTransaction, MerchantTransactionPage, TransactionDetail, TransactionFilter,
    TransactionStatus,
};
pub use user::{MerchantRef, RoleRef, UserProfile, WalletSummary};
pub use wallet::{Recipient, Wallet, WalletUser};
