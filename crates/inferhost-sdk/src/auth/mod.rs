//! IAM login, session refresh and the on-disk refresh-token cache.

pub mod credential_store;
pub mod session;
pub mod token;

pub use credential_store::CredentialStore;
pub use session::{AuthProvider, IamClient, OtpProvider, Session, MAX_OTP_ATTEMPTS};
