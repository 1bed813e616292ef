//! Client side of the portal session.
//!
//! [`ApiClient`] is the outbound request pipeline: it stamps the default
//! bearer header onto requests and runs response interceptors.
//! [`SessionStore`] owns the token and identity, persists the token through a
//! [`TokenStorage`], and ends the session on a 401 for its current token.

pub mod client;
pub mod error;
pub mod session;
pub mod storage;

pub use client::{ApiClient, Credentials, DEFAULT_TIMEOUT, ResponseInterceptor, ResponseOutcome};
pub use error::{ClientError, SessionError, StorageError};
pub use session::{Navigator, Session, SessionEvent, SessionPhase, SessionStore};
pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};
