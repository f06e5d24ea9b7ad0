//! Bearer-token authentication for Copilot Studio requests.
//!
//! Provides:
//! - Entra ID token acquisition with the client-credentials grant
//!   (service-to-service) or the username/password grant (interactive user)
//! - A per-scope token cache with a refresh buffer
//! - [`AuthenticatingTransport`], which attaches `Authorization: Bearer`
//!   to every request before forwarding it

pub mod client;
pub mod error;
pub mod oauth;
pub mod pipeline;
pub mod token_cache;
pub mod transport;

pub use client::{AuthClient, ConfidentialClient, PublicClient, SharedTokenProvider, TokenProvider};
pub use error::{AuthError, Result, SendError};
pub use oauth::{AccessToken, Authority};
pub use pipeline::AuthenticatingTransport;
pub use token_cache::{CachingTokenProvider, REFRESH_BUFFER};
pub use transport::{SharedTransport, Transport};
