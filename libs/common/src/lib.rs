//! Common library for the Clover Books roles client
//!
//! This crate provides the pieces every Clover Books API consumer shares:
//! configuration, the error taxonomy, CSRF token handling, the HTTP client
//! and the session-wide authentication context.

pub mod auth;
pub mod config;
pub mod csrf;
pub mod error;
pub mod http;

pub use auth::{AuthContext, AuthProvider, AuthSnapshot, AuthUser};
pub use config::ApiConfig;
pub use error::{ClientError, ClientResult};
pub use http::{ApiClient, ApiResponse};

/// Example usage of the API client
///
/// ```rust,no_run
/// use common::{ApiClient, ApiConfig, AuthProvider};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ApiConfig::from_env()?;
///     let client = ApiClient::new(&config)?;
///     let auth = AuthProvider::init(client.clone()).await;
///     println!("Signed in: {}", auth.current().authenticated);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
