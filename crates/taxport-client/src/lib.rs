//! # taxport-client - The Kit
//!
//! HTTP session for the Specify 7 REST API.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use taxport_client::{Scope, SpecifySession};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), taxport_client::Error> {
//!     let mut session = SpecifySession::connect("https://sp7demofish.specifycloud.org").await?;
//!     let collection_id = session.collection_id("KUFishvoucher").unwrap_or_default();
//!     session.login("sp7demofish", "sp7demofish", collection_id).await?;
//!
//!     let discipline_id = session.domain_id(Scope::Discipline).unwrap_or_default();
//!     let discipline = session.fetch_resource("discipline", discipline_id).await?;
//!     println!("Tree: {:?}", discipline.get("taxontreedef"));
//!
//!     session.logout().await
//! }
//! ```
//!
//! ## Session Flow
//!
//! ```text
//! GET  /context/login/      csrftoken cookie + collection names
//! PUT  /context/login/      credentials + collection id
//! GET  /context/user.json   current Specify user
//! GET  /api/specify/<t>/<id>/            fetch
//! GET  /api/specify/<t>/?field=value     query (first page)
//! POST /api/specify/<t>/                 create
//! PUT  /api/specify/<t>/<id>/            update (fetch + merge + put)
//! ```

mod session;

pub use session::{RequestMethod, Scope, SpecifySession};

use thiserror::Error;

// =============================================================================
// ERROR TYPE
// =============================================================================

/// Errors from the Specify session.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A served record was not shaped as expected.
    #[error("Record error: {0}")]
    Record(#[from] taxport_core::Error),

    /// The request method is not one of GET, PUT, POST, DELETE.
    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    /// The server did not hand out a CSRF token.
    #[error("No csrftoken cookie in response")]
    MissingCsrfToken,

    /// A resource operation was attempted before logging in.
    #[error("Must be logged in")]
    NotLoggedIn,

    /// Login was refused (HTTP 403).
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The server rejected the request as malformed (HTTP 400).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The user lacks permission for the resource (HTTP 403).
    #[error("No permission: {0}")]
    NoPermission(String),

    /// An update omitted the record version (HTTP 400).
    #[error("Resource version needs to be included: {0}")]
    MissingVersion(String),

    /// An update was based on a stale record version (HTTP 409).
    #[error("Version mismatch: {0}")]
    VersionMismatch(String),

    /// Any other unexpected status code.
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;
