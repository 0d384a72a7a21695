//! # Configuration
//!
//! Resolved settings for a run. Values come from command line flags, with
//! `TAXPORT_*` environment variables as fallbacks (see [`crate::cli`]).

use std::fmt;
use std::path::PathBuf;
use taxport_core::TreeAnchor;

/// Log file written next to the working directory by default.
pub const DEFAULT_LOG_FILE: &str = "importlog.txt";

/// CSV read when `--csv` is not given.
pub const DEFAULT_CSV_FILE: &str = "taxon_to_import.csv";

/// Name of the record set holding the imported species.
pub const DEFAULT_RECORDSET_NAME: &str = "Imported Species";

/// Where and as whom to log in.
#[derive(Clone)]
pub struct LoginConfig {
    pub domain: String,
    pub collection: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginConfig")
            .field("domain", &self.domain)
            .field("collection", &self.collection)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything an import run needs.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub login: LoginConfig,
    pub csv_path: PathBuf,
    pub log_file: PathBuf,
    pub recordset_name: String,
    pub anchor: TreeAnchor,
    pub remarks: String,
    /// Print the run report as JSON instead of text.
    pub json: bool,
}
