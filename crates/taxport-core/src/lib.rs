//! # taxport-core
//!
//! Taxon import rules for a Specify collections database.
//!
//! Records are reached only through the [`ResourceStore`] trait, so the same
//! rules run against the live REST session (`taxport-client`) and against
//! [`MemoryStore`] in tests.
//!
//! ```text
//!  CSV row ──► TaxonResolver ──► Order ─► Family ─► Genus ─► Species
//!                   │                                          │
//!                   └── accepted_uri (synonyms) ◄──────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod rank;
pub mod record;
pub mod recordset;
pub mod resolver;
pub mod row;
pub mod store;
pub mod taxon;
pub mod tree;
pub mod uri;

pub use error::{Error, Result};
pub use memory::{Call, MemoryStore};
pub use rank::Rank;
pub use record::{Record, RecordExt, record_from};
pub use recordset::{RecordSetSpec, TAXON_TABLE_ID, create_recordset};
pub use resolver::{RowOutcome, TaxonAction, TaxonResolver};
pub use row::{Acceptance, TaxonRow};
pub use store::{Filter, ResourceStore};
pub use tree::{TaxonTree, TreeAnchor, TreeDefItem};
pub use uri::{api_link, collection_endpoint, extract_id, parse_uri};
