//! # Resource URIs
//!
//! Every record served by the API is addressed as `/api/specify/<table>/<id>/`.
//! Independent to-one relationships are serialized as these URIs, so the
//! import walks the tree by parsing and building them.

use crate::{Error, Result};

/// Prefix shared by every resource URI.
pub const API_PREFIX: &str = "/api/specify/";

/// Return the table name and, when present, the id from a resource URI.
///
/// Accepts both `/api/specify/taxon/12/` and the collection form
/// `/api/specify/taxon/`.
pub fn parse_uri(uri: &str) -> Result<(String, Option<i64>)> {
    let bad = || Error::BadUri(uri.to_string());

    let rest = uri.strip_prefix(API_PREFIX).ok_or_else(bad)?;
    let (table, tail) = rest.split_once('/').ok_or_else(bad)?;

    if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(bad());
    }

    if tail.is_empty() {
        return Ok((table.to_string(), None));
    }

    let digits = tail.strip_suffix('/').unwrap_or(tail);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad());
    }
    let id = digits.parse::<i64>().map_err(|_| bad())?;

    Ok((table.to_string(), Some(id)))
}

/// Extract the record id from a resource URI.
pub fn extract_id(uri: &str) -> Result<i64> {
    match parse_uri(uri)? {
        (_, Some(id)) => Ok(id),
        (_, None) => Err(Error::BadUri(uri.to_string())),
    }
}

/// Build the resource URI of the record `id` in `table`.
pub fn api_link(table: &str, id: i64) -> String {
    format!("{}{}/{}/", API_PREFIX, table.to_lowercase(), id)
}

/// Build the collection endpoint of `table`, used for create and query.
pub fn collection_endpoint(table: &str) -> String {
    format!("{}{}/", API_PREFIX, table.to_lowercase())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_resource_uri() {
        let (table, id) = parse_uri("/api/specify/taxon/42/").unwrap();
        assert_eq!(table, "taxon");
        assert_eq!(id, Some(42));
    }

    #[test]
    fn parse_collection_uri() {
        let (table, id) = parse_uri("/api/specify/taxontreedefitem/").unwrap();
        assert_eq!(table, "taxontreedefitem");
        assert_eq!(id, None);
    }

    #[test]
    fn parse_rejects_foreign_paths() {
        assert!(parse_uri("/context/login/").is_err());
        assert!(parse_uri("/api/specify/").is_err());
        assert!(parse_uri("/api/specify/taxon/abc/").is_err());
        assert!(parse_uri("api/specify/taxon/1/").is_err());
    }

    #[test]
    fn extract_id_requires_an_id() {
        assert_eq!(extract_id("/api/specify/discipline/3/").unwrap(), 3);
        assert!(matches!(
            extract_id("/api/specify/discipline/"),
            Err(Error::BadUri(_))
        ));
    }

    #[test]
    fn api_link_lowercases_table() {
        assert_eq!(api_link("TaxonTreeDef", 1), "/api/specify/taxontreedef/1/");
        assert_eq!(collection_endpoint("RecordSet"), "/api/specify/recordset/");
    }

    proptest! {
        #[test]
        fn links_parse_back(table in "[a-z][a-z0-9_]{0,20}", id in 0i64..=i64::MAX) {
            let link = api_link(&table, id);
            let (parsed_table, parsed_id) = parse_uri(&link).unwrap();
            prop_assert_eq!(parsed_table, table);
            prop_assert_eq!(parsed_id, Some(id));
        }
    }
}
