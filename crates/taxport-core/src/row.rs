//! # CSV Row Model
//!
//! One row names a Species and its Order/Family/Genus ancestry. Synonym rows
//! also name the accepted Genus/Species the synonym points to.

use crate::{Error, Rank, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// The `isAccepted` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Acceptance {
    /// The row's species is itself the accepted name.
    Accepted,
    /// The row's species is a synonym of `AcceptedGenus AcceptedSpecies`.
    Synonym,
}

impl FromStr for Acceptance {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("yes") {
            Ok(Acceptance::Accepted)
        } else if trimmed.eq_ignore_ascii_case("no") {
            Ok(Acceptance::Synonym)
        } else {
            Err(Error::InvalidAcceptance(s.to_string()))
        }
    }
}

impl<'de> Deserialize<'de> for Acceptance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A single taxon row, as read from the import CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonRow {
    #[serde(rename = "Order")]
    pub order: String,
    #[serde(rename = "Family")]
    pub family: String,
    #[serde(rename = "Genus")]
    pub genus: String,
    #[serde(rename = "Species")]
    pub species: String,
    #[serde(rename = "isAccepted")]
    pub acceptance: Acceptance,
    #[serde(rename = "Author", default, deserialize_with = "empty_as_none")]
    pub author: Option<String>,
    #[serde(rename = "AcceptedGenus", default)]
    pub accepted_genus: String,
    #[serde(rename = "AcceptedSpecies", default)]
    pub accepted_species: String,
    #[serde(rename = "AcceptedAuthor", default, deserialize_with = "empty_as_none")]
    pub accepted_author: Option<String>,
}

impl TaxonRow {
    /// The taxon name this row gives for `rank`.
    pub fn name_at(&self, rank: Rank) -> &str {
        match rank {
            Rank::Order => &self.order,
            Rank::Family => &self.family,
            Rank::Genus => &self.genus,
            Rank::Species => &self.species,
        }
    }

    /// Whether the row's species is the accepted name.
    pub fn is_accepted(&self) -> bool {
        self.acceptance == Acceptance::Accepted
    }
}

fn empty_as_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}
