//! # Ranks
//!
//! The fixed rank chain an import walks, from the top of the imported
//! subtree down to the leaf.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A taxonomic level carried by each CSV row.
///
/// Declaration order is tree order: every rank's parent is the rank before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Order,
    Family,
    Genus,
    Species,
}

impl Rank {
    /// All ranks, parent before child.
    pub const ALL: [Rank; 4] = [Rank::Order, Rank::Family, Rank::Genus, Rank::Species];

    /// The rank's name, as used by the tree definition and the CSV header.
    pub fn as_str(self) -> &'static str {
        match self {
            Rank::Order => "Order",
            Rank::Family => "Family",
            Rank::Genus => "Genus",
            Rank::Species => "Species",
        }
    }

    /// Whether this is the leaf rank, where authors and synonyms apply.
    pub fn is_leaf(self) -> bool {
        self == Rank::Species
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_iterate_parent_first() {
        let mut sorted = Rank::ALL;
        sorted.sort();
        assert_eq!(sorted, Rank::ALL);
        assert_eq!(Rank::ALL.first(), Some(&Rank::Order));
        assert_eq!(Rank::ALL.last(), Some(&Rank::Species));
    }

    #[test]
    fn only_species_is_leaf() {
        let leaves: Vec<Rank> = Rank::ALL.into_iter().filter(|r| r.is_leaf()).collect();
        assert_eq!(leaves, vec![Rank::Species]);
    }

    #[test]
    fn display_matches_tree_names() {
        assert_eq!(Rank::Family.to_string(), "Family");
    }
}
