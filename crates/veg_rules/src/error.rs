//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias.
//! Variants cover structural misuse of the rule graph: out-of-range rule, link,
//! slot, or variation indices, wrongly-directed slots, duplicate connections,
//! and links that would close a cycle. Numeric edge cases during evaluation are
//! never errors; they have defined fallback values.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("rule index {index} out of range")]
    RuleIndexOutOfRange { index: usize },

    #[error("link index {index} out of range")]
    LinkIndexOutOfRange { index: usize },

    #[error("variation index {index} out of range")]
    VariationIndexOutOfRange { index: usize },

    #[error("rule {rule} has no slot {slot}")]
    SlotIndexOutOfRange { rule: usize, slot: usize },

    #[error("slot {slot} on rule {rule} is not an output slot")]
    NotAnOutputSlot { rule: usize, slot: usize },

    #[error("slot {slot} on rule {rule} is not an input slot")]
    NotAnInputSlot { rule: usize, slot: usize },

    #[error("link from rule {source_rule} to rule {destination_rule} would close a cycle")]
    LinkWouldCycle {
        source_rule: usize,
        destination_rule: usize,
    },

    #[error("duplicate link from ({source_rule}, {source_slot}) to ({destination_rule}, {destination_slot})")]
    DuplicateLink {
        source_rule: usize,
        source_slot: usize,
        destination_rule: usize,
        destination_slot: usize,
    },

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn messages_name_the_offending_indices() {
        let err = Error::SlotIndexOutOfRange { rule: 3, slot: 7 };
        assert_eq!(err.to_string(), "rule 3 has no slot 7");

        let err = Error::LinkWouldCycle {
            source_rule: 1,
            destination_rule: 2,
        };
        assert_eq!(
            err.to_string(),
            "link from rule 1 to rule 2 would close a cycle"
        );
    }
}
