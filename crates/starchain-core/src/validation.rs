//! Chain integrity checks.
//!
//! These are diagnostics: they report problems and never repair them.

use serde::Serialize;

use crate::block::Block;

/// Why a height was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityErrorKind {
    /// Stored hash does not match the recomputed digest.
    HashMismatch,
    /// Stored bytes could not be decoded into a block.
    Undecodable,
    /// `block[h].hash != block[h + 1].previous_hash`, or either side unreadable.
    BrokenLink,
}

/// One failed check at one height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntegrityError {
    pub height: u64,
    pub kind: IntegrityErrorKind,
}

/// Result of a full chain scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    /// Number of blocks scanned.
    pub length: u64,
    /// Failures in scan order. A height may appear once per failed check.
    pub errors: Vec<IntegrityError>,
}

impl ChainReport {
    /// True if no check failed.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Offending heights in report order, not deduplicated.
    pub fn offending_heights(&self) -> Vec<u64> {
        self.errors.iter().map(|e| e.height).collect()
    }
}

/// Whether `block` carries the digest of its own content.
pub fn validate_block(block: &Block) -> bool {
    block.verify_hash()
}

/// Whether `next` links to `prev`.
pub fn check_link(prev: &Block, next: &Block) -> bool {
    next.previous_hash == Some(prev.hash)
}

/// Check every stored block but the last for a valid hash and a valid link
/// to the block after it.
///
/// `blocks` holds `(store key, block)` pairs in key order; `None` marks bytes
/// that failed to decode. Errors are reported against the store key. The tip
/// is only reached through its predecessor's link check.
pub fn validate_chain(blocks: &[(u64, Option<Block>)]) -> ChainReport {
    let mut errors = Vec::new();

    for pair in blocks.windows(2) {
        let (height, current) = (pair[0].0, &pair[0].1);

        match current {
            Some(block) if validate_block(block) => {}
            Some(_) => errors.push(IntegrityError {
                height,
                kind: IntegrityErrorKind::HashMismatch,
            }),
            None => errors.push(IntegrityError {
                height,
                kind: IntegrityErrorKind::Undecodable,
            }),
        }

        let linked = match (current, &pair[1].1) {
            (Some(prev), Some(next)) => check_link(prev, next),
            _ => false,
        };
        if !linked {
            errors.push(IntegrityError {
                height,
                kind: IntegrityErrorKind::BrokenLink,
            });
        }
    }

    ChainReport {
        length: blocks.len() as u64,
        errors,
    }
}
