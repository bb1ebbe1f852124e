//! Block: one immutable, hash-linked entry in the ledger.
//!
//! A block is finalized (height, timestamp, previous hash, hash) exactly once
//! by [`Block::seal`] and never edited afterwards.

use serde::{Deserialize, Serialize};

use crate::canonical::digest_bytes;
use crate::error::{CoreError, Result};
use crate::story;
use crate::types::BlockHash;

/// Star coordinates and story, as registered by an address.
///
/// `story` holds the *encoded* form; see [`Star::decoded_story`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Star {
    /// Right ascension.
    pub ra: String,
    /// Declination.
    pub dec: String,
    /// Hex-encoded story.
    pub story: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constellation: Option<String>,
}

impl Star {
    /// Build a star from a plain-text story, checking it and encoding it.
    pub fn new(ra: impl Into<String>, dec: impl Into<String>, story_text: &str) -> Result<Self> {
        story::check(story_text)?;
        let star = Self {
            ra: ra.into(),
            dec: dec.into(),
            story: story::encode(story_text),
            magnitude: None,
            constellation: None,
        };
        star.validate()?;
        Ok(star)
    }

    /// Set the magnitude.
    pub fn magnitude(mut self, magnitude: impl Into<String>) -> Self {
        self.magnitude = Some(magnitude.into());
        self
    }

    /// Set the constellation.
    pub fn constellation(mut self, constellation: impl Into<String>) -> Self {
        self.constellation = Some(constellation.into());
        self
    }

    /// Decode the stored story.
    pub fn decoded_story(&self) -> Result<String> {
        story::decode(&self.story)
    }

    /// Check required fields and the encoded story.
    pub fn validate(&self) -> Result<()> {
        if self.ra.trim().is_empty() {
            return Err(CoreError::InvalidStar("ra is required".into()));
        }
        if self.dec.trim().is_empty() {
            return Err(CoreError::InvalidStar("dec is required".into()));
        }
        let text = self.decoded_story()?;
        story::check(&text)
    }
}

/// A star registered under a wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarRecord {
    pub address: String,
    pub star: Star,
}

/// Application payload of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum BlockBody {
    /// Free-form text. Not identity-gated.
    Note(String),
    /// Identity-gated star registration.
    Star(StarRecord),
}

impl BlockBody {
    /// Shorthand for a star body.
    pub fn star(address: impl Into<String>, star: Star) -> Self {
        Self::Star(StarRecord {
            address: address.into(),
            star,
        })
    }

    /// The identity this body is written under, if any.
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Note(_) => None,
            Self::Star(record) => Some(&record.address),
        }
    }

    /// Boundary checks applied before a body may enter the ledger.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Note(text) if text.is_empty() => {
                Err(CoreError::MalformedBlock("note body is empty".into()))
            }
            Self::Note(_) => Ok(()),
            Self::Star(record) => {
                if record.address.trim().is_empty() {
                    return Err(CoreError::InvalidStar("address is required".into()));
                }
                record.star.validate()
            }
        }
    }
}

/// A finalized block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Index in the chain; genesis is 0.
    pub height: u64,
    /// Seconds since the Unix epoch, assigned at append.
    pub timestamp: i64,
    /// Hash of the block at `height - 1`; `None` for genesis.
    pub previous_hash: Option<BlockHash>,
    pub body: BlockBody,
    /// SHA-256 of the canonical bytes with this field blanked.
    pub hash: BlockHash,
}

impl Block {
    /// Finalize a block, computing its hash.
    pub fn seal(
        height: u64,
        timestamp: i64,
        previous_hash: Option<BlockHash>,
        body: BlockBody,
    ) -> Self {
        let mut block = Self {
            height,
            timestamp,
            previous_hash,
            body,
            hash: BlockHash::from_bytes([0u8; 32]),
        };
        block.hash = block.compute_hash();
        block
    }

    /// Recompute the digest of this block's content.
    pub fn compute_hash(&self) -> BlockHash {
        BlockHash::digest(&digest_bytes(self))
    }

    /// Whether the stored hash matches the content.
    pub fn verify_hash(&self) -> bool {
        self.compute_hash() == self.hash
    }

    /// Whether this block is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.previous_hash.is_none()
    }

    /// The identity this block was written under, if any.
    pub fn address(&self) -> Option<&str> {
        self.body.address()
    }

    /// Presentation form with the story decoded.
    ///
    /// The block itself keeps the encoded story.
    pub fn view(&self) -> BlockView {
        let story_decoded = match &self.body {
            BlockBody::Star(record) => record.star.decoded_story().ok(),
            BlockBody::Note(_) => None,
        };
        BlockView {
            block: self.clone(),
            story_decoded,
        }
    }
}

/// A stored block as presented to readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockView {
    #[serde(flatten)]
    pub block: Block,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_decoded: Option<String>,
}
