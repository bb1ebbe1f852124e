//! Story encoding.
//!
//! Star stories are persisted hex-encoded and decoded only for presentation.
//! Stories must be printable ASCII, at most [`MAX_STORY_BYTES`] bytes and
//! [`MAX_STORY_WORDS`] words.

use crate::error::{CoreError, Result};

/// Maximum story length in bytes.
pub const MAX_STORY_BYTES: usize = 500;

/// Maximum story length in whitespace-separated words.
pub const MAX_STORY_WORDS: usize = 250;

/// Encode a story for storage.
pub fn encode(story: &str) -> String {
    hex::encode(story.as_bytes())
}

/// Decode a stored story.
pub fn decode(encoded: &str) -> Result<String> {
    let bytes = hex::decode(encoded).map_err(|e| CoreError::InvalidStory(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CoreError::InvalidStory(e.to_string()))
}

/// Check a plain-text story against the length and charset limits.
pub fn check(story: &str) -> Result<()> {
    if story.len() > MAX_STORY_BYTES {
        return Err(CoreError::InvalidStory(format!(
            "story is {} bytes, limit is {}",
            story.len(),
            MAX_STORY_BYTES
        )));
    }

    let words = story.split_whitespace().count();
    if words > MAX_STORY_WORDS {
        return Err(CoreError::InvalidStory(format!(
            "story has {} words, limit is {}",
            words, MAX_STORY_WORDS
        )));
    }

    if let Some(c) = story.chars().find(|c| !is_printable(*c)) {
        return Err(CoreError::InvalidStory(format!(
            "non-printable character {:?}",
            c
        )));
    }

    Ok(())
}

fn is_printable(c: char) -> bool {
    matches!(c, ' '..='~')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_is_hex() {
        assert_eq!(encode("Hi"), "4869");
        assert_eq!(decode("4869").unwrap(), "Hi");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode("zz"), Err(CoreError::InvalidStory(_))));
        // valid hex, invalid UTF-8
        assert!(matches!(decode("ff"), Err(CoreError::InvalidStory(_))));
    }

    #[test]
    fn test_check_limits() {
        assert!(check("Found star using https://www.google.com/sky/").is_ok());
        assert!(check(&"a".repeat(MAX_STORY_BYTES)).is_ok());
        assert!(check(&"a".repeat(MAX_STORY_BYTES + 1)).is_err());
        assert!(check(&"a ".repeat(MAX_STORY_WORDS + 1)).is_err());
        assert!(check("tab\there").is_err());
        assert!(check("caf\u{e9}").is_err());
    }

    proptest! {
        #[test]
        fn story_roundtrip(story in "[ -~]{0,500}") {
            let encoded = encode(&story);
            prop_assert_eq!(decode(&encoded).unwrap(), story);
        }
    }
}
