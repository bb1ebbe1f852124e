//! Proptest generators for property-based testing.

use proptest::prelude::*;

use starchain_core::story::MAX_STORY_BYTES;
use starchain_core::{BlockBody, Keypair, Star};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate an address (hex Ed25519 public key).
pub fn address() -> impl Strategy<Value = String> {
    keypair().prop_map(|kp| kp.address())
}

/// Generate a story that passes the length and charset checks.
///
/// Printable ASCII only, so every character is one byte and any string up to
/// the byte limit stays under the word limit too.
pub fn story() -> impl Strategy<Value = String> {
    prop::collection::vec(b' '..=b'~', 0..=MAX_STORY_BYTES)
        .prop_map(|bytes| bytes.into_iter().map(char::from).collect())
}

/// Generate a right ascension such as `16h 29m 1.0s`.
pub fn right_ascension() -> impl Strategy<Value = String> {
    (0u8..24, 0u8..60, 0u8..60, 0u8..10)
        .prop_map(|(h, m, s, frac)| format!("{}h {}m {}.{}s", h, m, s, frac))
}

/// Generate a declination such as `-26d 29' 24.9`.
pub fn declination() -> impl Strategy<Value = String> {
    (-90i8..=90, 0u8..60, 0u8..60, 0u8..10)
        .prop_map(|(d, m, s, frac)| format!("{}d {}' {}.{}", d, m, s, frac))
}

/// Generate a valid star, optionally with magnitude and constellation.
pub fn star() -> impl Strategy<Value = Star> {
    (
        right_ascension(),
        declination(),
        story(),
        proptest::option::of("[0-9]\\.[0-9]{1,2}"),
        proptest::option::of("[A-Z][a-z]{2,15}"),
    )
        .prop_filter_map("star must validate", |(ra, dec, text, magnitude, constellation)| {
            let mut star = Star::new(ra, dec, &text).ok()?;
            star.magnitude = magnitude;
            star.constellation = constellation;
            Some(star)
        })
}

/// Generate a non-empty note.
pub fn note() -> impl Strategy<Value = String> {
    "[ -~]{1,64}".prop_map(String::from)
}

/// Generate any body the registrar accepts.
pub fn body() -> impl Strategy<Value = BlockBody> {
    prop_oneof![
        note().prop_map(BlockBody::Note),
        (address(), star()).prop_map(|(address, star)| BlockBody::star(address, star)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use starchain_core::story as story_codec;
    use starchain_core::{canonical_bytes, decode_block, Block};

    proptest! {
        #[test]
        fn test_generated_stories_pass_checks(text in story()) {
            prop_assert!(story_codec::check(&text).is_ok());
            prop_assert_eq!(story_codec::decode(&story_codec::encode(&text)).unwrap(), text);
        }

        #[test]
        fn test_generated_bodies_validate(body in body()) {
            prop_assert!(body.validate().is_ok());
        }

        #[test]
        fn test_sealed_blocks_decode_to_themselves(body in body(), height in 0u64..1_000, ts in 0i64..2_000_000_000) {
            let block = Block::seal(height, ts, None, body);
            let decoded = decode_block(&canonical_bytes(&block)).unwrap();
            prop_assert!(decoded.verify_hash());
            prop_assert_eq!(decoded, block);
        }
    }
}
