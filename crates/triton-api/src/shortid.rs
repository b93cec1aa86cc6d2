//! UUIDs and short ids.
//!
//! A short id is a lowercase hex prefix of a UUID, with or without the
//! `8-4-4-4-12` dashes. Undashed prefixes up to 32 characters are re-dashed
//! so they can be compared with `id.starts_with(..)`; longer ones (Docker
//! container ids) are kept as they are.

use once_cell::sync::Lazy;
use regex::Regex;

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .unwrap_or_else(|_| unreachable!())
});

/// Character offsets of the dashes in a canonical UUID.
const DASH_OFFSETS: [usize; 4] = [8, 13, 18, 23];

/// Hex digits preceding each dash of a canonical UUID.
const HEX_BEFORE_DASH: [usize; 4] = [8, 12, 16, 20];

/// Length of a canonical UUID.
pub const UUID_LEN: usize = 36;

/// Number of hex digits in a UUID.
const UUID_HEX_LEN: usize = 32;

/// True for a canonical lowercase 36-character UUID.
#[must_use]
pub fn is_uuid(s: &str) -> bool {
    UUID_REGEX.is_match(s)
}

/// Normalizes a short id for prefix matching.
///
/// Dashes may be given for some groups and left out for others
/// (`b4f0b46c-11114222`); each one present must sit on a group boundary.
/// Returns an empty string when `s` cannot be a UUID prefix.
#[must_use]
pub fn normalize_short_id(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }

    if s.contains('-') {
        let mut hex = String::with_capacity(UUID_HEX_LEN);
        let mut prev_dash = false;
        for c in s.chars() {
            if c == '-' {
                if prev_dash || !HEX_BEFORE_DASH.contains(&hex.len()) {
                    return String::new();
                }
                prev_dash = true;
            } else {
                hex.push(c);
                prev_dash = false;
            }
        }
        if hex.len() > UUID_HEX_LEN || !hex.chars().all(is_lower_hex) {
            return String::new();
        }
        return redash(&hex);
    }

    if !s.chars().all(is_lower_hex) {
        return String::new();
    }
    if s.len() > UUID_HEX_LEN {
        return s.to_string();
    }
    redash(s)
}

/// Inserts dashes at the canonical offsets of a hex prefix.
fn redash(hex: &str) -> String {
    let mut out = String::with_capacity(UUID_LEN);
    for c in hex.chars() {
        if DASH_OFFSETS.contains(&out.len()) {
            out.push('-');
        }
        out.push(c);
    }
    out
}

fn is_lower_hex(c: char) -> bool {
    c.is_ascii_digit() || ('a'..='f').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("b4f0b46c", "b4f0b46c" ; "first group")]
    #[test_case("b4f0b46c1", "b4f0b46c-1" ; "crosses first dash")]
    #[test_case("b4f0b46c11114222", "b4f0b46c-1111-4222" ; "three groups")]
    #[test_case("b4f0b46c-11", "b4f0b46c-11" ; "already dashed")]
    #[test_case("b4f0b46c111142228333444444444444", "b4f0b46c-1111-4222-8333-444444444444" ; "full hex")]
    #[test_case("", "" ; "empty")]
    #[test_case("B4F0", "" ; "upper case")]
    #[test_case("web0", "" ; "not hex")]
    #[test_case("abcdef12-34", "abcdef12-34" ; "dashed partial group")]
    #[test_case("b4f0b46c-11114222", "b4f0b46c-1111-4222" ; "partly dashed")]
    #[test_case("b4f0b46c11114222-8333", "b4f0b46c-1111-4222-8333" ; "later dash only")]
    #[test_case("b4f0b46c-", "b4f0b46c" ; "trailing dash")]
    #[test_case("b4f0-b46c", "" ; "dash misplaced")]
    #[test_case("b4f0b46c--1111", "" ; "double dash")]
    #[test_case("b4f0b46c-111g", "" ; "dashed not hex")]
    #[test_case("b4f0b46c-1111-4222-8333-4444444444445", "" ; "too long dashed")]
    fn test_normalize_short_id(input: &str, expected: &str) {
        assert_eq!(normalize_short_id(input), expected);
    }

    #[test]
    fn test_container_id_kept() {
        let id = "a".repeat(64);
        assert_eq!(normalize_short_id(&id), id);
    }

    #[test]
    fn test_is_uuid() {
        assert!(is_uuid("b4f0b46c-1111-4222-8333-444444444444"));
        assert!(!is_uuid("B4F0B46C-1111-4222-8333-444444444444"));
        assert!(!is_uuid("b4f0b46c"));
        assert!(!is_uuid("b4f0b46c-1111-4222-8333-44444444444g"));
    }

    proptest! {
        #[test]
        fn prop_uuid_is_its_own_short_id(
            a in "[0-9a-f]{8}", b in "[0-9a-f]{4}", c in "[0-9a-f]{4}",
            d in "[0-9a-f]{4}", e in "[0-9a-f]{12}"
        ) {
            let uuid = format!("{a}-{b}-{c}-{d}-{e}");
            prop_assert!(is_uuid(&uuid));
            prop_assert_eq!(normalize_short_id(&uuid), uuid.clone());
            let undashed = uuid.replace('-', "");
            prop_assert_eq!(normalize_short_id(&undashed), uuid);
        }

        #[test]
        fn prop_prefix_of_uuid_stays_prefix(
            hex in "[0-9a-f]{32}", len in 1usize..=32
        ) {
            let uuid = normalize_short_id(&hex);
            let short = normalize_short_id(&hex[..len]);
            prop_assert!(uuid.starts_with(&short));
        }
    }
}
