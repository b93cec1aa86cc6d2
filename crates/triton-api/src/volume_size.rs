//! Volume size arguments.

use once_cell::sync::Lazy;
use regex::Regex;
use triton_cloudapi::{Error, Result};

static VOLUME_SIZE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([1-9][0-9]*)([GM])$").unwrap_or_else(|_| unreachable!()));

/// Parses `<N>G` or `<N>M` into MiB.
///
/// # Errors
///
/// Returns a `Usage` error for anything else: no unit, an unknown unit, a
/// leading zero, a sign, a fraction, or a product that overflows.
pub fn parse_volume_size(input: &str) -> Result<u64> {
    let invalid = || {
        Error::usage(format!(
            "invalid volume size \"{input}\": expected a positive integer followed by G or M (e.g. 10G)"
        ))
    };
    let caps = VOLUME_SIZE_REGEX.captures(input).ok_or_else(invalid)?;
    let n: u64 = caps[1].parse().map_err(|_| invalid())?;
    match &caps[2] {
        "G" => n.checked_mul(1024).ok_or_else(invalid),
        _ => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("10G", 10 * 1024 ; "gibibytes")]
    #[test_case("1G", 1024 ; "one gibibyte")]
    #[test_case("512M", 512 ; "mebibytes")]
    #[test_case("100M", 100 ; "round mebibytes")]
    fn test_valid_sizes(input: &str, mib: u64) {
        assert_eq!(parse_volume_size(input).expect("valid"), mib);
    }

    #[test_case("" ; "empty")]
    #[test_case("010G" ; "leading zero")]
    #[test_case("0G" ; "zero")]
    #[test_case("-1G" ; "negative")]
    #[test_case("1.5G" ; "fractional")]
    #[test_case("10T" ; "unknown unit")]
    #[test_case("10g" ; "lower case unit")]
    #[test_case("G" ; "unit without number")]
    #[test_case("10" ; "number without unit")]
    #[test_case("99999999999999999999G" ; "overflow")]
    fn test_invalid_sizes(input: &str) {
        let err = parse_volume_size(input).expect_err("invalid");
        assert_eq!(err.name(), "UsageError");
    }
}
