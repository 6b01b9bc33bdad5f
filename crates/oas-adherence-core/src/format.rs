//! String formats
//!
//! A checker and a generator for each supported `format`. Both return
//! `None` for [`StringFormat::Other`], leaving the caller to degrade.

use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;

use crate::schema::StringFormat;

const TOP_LEVEL_DOMAINS: &[&str] = &["com", "org", "net", "io", "dev"];

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
        )
        .expect("email pattern is a valid regex")
    })
}

/// Check a string against a format.
///
/// Returns `None` when the format is not supported.
pub fn check(format: &StringFormat, value: &str) -> Option<bool> {
    let valid = match format {
        StringFormat::Email => email_regex().is_match(value),
        StringFormat::Uuid => uuid::Uuid::parse_str(value).is_ok(),
        StringFormat::Uri => url::Url::parse(value).is_ok(),
        StringFormat::Ipv4 => value.parse::<Ipv4Addr>().is_ok(),
        StringFormat::Ipv6 => value.parse::<Ipv6Addr>().is_ok(),
        StringFormat::Other(_) => return None,
    };
    Some(valid)
}

/// Generate a string satisfying a format.
///
/// Returns `None` when the format is not supported.
pub fn generate<R: Rng + ?Sized>(format: &StringFormat, rng: &mut R) -> Option<String> {
    let value = match format {
        StringFormat::Email => {
            let local_len = rng.gen_range(1..=12);
            let domain_len = rng.gen_range(1..=10);
            format!(
                "{}@{}.{}",
                alphanumeric(rng, local_len),
                alphanumeric(rng, domain_len),
                pick_tld(rng)
            )
        }
        StringFormat::Uuid => {
            let bytes: [u8; 16] = rng.gen();
            uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()
        }
        StringFormat::Uri => {
            let host_len = rng.gen_range(1..=10);
            let segment_len = rng.gen_range(1..=12);
            format!(
                "https://{}.example.{}/{}",
                alphanumeric(rng, host_len).to_lowercase(),
                pick_tld(rng),
                alphanumeric(rng, segment_len)
            )
        }
        StringFormat::Ipv4 => Ipv4Addr::from(rng.gen::<u32>()).to_string(),
        StringFormat::Ipv6 => Ipv6Addr::from(rng.gen::<u128>()).to_string(),
        StringFormat::Other(_) => return None,
    };
    Some(value)
}

/// Random ASCII alphanumeric string of exactly `len` characters
pub(crate) fn alphanumeric<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

fn pick_tld<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    TOP_LEVEL_DOMAINS.choose(rng).copied().unwrap_or("com")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SUPPORTED: [StringFormat; 5] = [
        StringFormat::Email,
        StringFormat::Uuid,
        StringFormat::Uri,
        StringFormat::Ipv4,
        StringFormat::Ipv6,
    ];

    #[test]
    fn test_generated_values_pass_their_checker() {
        let mut rng = StdRng::seed_from_u64(7);
        for format in SUPPORTED.iter() {
            for _ in 0..50 {
                let value = generate(format, &mut rng).unwrap();
                assert_eq!(check(format, &value), Some(true), "{} rejected {}", format, value);
            }
        }
    }

    #[test]
    fn test_checkers_reject_garbage() {
        for format in SUPPORTED.iter() {
            assert_eq!(check(format, "not valid at all"), Some(false), "{}", format);
        }
    }

    #[test]
    fn test_known_values() {
        assert_eq!(check(&StringFormat::Email, "dingo@example.com"), Some(true));
        assert_eq!(check(&StringFormat::Email, "dingo@localhost"), Some(false));
        assert_eq!(
            check(&StringFormat::Uuid, "550e8400-e29b-41d4-a716-446655440000"),
            Some(true)
        );
        assert_eq!(check(&StringFormat::Uri, "ftp://files.example.org/a"), Some(true));
        assert_eq!(check(&StringFormat::Ipv4, "256.1.1.1"), Some(false));
        assert_eq!(check(&StringFormat::Ipv6, "::1"), Some(true));
    }

    #[test]
    fn test_unsupported_format() {
        let mut rng = StdRng::seed_from_u64(1);
        let format = StringFormat::Other("date-time".to_string());
        assert_eq!(check(&format, "2024-01-01T00:00:00Z"), None);
        assert_eq!(generate(&format, &mut rng), None);
    }

    #[test]
    fn test_alphanumeric_length() {
        let mut rng = StdRng::seed_from_u64(3);
        let s = alphanumeric(&mut rng, 17);
        assert_eq!(s.len(), 17);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
