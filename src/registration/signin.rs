//! Sign-in code generation, URL construction, and the issuance cooldown.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Generated codes are drawn uniformly from this alphabet.
const CODE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of a generated sign-in code.
pub const CODE_LEN: usize = 10;

/// Minimum gap between two code issuances for the same user.
pub const SIGNIN_COOLDOWN_SECS: i64 = 60;

/// Generate a sign-in code: [`CODE_LEN`] characters from `[A-Za-z]`.
///
/// Codes are not persisted or verified here; URL construction and
/// transmission are the entire contract.
pub fn signin_code(rng: &mut impl Rng) -> String {
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Whether a previously issued code is still inside its cooldown window.
pub fn cooldown_active(last_request: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_request {
        Some(last) => now - last < Duration::seconds(SIGNIN_COOLDOWN_SECS),
        None => false,
    }
}

/// Builds sign-in URLs against the configured service base URL.
#[derive(Debug, Clone)]
pub struct SigninLinks {
    base_url: String,
}

impl SigninLinks {
    /// `base_url` must not have a trailing slash (config strips it).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// `<base_url>/signin?code=<code>&account=<user_id>`
    pub fn signin_url(&self, code: &str, user_id: i64) -> String {
        format!("{}/signin?code={code}&account={user_id}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn code_is_ten_letters() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let code = signin_code(&mut rng);
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.chars().all(|c| c.is_ascii_alphabetic()), "{code}");
        }
    }

    #[test]
    fn code_is_deterministic_for_a_seed() {
        let a = signin_code(&mut StdRng::seed_from_u64(42));
        let b = signin_code(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn cooldown_inactive_without_prior_request() {
        assert!(!cooldown_active(None, Utc::now()));
    }

    #[test]
    fn cooldown_active_inside_window() {
        let now = Utc::now();
        assert!(cooldown_active(Some(now - Duration::seconds(30)), now));
        assert!(cooldown_active(Some(now), now));
    }

    #[test]
    fn cooldown_expires_at_sixty_seconds() {
        let now = Utc::now();
        assert!(!cooldown_active(Some(now - Duration::seconds(60)), now));
        assert!(!cooldown_active(Some(now - Duration::seconds(3600)), now));
    }

    #[test]
    fn signin_url_format() {
        let links = SigninLinks::new("https://kyber.network");
        assert_eq!(
            links.signin_url("AbCdEfGhIj", 12345),
            "https://kyber.network/signin?code=AbCdEfGhIj&account=12345"
        );
    }
}
