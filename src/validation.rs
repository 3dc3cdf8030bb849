//! Input format checks for registration and admin edits.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,6}$")
        .expect("Invalid email regex")
});

/// Basic email shape check: local part, domain, and a 2 to 6 letter TLD.
/// Consecutive dots are rejected anywhere in the address.
pub fn is_valid_email(email: &str) -> bool {
    if !EMAIL_RE.is_match(email) || email.contains("..") {
        return false;
    }

    match email.rsplit_once('.') {
        Some((_, tld)) => tld.len() <= 6,
        None => false,
    }
}

/// Non-empty and letters only (any script).
pub fn is_alpha(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_alphabetic)
}
