//! Masking of credentials before they reach logs or terminals.

/// Mask a secret, keeping at most the last four characters visible.
///
/// Short secrets (under 8 chars) are fully masked. Empty input renders as
/// `"Not Set"`.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        return "Not Set".to_string();
    }
    if count < 8 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}
