//! Deterministic text cleaning.

/// Characters stripped from descriptions before matching or vectorizing.
const NOISE_CHARS: [char; 2] = ['*', '#'];

/// Normalize a raw transaction description.
///
/// Lower-cases, trims surrounding whitespace and removes `*` and `#`.
///
/// ```
/// use txcat::analysis::normalize;
///
/// assert_eq!(normalize("  AMZN*Mktp #123 "), "amznmktp 123");
/// ```
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .trim()
        .chars()
        .filter(|c| !NOISE_CHARS.contains(c))
        .collect()
}

/// Normalize an optional description; absent input becomes the empty string.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}
