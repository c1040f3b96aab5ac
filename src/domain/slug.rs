//! Deterministic, URL-safe slug generation.
//!
//! A slug is derived from a post title by lowercasing, replacing spaces
//! with dashes, stripping diacritics (decompose, drop combining marks,
//! recompose) and removing a fixed set of URL-reserved characters. The
//! transform is idempotent: applying it to its own output is a no-op.
//! Consumers supply their own uniqueness predicate so collision handling
//! stays free of persistence concerns.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

const MAX_SUFFIX_ATTEMPTS: usize = 32;

/// Characters never allowed in a slug.
const RESERVED: &[char] = &[
    '!', '#', '$', '&', '\'', '(', ')', '*', ',', '/', ':', ';', '=', '?', '@', '[', ']', '"',
    '%', '.', '<', '>', '\\', '^', '_', '{', '}', '|', '~', '`', '+',
];

/// Errors that can occur while generating a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

/// Normalize the provided text into slug form.
pub fn slugify(input: &str) -> String {
    let dashed = input.to_lowercase().replace(' ', "-");
    let stripped: String = dashed.nfd().filter(|ch| !is_combining_mark(*ch)).nfc().collect();
    let cleaned: String = stripped.chars().filter(|ch| !RESERVED.contains(ch)).collect();
    cleaned.to_lowercase()
}

/// Derive a base slug from the provided human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Produce a slug that does not collide according to the supplied predicate.
///
/// The `is_unique` closure must return `true` when the provided slug does
/// not already exist. The helper retries by suffixing a monotonic counter
/// (`-2`, `-3`, …).
pub fn generate_unique_slug<F>(input: &str, mut is_unique: F) -> Result<String, SlugError>
where
    F: FnMut(&str) -> bool,
{
    let base = derive_slug(input)?;

    if is_unique(&base) {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = format!("{base}-{attempt}");
        if is_unique(&candidate) {
            return Ok(candidate);
        }
    }

    Err(SlugError::Exhausted { base })
}
