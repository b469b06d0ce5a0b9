//! Slugs: URL-safe public handles derived from profile names.

const FALLBACK: &str = "profile";

/// Lowercase `input`, collapse every run of characters outside `[a-z0-9]`
/// into a single `-` and trim dashes from both ends.
///
/// Returns `"profile"` when nothing usable is left.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        FALLBACK.to_string()
    } else {
        slug
    }
}

/// The `attempt`-th candidate when making `base` unique.
///
/// Attempt 1 is `base` itself, then `base-2`, `base-3`, …
#[must_use]
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

/// Split a slug into the words it was built from.
#[must_use]
pub fn words(slug: &str) -> Vec<&str> {
    slug.split('-').filter(|w| !w.is_empty()).collect()
}
