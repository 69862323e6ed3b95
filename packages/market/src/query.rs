//! Query normalization and search URL construction.
//!
//! `normalize` canonicalizes a free-text card description so the
//! marketplace search is not over-restricted by grading tokens the
//! user typed; `build_search_url` turns the result into the
//! completed/sold search view.

use std::sync::LazyLock;

use regex::Regex;

/// Grading-company + grade token, e.g. "PSA 10" or "BGS 9.5".
static GRADE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:PSA|BGS|SGC|CGC|CSG|HGA)\s*(?:10|9\.5|9|8\.5|8)\b").unwrap()
});

/// Generic condition/rookie tokens that over-restrict a search.
static GENERIC_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bGEM\s+MINT\b|\bRC\b|\bROOKIE\b").unwrap());

/// A `#` card-number marker glued to its digits.
static HASH_DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\s*(\d)").unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Canonicalize a raw search query.
///
/// Upper-cases, strips grading-company/grade and generic condition
/// tokens, replaces parentheses with spaces, keeps a `#` card-number
/// marker but separates it from its digits, and collapses whitespace.
/// Pure and total; empty input yields empty output (rejected upstream
/// by the orchestrator, not here).
pub fn normalize(raw: &str) -> String {
    // Stripping a token can uncover a new one ("PSA PSA 10 10"), so
    // run single passes to a fixpoint; this is what makes normalize
    // idempotent for arbitrary input.
    let mut current = normalize_pass(raw);
    loop {
        let next = normalize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_pass(raw: &str) -> String {
    let upper = raw.to_uppercase();
    let spaced = upper.replace(['(', ')'], " ");
    let no_grades = GRADE_TOKEN_RE.replace_all(&spaced, " ");
    let no_generic = GENERIC_TOKEN_RE.replace_all(&no_grades, " ");
    let hash_split = HASH_DIGITS_RE.replace_all(&no_generic, "# $1");
    WHITESPACE_RE.replace_all(&hash_split, " ").trim().to_string()
}

/// Build the completed/sold search URL for a normalized query.
///
/// Fixed parameters: sold-only, completed-only, ended-recently sort,
/// minimum price filter, 60 results per page. Deterministic, no side
/// effects.
pub fn build_search_url(normalized: &str) -> String {
    format!(
        "https://www.ebay.com/sch/i.html?_nkw={}&_sacat=0&_from=R40&_sop=13&LH_Complete=1&LH_Sold=1&_udlo=1&_ipg=60",
        urlencoding::encode(normalized)
    )
}
