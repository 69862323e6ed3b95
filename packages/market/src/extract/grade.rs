//! Grade detection and grade-based filtering.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::Listing;

/// Third-party grading services recognized in listing titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GradingService {
    Psa,
    Bgs,
    Sgc,
    Cgc,
    Csg,
    Hga,
}

impl GradingService {
    /// The token as it appears in titles.
    pub fn token(&self) -> &'static str {
        match self {
            GradingService::Psa => "PSA",
            GradingService::Bgs => "BGS",
            GradingService::Sgc => "SGC",
            GradingService::Cgc => "CGC",
            GradingService::Csg => "CSG",
            GradingService::Hga => "HGA",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token.to_uppercase().as_str() {
            "PSA" => Some(GradingService::Psa),
            "BGS" => Some(GradingService::Bgs),
            "SGC" => Some(GradingService::Sgc),
            "CGC" => Some(GradingService::Cgc),
            "CSG" => Some(GradingService::Csg),
            "HGA" => Some(GradingService::Hga),
            _ => None,
        }
    }

    const ALL: [GradingService; 6] = [
        GradingService::Psa,
        GradingService::Bgs,
        GradingService::Sgc,
        GradingService::Cgc,
        GradingService::Csg,
        GradingService::Hga,
    ];
}

/// Grading company and numeric grade detected in a title.
///
/// Absence of a `GradeInfo` denotes a raw (ungraded) card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeInfo {
    pub service: GradingService,
    pub grade: f64,
}

/// Company token, optional condition qualifier, then a grade value.
static GRADE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(PSA|BGS|SGC|CGC|CSG|HGA)\s*(?:GEM\s*MINT|GEM\s*MT|GEM|MINT|MT)?\s*(10|9\.5|9|8\.5|8)\b",
    )
    .unwrap()
});

/// `#` marker followed by 2-4 digits.
static CARD_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\s*(\d{2,4})\b").unwrap());

/// Detect a grade in a listing title; `None` means Raw.
pub fn detect_grade(title: &str) -> Option<GradeInfo> {
    let caps = GRADE_RE.captures(title)?;
    let service = GradingService::from_token(&caps[1])?;
    let grade = caps[2].parse::<f64>().ok()?;
    Some(GradeInfo { service, grade })
}

/// Detect a card number in a listing title, or empty string.
pub fn detect_card_number(title: &str) -> String {
    CARD_NUMBER_RE
        .captures(title)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

/// Narrow listings by the requested grade filter.
///
/// `"any"` (or empty) is the identity. `"raw"` keeps titles carrying
/// none of the grading-company tokens. Anything else is matched as
/// case-insensitive substring tokens ("PSA 10" keeps titles containing
/// both "PSA" and "10"), mirroring the extractor's looser text scan
/// rather than exact grade parsing.
pub fn filter_by_grade(listings: Vec<Listing>, grade: &str) -> Vec<Listing> {
    let filter = grade.trim().to_uppercase();
    if filter.is_empty() || filter == "ANY" {
        return listings;
    }

    if filter == "RAW" {
        return listings
            .into_iter()
            .filter(|l| {
                let title = l.title.to_uppercase();
                !GradingService::ALL.iter().any(|s| title.contains(s.token()))
            })
            .collect();
    }

    let tokens: Vec<&str> = filter.split_whitespace().collect();
    listings
        .into_iter()
        .filter(|l| {
            let title = l.title.to_uppercase();
            tokens.iter().all(|t| title.contains(t))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::listing_with_title;

    #[test]
    fn detects_plain_grade() {
        let grade = detect_grade("Justin Jefferson 2020 Prizm PSA 10 #398").unwrap();
        assert_eq!(grade.service, GradingService::Psa);
        assert_eq!(grade.grade, 10.0);
    }

    #[test]
    fn detects_half_grades_and_qualifiers() {
        let grade = detect_grade("Luka Doncic BGS GEM MINT 9.5").unwrap();
        assert_eq!(grade.service, GradingService::Bgs);
        assert_eq!(grade.grade, 9.5);

        let grade = detect_grade("Trout CGC Gem Mt 8.5 refractor").unwrap();
        assert_eq!(grade.service, GradingService::Cgc);
        assert_eq!(grade.grade, 8.5);
    }

    #[test]
    fn case_insensitive_detection() {
        let grade = detect_grade("rare card sgc 9 holo").unwrap();
        assert_eq!(grade.service, GradingService::Sgc);
        assert_eq!(grade.grade, 9.0);
    }

    #[test]
    fn no_grade_means_raw() {
        assert!(detect_grade("1989 Upper Deck Ken Griffey Jr #1").is_none());
        // Company token without a recognized grade value is not a match.
        assert!(detect_grade("PSA submission lot").is_none());
    }

    #[test]
    fn card_number_detection() {
        assert_eq!(detect_card_number("2020 Prizm #398 Jefferson"), "398");
        assert_eq!(detect_card_number("Chrome # 12 refractor"), "12");
        assert_eq!(detect_card_number("no number here"), "");
        // Single digit is below the 2-4 digit window.
        assert_eq!(detect_card_number("card #1"), "");
    }

    #[test]
    fn filter_any_is_identity() {
        let listings = vec![
            listing_with_title("PSA 10 Jefferson"),
            listing_with_title("raw Jefferson"),
        ];
        assert_eq!(filter_by_grade(listings, "any").len(), 2);
    }

    #[test]
    fn filter_by_company_and_grade() {
        let listings = vec![
            listing_with_title("Jefferson PSA 10 Prizm"),
            listing_with_title("Jefferson psa 9 Prizm"),
            listing_with_title("Jefferson BGS 10 Prizm"),
        ];
        let kept = filter_by_grade(listings, "PSA 10");
        assert_eq!(kept.len(), 1);
        assert!(kept[0].title.contains("PSA 10"));
    }

    #[test]
    fn filter_raw_excludes_graded_titles() {
        let listings = vec![
            listing_with_title("Jefferson PSA 10"),
            listing_with_title("Jefferson bgs 9.5"),
            listing_with_title("Jefferson SGC slab"),
            listing_with_title("Jefferson CGC 10"),
            listing_with_title("Jefferson base card"),
        ];
        let kept = filter_by_grade(listings, "raw");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Jefferson base card");
    }
}
