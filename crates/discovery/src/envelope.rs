//! Result envelopes for the aggregated search.
//!
//! The `mode` tag is a confidence tier, not just a format switch:
//! `ai-only` means nothing could be confirmed against the catalog, `no-gps`
//! means real books without local availability, `full` means ranked by
//! nearby holdings.

use serde::{Deserialize, Serialize};

use booknaru_catalog::CatalogBook;

use crate::ai::AiRecommendation;

/// Minimal identity of the primary seed book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedSummary {
    pub title: String,
    pub authors: String,
    pub isbn13: String,
    #[serde(rename = "bookImageURL")]
    pub book_image_url: Option<String>,
}

impl SeedSummary {
    #[must_use]
    pub fn from_book(book: &CatalogBook) -> Self {
        Self {
            title: book.bookname.clone(),
            authors: book.authors.clone(),
            isbn13: book.isbn13.clone(),
            book_image_url: book.book_image_url.clone(),
        }
    }
}

/// A confirmed catalog book plus the number of nearby libraries holding it.
/// The count is 0 in `no-gps` mode: unknown, not zero-by-fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedBook {
    pub book: CatalogBook,
    #[serde(rename = "nearbyLibCount")]
    pub nearby_lib_count: u32,
}

/// The three terminal shapes of the aggregated search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum SearchEnvelope {
    /// Candidates only; none confirmed in the catalog. `seed_book` is
    /// present when a seed was confirmed but expansion produced nothing.
    #[serde(rename = "ai-only")]
    AiOnly {
        #[serde(rename = "seedBook")]
        seed_book: Option<SeedSummary>,
        recommendations: Vec<AiRecommendation>,
        regions: Vec<String>,
    },

    /// Confirmed books, availability unknown (no usable coordinates).
    #[serde(rename = "no-gps")]
    NoGps {
        #[serde(rename = "seedBook")]
        seed_book: SeedSummary,
        recommendations: Vec<RankedBook>,
        regions: Vec<String>,
    },

    /// Confirmed books ranked by holdings in the two nearest regions.
    #[serde(rename = "full")]
    Full {
        #[serde(rename = "seedBook")]
        seed_book: SeedSummary,
        recommendations: Vec<RankedBook>,
        regions: Vec<String>,
    },
}

impl SearchEnvelope {
    /// The wire value of the `mode` tag.
    #[must_use]
    pub fn mode(&self) -> &'static str {
        match self {
            Self::AiOnly { .. } => "ai-only",
            Self::NoGps { .. } => "no-gps",
            Self::Full { .. } => "full",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> SeedSummary {
        SeedSummary {
            title: "아몬드".to_string(),
            authors: "손원평".to_string(),
            isbn13: "9791156758891".to_string(),
            book_image_url: None,
        }
    }

    #[test]
    fn ai_only_serializes_null_seed_and_empty_regions() {
        let envelope = SearchEnvelope::AiOnly {
            seed_book: None,
            recommendations: vec![AiRecommendation {
                title: "아몬드".to_string(),
                author: "손원평".to_string(),
            }],
            regions: vec![],
        };

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["mode"], "ai-only");
        assert!(json["seedBook"].is_null());
        assert_eq!(json["recommendations"][0]["title"], "아몬드");
        assert_eq!(json["regions"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn no_gps_tags_every_book_with_zero_count() {
        let envelope = SearchEnvelope::NoGps {
            seed_book: seed(),
            recommendations: vec![RankedBook {
                book: CatalogBook { bookname: "페스트".to_string(), ..CatalogBook::default() },
                nearby_lib_count: 0,
            }],
            regions: vec![],
        };

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["mode"], "no-gps");
        assert_eq!(json["seedBook"]["title"], "아몬드");
        assert_eq!(json["recommendations"][0]["nearbyLibCount"], 0);
        assert_eq!(json["recommendations"][0]["book"]["bookname"], "페스트");
    }

    #[test]
    fn full_carries_region_names() {
        let envelope = SearchEnvelope::Full {
            seed_book: seed(),
            recommendations: vec![],
            regions: vec!["Seoul".to_string(), "Incheon".to_string()],
        };

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["mode"], "full");
        assert_eq!(json["regions"], serde_json::json!(["Seoul", "Incheon"]));
    }

    #[test]
    fn envelope_round_trips_through_json() {
        let envelope = SearchEnvelope::Full {
            seed_book: seed(),
            recommendations: vec![RankedBook {
                book: CatalogBook {
                    bookname: "1984".to_string(),
                    isbn13: "9788937460777".to_string(),
                    ..CatalogBook::default()
                },
                nearby_lib_count: 7,
            }],
            regions: vec!["Seoul".to_string(), "Incheon".to_string()],
        };

        let body = serde_json::to_string(&envelope).unwrap();
        let parsed: SearchEnvelope = serde_json::from_str(&body).unwrap();
        match parsed {
            SearchEnvelope::Full { recommendations, .. } => {
                assert_eq!(recommendations[0].nearby_lib_count, 7);
            }
            other => panic!("expected full mode, got {other:?}"),
        }
    }
}
