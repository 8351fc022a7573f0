//! Wire types for the library open-data API.
//!
//! Field names follow the upstream JSON so the proxy endpoints can pass
//! records through unchanged. The upstream omits fields freely, so everything
//! defaults.

use serde::{Deserialize, Serialize};

/// Canonical book record from the library catalog.
///
/// `isbn13` is the primary identity when present; records without one are
/// identified by title + authors downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogBook {
    /// Title as catalogued.
    #[serde(default)]
    pub bookname: String,
    /// Author field — often concatenates authors, translators and roles.
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub publisher: String,
    /// Publication year, delivered as a string upstream.
    #[serde(default)]
    pub publication_year: String,
    #[serde(default)]
    pub isbn13: String,
    /// Cover image URL.
    #[serde(default, rename = "bookImageURL", skip_serializing_if = "Option::is_none")]
    pub book_image_url: Option<String>,
    /// Detail page URL.
    #[serde(default, rename = "bookDtlUrl", skip_serializing_if = "Option::is_none")]
    pub book_detail_url: Option<String>,
    /// Cumulative loan count, delivered as a string upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_count: Option<String>,
}

/// A library holding a given book.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Library {
    #[serde(default, rename = "libCode")]
    pub lib_code: String,
    #[serde(default, rename = "libName")]
    pub lib_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tel: Option<String>,
    /// Latitude as a string, sometimes empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,
    /// Longitude as a string, sometimes empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

impl Library {
    /// Parse the string coordinates, if both are present and numeric.
    #[must_use]
    pub fn coords(&self) -> Option<(f64, f64)> {
        let lat = self.latitude.as_deref()?.trim().parse::<f64>().ok()?;
        let lon = self.longitude.as_deref()?.trim().parse::<f64>().ok()?;
        if lat.is_finite() && lon.is_finite() {
            Some((lat, lon))
        } else {
            None
        }
    }
}

/// A subject keyword attached to a book's usage analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Keyword {
    #[serde(default)]
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
}

/// Usage analysis for one book: who borrows it, and what else they borrow.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageAnalysis {
    /// The analyzed book itself, when the upstream includes it.
    pub book: Option<CatalogBook>,
    /// Books frequently borrowed together with this one.
    pub co_loan_books: Vec<CatalogBook>,
    /// Picks for heavy readers of this book's subject.
    pub mania_rec_books: Vec<CatalogBook>,
    /// Picks for general readers of this book.
    pub reader_rec_books: Vec<CatalogBook>,
    /// Subject keywords.
    pub keywords: Vec<Keyword>,
}

/// Variant of the static recommendation-list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecommendType {
    /// Heavy-reader recommendations (the upstream default).
    #[default]
    Mania,
    /// General-reader recommendations.
    Reader,
}

impl RecommendType {
    /// The `type` query parameter value.
    #[must_use]
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Mania => "mania",
            Self::Reader => "reader",
        }
    }
}
