//! Deserialization shapes for the upstream response envelope.
//!
//! Every endpoint wraps its payload in `{"response": {...}}`, and list items
//! arrive wrapped once more under a per-endpoint key (`doc`, `book`, `lib`) —
//! except when they don't. The untagged enums below accept each observed
//! shape and normalize to the flat types in [`crate::types`].

use serde::Deserialize;

use crate::types::{CatalogBook, Keyword, Library, UsageAnalysis};

/// Outer wrapper common to all endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub(crate) response: T,
}

/// One entry of a book list. Variant order matters: serde tries them top to
/// bottom, and a bare record would also match a wrapper with defaults.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum BookEntry {
    Book { book: CatalogBook },
    Doc { doc: CatalogBook },
    Bare(CatalogBook),
}

impl BookEntry {
    pub(crate) fn into_book(self) -> CatalogBook {
        match self {
            Self::Book { book } | Self::Doc { doc: book } | Self::Bare(book) => book,
        }
    }
}

/// Payload for `srchBooks` and `recommandList`. `srchBooks` lists under
/// `docs`, `recommandList` under `list`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct BookListPayload {
    #[serde(default)]
    pub(crate) error: Option<String>,
    #[serde(default, alias = "list")]
    pub(crate) docs: Vec<BookEntry>,
}

impl BookListPayload {
    pub(crate) fn into_books(self) -> Vec<CatalogBook> {
        self.docs.into_iter().map(BookEntry::into_book).collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum LibraryEntry {
    Lib { lib: Library },
    Bare(Library),
}

impl LibraryEntry {
    pub(crate) fn into_library(self) -> Library {
        match self {
            Self::Lib { lib } | Self::Bare(lib) => lib,
        }
    }
}

/// Payload for `libSrchByBook`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct LibraryListPayload {
    #[serde(default)]
    pub(crate) error: Option<String>,
    #[serde(default)]
    pub(crate) libs: Vec<LibraryEntry>,
}

impl LibraryListPayload {
    pub(crate) fn into_libraries(self) -> Vec<Library> {
        self.libs.into_iter().map(LibraryEntry::into_library).collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct KeywordEntry {
    pub(crate) keyword: Keyword,
}

/// Payload for `usageAnalysisList`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UsageAnalysisPayload {
    #[serde(default)]
    pub(crate) error: Option<String>,
    #[serde(default)]
    pub(crate) book: Option<BookEntry>,
    #[serde(default, rename = "coLoanBooks")]
    pub(crate) co_loan_books: Vec<BookEntry>,
    #[serde(default, rename = "maniaRecBooks")]
    pub(crate) mania_rec_books: Vec<BookEntry>,
    #[serde(default, rename = "readerRecBooks")]
    pub(crate) reader_rec_books: Vec<BookEntry>,
    #[serde(default)]
    pub(crate) keywords: Vec<KeywordEntry>,
}

impl UsageAnalysisPayload {
    pub(crate) fn into_analysis(self) -> UsageAnalysis {
        UsageAnalysis {
            book: self.book.map(BookEntry::into_book),
            co_loan_books: self.co_loan_books.into_iter().map(BookEntry::into_book).collect(),
            mania_rec_books: self.mania_rec_books.into_iter().map(BookEntry::into_book).collect(),
            reader_rec_books: self.reader_rec_books.into_iter().map(BookEntry::into_book).collect(),
            keywords: self.keywords.into_iter().map(|k| k.keyword).collect(),
        }
    }
}
