//! The aggregated search pipeline: keyword in, ranked real books out.
//!
//! Nine stages, each allowed to short-circuit to a terminal envelope. Only
//! candidate generation is fatal; every catalog call degrades to a
//! zero-contribution on failure so one slow or broken upstream cannot fail
//! the request.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;
use tracing::instrument;

use booknaru_catalog::{
    nearest_regions, CatalogBook, LibraryClient, RecommendType, Region, SearchBooks,
};

use crate::ai::{
    parse_recommendations, recommendation_messages, AiProvider, AiRecommendation, GenerateOptions,
};
use crate::cache::{ai_search_key, region_bucket, ResponseCache};
use crate::envelope::{RankedBook, SearchEnvelope, SeedSummary};
use crate::error::{AiError, SearchError};
use crate::matching::{author_matches, book_key, clean_title, dedup_candidates};

/// Tuning knobs for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// AI model for candidate generation.
    pub model: String,
    /// Result list cap and candidate cap.
    pub max_results: usize,
    /// Page size for seed-resolution searches.
    pub seed_search_page_size: u32,
    /// How many resolved seed ISBNs feed the batch recommendation queries.
    pub max_seed_isbns: usize,
    /// Outer budget for the AI call; elapsing it fails the request.
    pub ai_timeout: Duration,
    /// Per-call budget for holdings lookups; elapsing one counts as zero.
    pub availability_timeout: Duration,
    /// TTL for cached result envelopes.
    pub cache_ttl: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_results: 12,
            seed_search_page_size: 5,
            max_seed_isbns: 5,
            ai_timeout: Duration::from_secs(8),
            availability_timeout: Duration::from_secs(2),
            cache_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// One aggregated search request.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub keyword: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Skip the cache probe (the result is still written back).
    pub nocache: bool,
}

/// Result of a pipeline run.
#[derive(Debug)]
pub enum SearchOutcome {
    /// Cache hit: the stored body, byte-identical to when it was computed.
    Cached { body: String },
    /// Freshly computed envelope, already written to the cache.
    Computed { envelope: SearchEnvelope, body: String },
}

impl SearchOutcome {
    /// The response body, whichever way it was obtained.
    #[must_use]
    pub fn body(&self) -> &str {
        match self {
            Self::Cached { body } | Self::Computed { body, .. } => body,
        }
    }
}

/// Orchestrates AI candidate generation, catalog grounding, expansion, and
/// availability ranking.
pub struct SearchPipeline {
    catalog: LibraryClient,
    ai: Arc<dyn AiProvider>,
    cache: Arc<dyn ResponseCache>,
    config: PipelineConfig,
}

impl SearchPipeline {
    #[must_use]
    pub fn new(
        catalog: LibraryClient,
        ai: Arc<dyn AiProvider>,
        cache: Arc<dyn ResponseCache>,
        config: PipelineConfig,
    ) -> Self {
        Self { catalog, ai, cache, config }
    }

    /// Run the pipeline for one request.
    ///
    /// # Errors
    ///
    /// [`SearchError::EmptyKeyword`] for a blank keyword and
    /// [`SearchError::Candidates`] when the AI call fails, times out, or
    /// returns unparseable output. Everything else degrades.
    #[instrument(skip(self, request), fields(keyword = %request.keyword, nocache = request.nocache))]
    pub async fn run(&self, request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        let keyword = request.keyword.trim();
        if keyword.is_empty() {
            return Err(SearchError::EmptyKeyword);
        }

        let nearest =
            valid_coords(request.lat, request.lon).map(|(lat, lon)| nearest_regions(lat, lon, 2));
        let bucket = region_bucket(nearest.as_deref().map(|pair| (pair[0].code, pair[1].code)));
        let cache_key = ai_search_key(keyword, &bucket);

        if !request.nocache {
            if let Some(body) = self.cache.get(&cache_key).await {
                tracing::debug!(key = %cache_key, "cache hit");
                return Ok(SearchOutcome::Cached { body });
            }
        }

        // Stage 2: the only fatal upstream.
        let candidates = self.generate_candidates(keyword).await?;
        tracing::debug!(count = candidates.len(), "AI candidates generated");

        // Stage 3: resolve candidates against the catalog, concurrently,
        // order preserved.
        let resolutions: Vec<Option<CatalogBook>> =
            join_all(candidates.iter().map(|candidate| self.resolve_candidate(candidate))).await;
        let resolved: Vec<CatalogBook> = resolutions.iter().flatten().cloned().collect();

        if resolved.is_empty() {
            tracing::info!("no candidate confirmed in catalog, returning raw candidates");
            let envelope = SearchEnvelope::AiOnly {
                seed_book: None,
                recommendations: candidates,
                regions: Vec::new(),
            };
            return self.finish(&cache_key, envelope).await;
        }

        // Stage 4: first resolved book anchors the expansion.
        let seed_summary = SeedSummary::from_book(&resolved[0]);
        let primary_isbn = resolved[0].isbn13.trim().to_string();
        let seed_isbns: Vec<String> = resolved
            .iter()
            .map(|book| book.isbn13.trim())
            .filter(|isbn| !isbn.is_empty())
            .take(self.config.max_seed_isbns)
            .map(str::to_string)
            .collect();

        // Seeds are pre-seeded into the seen-set so expansion cannot
        // re-suggest them.
        let mut seen: HashSet<String> = resolved.iter().filter_map(book_key).collect();
        let mut accumulator: Vec<CatalogBook> = Vec::new();

        // Stage 5: usage-based expansion for the primary seed.
        if primary_isbn.is_empty() {
            tracing::debug!("primary seed has no ISBN, skipping usage analysis");
        } else {
            match self.catalog.usage_analysis(&primary_isbn).await {
                Ok(analysis) => {
                    let expansion = analysis
                        .co_loan_books
                        .into_iter()
                        .chain(analysis.mania_rec_books)
                        .chain(analysis.reader_rec_books);
                    for book in expansion {
                        push_unique(&mut accumulator, &mut seen, book, self.config.max_results);
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, isbn13 = %primary_isbn, "usage analysis failed");
                }
            }
        }

        // Stage 6: batch recommendation lists, only while short of the cap.
        if accumulator.len() < self.config.max_results && !seed_isbns.is_empty() {
            let (mania, reader) = tokio::join!(
                self.catalog.recommend_list(&seed_isbns, RecommendType::Mania),
                self.catalog.recommend_list(&seed_isbns, RecommendType::Reader),
            );
            for result in [mania, reader] {
                match result {
                    Ok(books) => {
                        for book in books {
                            push_unique(&mut accumulator, &mut seen, book, self.config.max_results);
                        }
                    }
                    Err(error) => tracing::warn!(%error, "recommendation list failed"),
                }
            }
        }

        // Stage 7: last resort when expansion produced nothing.
        if accumulator.is_empty() {
            tracing::debug!("expansion empty, falling back to seeds");

            // The confirmed seeds stand in as recommendations. Their keys
            // are already in `seen`, so dedup them against each other only.
            let mut seed_keys: HashSet<String> = HashSet::new();
            for book in &resolved {
                if accumulator.len() >= self.config.max_results {
                    break;
                }
                let Some(key) = book_key(book) else { continue };
                if seed_keys.insert(key) {
                    accumulator.push(book.clone());
                }
            }

            let late_candidates: Vec<&AiRecommendation> = candidates
                .iter()
                .zip(&resolutions)
                .skip(resolved.len())
                .filter(|(_, resolution)| resolution.is_none())
                .map(|(candidate, _)| candidate)
                .collect();
            let late_hits =
                join_all(late_candidates.into_iter().map(|candidate| self.single_hit(candidate)))
                    .await;
            for book in late_hits.into_iter().flatten() {
                push_unique(&mut accumulator, &mut seen, book, self.config.max_results);
            }

            if accumulator.is_empty() {
                let envelope = SearchEnvelope::AiOnly {
                    seed_book: Some(seed_summary),
                    recommendations: candidates,
                    regions: Vec::new(),
                };
                return self.finish(&cache_key, envelope).await;
            }
        }

        accumulator.truncate(self.config.max_results);

        // Stage 8: without a usable location, availability stays unknown.
        let Some(region_pair) = nearest else {
            let recommendations = accumulator
                .into_iter()
                .map(|book| RankedBook { book, nearby_lib_count: 0 })
                .collect();
            let envelope = SearchEnvelope::NoGps {
                seed_book: seed_summary,
                recommendations,
                regions: Vec::new(),
            };
            return self.finish(&cache_key, envelope).await;
        };

        // Stage 9: per-book per-region holdings counts, summed and sorted.
        let counts =
            join_all(accumulator.iter().map(|book| self.nearby_count(book, &region_pair))).await;

        let mut recommendations: Vec<RankedBook> = accumulator
            .into_iter()
            .zip(counts)
            .map(|(book, nearby_lib_count)| RankedBook { book, nearby_lib_count })
            .collect();
        recommendations.sort_by_key(|ranked| Reverse(ranked.nearby_lib_count));

        let envelope = SearchEnvelope::Full {
            seed_book: seed_summary,
            recommendations,
            regions: region_pair.iter().map(|region| region.name.to_string()).collect(),
        };
        self.finish(&cache_key, envelope).await
    }

    /// Serialize, cache, and wrap a terminal envelope.
    async fn finish(
        &self,
        cache_key: &str,
        envelope: SearchEnvelope,
    ) -> Result<SearchOutcome, SearchError> {
        let body = serde_json::to_string(&envelope)?;
        self.cache.set(cache_key, body.clone(), self.config.cache_ttl).await;
        tracing::debug!(mode = envelope.mode(), key = %cache_key, "envelope cached");
        Ok(SearchOutcome::Computed { envelope, body })
    }

    async fn generate_candidates(&self, keyword: &str) -> Result<Vec<AiRecommendation>, AiError> {
        let messages = recommendation_messages(keyword);
        let options = GenerateOptions {
            temperature: Some(0.7),
            max_tokens: Some(1024),
            json_mode: true,
        };

        let response = timeout(
            self.config.ai_timeout,
            self.ai.generate(&self.config.model, &messages, &options),
        )
        .await
        .map_err(|_| AiError::Timeout(self.config.ai_timeout))??;

        let parsed = parse_recommendations(&response.text)?;
        Ok(dedup_candidates(parsed, self.config.max_results))
    }

    /// Resolve one AI candidate to a catalog record. Title-only search
    /// first, preferring an author token-match over the first hit; when the
    /// title alone finds nothing, retry once with `"title author"`.
    async fn resolve_candidate(&self, candidate: &AiRecommendation) -> Option<CatalogBook> {
        let title = clean_title(&candidate.title);
        if title.is_empty() {
            return None;
        }

        let mut hits = self.seed_search(&title).await;
        if hits.is_empty() && !candidate.author.trim().is_empty() {
            let combined = format!("{title} {}", candidate.author.trim());
            hits = self.seed_search(&combined).await;
        }
        if hits.is_empty() {
            return None;
        }

        hits.iter()
            .find(|book| author_matches(&candidate.author, &book.authors))
            .cloned()
            .or_else(|| hits.into_iter().next())
    }

    async fn seed_search(&self, term: &str) -> Vec<CatalogBook> {
        let params = SearchBooks::title(term).page_size(self.config.seed_search_page_size);
        match self.catalog.search_books(&params).await {
            Ok(books) => books,
            Err(error) => {
                tracing::warn!(%error, term, "seed search failed");
                Vec::new()
            }
        }
    }

    async fn single_hit(&self, candidate: &AiRecommendation) -> Option<CatalogBook> {
        let title = clean_title(&candidate.title);
        if title.is_empty() {
            return None;
        }
        let params = SearchBooks::title(title).page_size(1);
        match self.catalog.search_books(&params).await {
            Ok(books) => books.into_iter().next(),
            Err(error) => {
                tracing::warn!(%error, "last-resort search failed");
                None
            }
        }
    }

    /// Sum of holdings counts across the region pair. Books without an ISBN
    /// cannot be looked up and count zero.
    async fn nearby_count(&self, book: &CatalogBook, regions: &[Region]) -> u32 {
        let isbn13 = book.isbn13.trim();
        if isbn13.is_empty() {
            return 0;
        }
        let counts =
            join_all(regions.iter().map(|region| self.region_count(isbn13, region.code))).await;
        counts.into_iter().sum()
    }

    async fn region_count(&self, isbn13: &str, region_code: &str) -> u32 {
        let lookup = self.catalog.libraries_by_book(isbn13, region_code);
        match timeout(self.config.availability_timeout, lookup).await {
            Ok(Ok(libraries)) => u32::try_from(libraries.len()).unwrap_or(u32::MAX),
            Ok(Err(error)) => {
                tracing::warn!(%error, isbn13, region_code, "holdings lookup failed");
                0
            }
            Err(_) => {
                tracing::warn!(isbn13, region_code, "holdings lookup timed out");
                0
            }
        }
    }
}

/// Both coordinates present, finite, and in range.
fn valid_coords(lat: Option<f64>, lon: Option<f64>) -> Option<(f64, f64)> {
    let (lat, lon) = (lat?, lon?);
    let usable = lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon);
    usable.then_some((lat, lon))
}

fn push_unique(
    accumulator: &mut Vec<CatalogBook>,
    seen: &mut HashSet<String>,
    book: CatalogBook,
    cap: usize,
) {
    if accumulator.len() >= cap {
        return;
    }
    let Some(key) = book_key(&book) else { return };
    if seen.insert(key) {
        accumulator.push(book);
    }
}
