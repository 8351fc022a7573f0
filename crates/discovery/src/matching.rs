//! Matching heuristics that bridge AI-generated book references and catalog
//! records.
//!
//! AI output and catalog data disagree constantly: decorated titles, author
//! fields that concatenate translators and roles, inconsistent spacing. The
//! helpers here are deliberately loose — a false positive costs one odd
//! recommendation, a false negative loses a real book.

use std::collections::HashSet;

use booknaru_catalog::CatalogBook;

use crate::ai::AiRecommendation;

/// Lowercase with whitespace runs collapsed to single spaces.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Strip parenthetical annotations and a trailing colon-subtitle from a
/// title before searching the catalog.
///
/// AI models decorate titles with series and edition notes the catalog
/// search chokes on: `"지구 끝의 온실 (개정판)"` must search as
/// `"지구 끝의 온실"`, and `"제목: 부제"` as `"제목"`.
#[must_use]
pub fn clean_title(title: &str) -> String {
    let mut depth: u32 = 0;
    let mut stripped = String::with_capacity(title.len());
    for ch in title.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(ch),
            _ => {}
        }
    }

    let main = stripped.split(':').next().unwrap_or(&stripped);
    main.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether an AI-claimed author plausibly appears in a catalog `authors`
/// field.
///
/// Tokenizes the AI author on whitespace and commas, keeps tokens of at
/// least two characters (characters, not bytes — Hangul counts), and
/// succeeds on substring containment of any token. `"영하"` matches
/// `"김영하 지음"`.
#[must_use]
pub fn author_matches(ai_author: &str, catalog_authors: &str) -> bool {
    let haystack = normalize(catalog_authors);
    if haystack.is_empty() {
        return false;
    }

    normalize(ai_author)
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| token.chars().count() >= 2)
        .any(|token| haystack.contains(token))
}

/// Derived identity for deduplication across result sources.
///
/// `isbn:<digits>` when the record carries an ISBN, else
/// `meta:<normalized title>|<normalized authors>`. Records with neither an
/// ISBN nor a title are unkeyable and return `None`; they are excluded from
/// merging rather than colliding with each other.
#[must_use]
pub fn book_key(book: &CatalogBook) -> Option<String> {
    let digits: String = book.isbn13.chars().filter(char::is_ascii_digit).collect();
    if !digits.is_empty() {
        return Some(format!("isbn:{digits}"));
    }

    let title = normalize(&book.bookname);
    if title.is_empty() {
        return None;
    }
    Some(format!("meta:{title}|{}", normalize(&book.authors)))
}

/// Dedup AI candidates by normalized `title|author` and cap the list.
/// Candidates without a usable title are dropped.
#[must_use]
pub fn dedup_candidates(candidates: Vec<AiRecommendation>, cap: usize) -> Vec<AiRecommendation> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(cap.min(candidates.len()));

    for candidate in candidates {
        let title = normalize(&candidate.title);
        if title.is_empty() {
            continue;
        }
        let key = format!("{title}|{}", normalize(&candidate.author));
        if seen.insert(key) {
            kept.push(candidate);
            if kept.len() == cap {
                break;
            }
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(title: &str, author: &str) -> AiRecommendation {
        AiRecommendation { title: title.to_string(), author: author.to_string() }
    }

    #[test]
    fn normalize_collapses_whitespace_and_case() {
        assert_eq!(normalize("  Kim   Young-Ha "), "kim young-ha");
        assert_eq!(normalize("김영하\t지음"), "김영하 지음");
    }

    #[test]
    fn clean_title_strips_parentheticals() {
        assert_eq!(clean_title("지구 끝의 온실 (개정판)"), "지구 끝의 온실");
        assert_eq!(clean_title("달러구트 꿈 백화점 (리커버 에디션) 1"), "달러구트 꿈 백화점 1");
    }

    #[test]
    fn clean_title_strips_trailing_subtitle() {
        assert_eq!(clean_title("제목: 부제"), "제목");
        assert_eq!(clean_title("아몬드"), "아몬드");
    }

    #[test]
    fn clean_title_handles_nested_and_unbalanced_parens() {
        assert_eq!(clean_title("책 (시리즈 (2권))"), "책");
        assert_eq!(clean_title("책) 제목"), "책 제목");
    }

    #[test]
    fn author_matches_hangul_substring() {
        assert!(author_matches("영하", "김영하 지음"));
        assert!(author_matches("김초엽", "김초엽, 김원영 지음"));
    }

    #[test]
    fn author_matches_rejects_script_mismatch_and_short_tokens() {
        assert!(!author_matches("Kim Young-ha", "김영하 지음"));
        // Single-character tokens are too ambiguous to count.
        assert!(!author_matches("김", "김영하 지음"));
        assert!(!author_matches("한강", ""));
    }

    #[test]
    fn author_matches_tokenizes_on_commas() {
        assert!(author_matches("정세랑, 김초엽", "김초엽 지음"));
    }

    #[test]
    fn book_key_prefers_isbn() {
        let book = CatalogBook {
            bookname: "아몬드".to_string(),
            authors: "손원평".to_string(),
            isbn13: "979-1156-75889-9".to_string(),
            ..CatalogBook::default()
        };
        assert_eq!(book_key(&book).unwrap(), "isbn:9791156758899");
    }

    #[test]
    fn book_key_falls_back_to_title_and_authors() {
        let book = CatalogBook {
            bookname: "아몬드 ".to_string(),
            authors: "손원평  지음".to_string(),
            ..CatalogBook::default()
        };
        assert_eq!(book_key(&book).unwrap(), "meta:아몬드|손원평 지음");
    }

    #[test]
    fn book_key_unkeyable_record_is_none() {
        assert!(book_key(&CatalogBook::default()).is_none());
    }

    #[test]
    fn dedup_candidates_dedups_and_caps() {
        let mut candidates = vec![
            rec("아몬드", "손원평"),
            rec("아몬드 ", "손원평"),
            rec("", "유령"),
        ];
        for i in 0..15 {
            candidates.push(rec(&format!("책 {i}"), "저자"));
        }

        let kept = dedup_candidates(candidates, 12);
        assert_eq!(kept.len(), 12);
        assert_eq!(kept[0].title, "아몬드");
        assert_eq!(kept[1].title, "책 0");

        let keys: HashSet<String> = kept
            .iter()
            .map(|c| format!("{}|{}", normalize(&c.title), normalize(&c.author)))
            .collect();
        assert_eq!(keys.len(), kept.len());
    }
}
