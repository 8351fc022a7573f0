//! The two fixed prompts the service sends, and parsers for their replies.
//!
//! Providers are asked for strict JSON but routinely return markdown fences,
//! a bare array instead of the wrapping object, or the whole payload
//! double-encoded as a JSON string. The parsers accept every shape observed
//! in production and never trust the declared one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AiError;

use super::provider::ChatMessage;

/// One AI-proposed book: a claim, not yet a catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiRecommendation {
    pub title: String,
    #[serde(default)]
    pub author: String,
}

/// Parsed reply to the insight prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordInsight {
    pub summary: String,
    #[serde(default)]
    pub themes: Vec<String>,
}

/// Messages for the recommendation prompt: exactly 12 Korean-published
/// books for a keyword, as `{"books": [{"title", "author"}]}`.
#[must_use]
pub fn recommendation_messages(keyword: &str) -> Vec<ChatMessage> {
    let system = "You are a book curator for Korean readers. Recommend only real books \
                  published in Korea, originals or Korean translations. Respond with JSON \
                  only, no prose.";
    let user = format!(
        "Recommend exactly 12 books for the keyword \"{keyword}\". Respond as \
         {{\"books\": [{{\"title\": \"...\", \"author\": \"...\"}}]}} using Korean edition \
         titles and the primary author name only."
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Messages for the insight prompt: a short reading note for a keyword, as
/// `{"summary", "themes"}`.
#[must_use]
pub fn insight_messages(keyword: &str) -> Vec<ChatMessage> {
    let system = "You are a reading guide for Korean readers. Respond with JSON only, no prose.";
    let user = format!(
        "Write a short reading insight in Korean for the keyword \"{keyword}\": what draws \
         readers to it and which themes connect to it. Respond as \
         {{\"summary\": \"...\", \"themes\": [\"...\"]}}."
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Parse the recommendation reply.
///
/// Accepts `{"books": [...]}`, a bare array, or either of those
/// double-encoded as a JSON string. Items without a usable title are
/// dropped; an empty list is a valid (if useless) answer.
pub fn parse_recommendations(text: &str) -> Result<Vec<AiRecommendation>, AiError> {
    let value = lenient_json(text)?;

    let items = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map
            .get("books")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| AiError::Parse("no \"books\" array in AI output".to_string()))?,
        _ => return Err(AiError::Parse("AI output is neither array nor object".to_string())),
    };

    let recommendations = items
        .iter()
        .filter_map(|item| {
            let title = item.get("title").and_then(Value::as_str)?.trim();
            if title.is_empty() {
                return None;
            }
            let author = item
                .get("author")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string();
            Some(AiRecommendation { title: title.to_string(), author })
        })
        .collect();

    Ok(recommendations)
}

/// Parse the insight reply: `{"summary", "themes"}` with the same leniency
/// as [`parse_recommendations`].
pub fn parse_insight(text: &str) -> Result<KeywordInsight, AiError> {
    let value = lenient_json(text)?;
    serde_json::from_value(value)
        .map_err(|e| AiError::Parse(format!("unexpected insight shape: {e}")))
}

/// Strip markdown code fences and unwrap one level of double-encoding.
fn lenient_json(text: &str) -> Result<Value, AiError> {
    let stripped = strip_fences(text);
    let value: Value = serde_json::from_str(stripped)
        .map_err(|e| AiError::Parse(format!("AI output is not JSON: {e}")))?;

    if let Value::String(inner) = value {
        return serde_json::from_str(&inner)
            .map_err(|e| AiError::Parse(format!("double-encoded AI output is not JSON: {e}")));
    }
    Ok(value)
}

fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_object_with_books_array() {
        let text = r#"{"books": [{"title": "아몬드", "author": "손원평"}]}"#;
        let books = parse_recommendations(text).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "아몬드");
        assert_eq!(books[0].author, "손원평");
    }

    #[test]
    fn parses_bare_array() {
        let text = r#"[{"title": "페스트", "author": "알베르 카뮈"}]"#;
        let books = parse_recommendations(text).unwrap();
        assert_eq!(books.len(), 1);
    }

    #[test]
    fn strips_markdown_fences() {
        let text = "```json\n{\"books\": [{\"title\": \"1984\", \"author\": \"조지 오웰\"}]}\n```";
        let books = parse_recommendations(text).unwrap();
        assert_eq!(books[0].title, "1984");

        let bare_fence = "```\n[{\"title\": \"1984\"}]\n```";
        assert_eq!(parse_recommendations(bare_fence).unwrap().len(), 1);
    }

    #[test]
    fn unwraps_double_encoded_payload() {
        let inner = r#"{"books": [{"title": "달과 6펜스", "author": "서머싯 몸"}]}"#;
        let text = serde_json::to_string(inner).unwrap();
        let books = parse_recommendations(&text).unwrap();
        assert_eq!(books[0].title, "달과 6펜스");
    }

    #[test]
    fn drops_items_without_title_and_tolerates_missing_author() {
        let text = r#"{"books": [
            {"title": "", "author": "x"},
            {"author": "y"},
            {"title": "유일한 책"},
            42
        ]}"#;
        let books = parse_recommendations(text).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "유일한 책");
        assert_eq!(books[0].author, "");
    }

    #[test]
    fn empty_books_array_is_valid() {
        let books = parse_recommendations(r#"{"books": []}"#).unwrap();
        assert!(books.is_empty());
    }

    #[test]
    fn non_json_output_is_a_parse_error() {
        let err = parse_recommendations("I recommend these books: ...").unwrap_err();
        assert!(matches!(err, AiError::Parse(_)));

        let err = parse_recommendations(r#"{"notbooks": []}"#).unwrap_err();
        assert!(matches!(err, AiError::Parse(_)));
    }

    #[test]
    fn parses_insight_with_and_without_themes() {
        let full = r#"{"summary": "sf 입문", "themes": ["시간여행", "디스토피아"]}"#;
        let insight = parse_insight(full).unwrap();
        assert_eq!(insight.themes.len(), 2);

        let bare = r#"{"summary": "sf 입문"}"#;
        let insight = parse_insight(bare).unwrap();
        assert!(insight.themes.is_empty());
    }

    #[test]
    fn recommendation_prompt_carries_keyword_and_shape() {
        let messages = recommendation_messages("시간여행");
        assert_eq!(messages.len(), 2);
        assert!(messages[1].content.contains("시간여행"));
        assert!(messages[1].content.contains("\"books\""));
    }
}
