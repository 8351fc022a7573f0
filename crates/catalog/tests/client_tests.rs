//! Integration tests for the library API client against a mock upstream.

use booknaru_catalog::{CatalogError, LibraryClient, RecommendType, SearchBooks};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn json_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/json")
}

#[tokio::test]
async fn search_books_sends_auth_and_paging_params() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/srchBooks"))
        .and(query_param("authKey", "test-key"))
        .and(query_param("format", "json"))
        .and(query_param("title", "지구 끝의 온실"))
        .and(query_param("pageNo", "1"))
        .and(query_param("pageSize", "5"))
        .respond_with(json_response(
            r#"{"response": {"docs": [
                {"doc": {"bookname": "지구 끝의 온실", "authors": "김초엽 지음", "isbn13": "9791191114225"}}
            ]}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = LibraryClient::new(server.uri(), "test-key").unwrap();
    let books = client
        .search_books(&SearchBooks::title("지구 끝의 온실").page_size(5))
        .await
        .unwrap();

    assert_eq!(books.len(), 1);
    assert_eq!(books[0].bookname, "지구 끝의 온실");
    assert_eq!(books[0].isbn13, "9791191114225");
}

#[tokio::test]
async fn search_books_accepts_bare_and_book_wrapped_entries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/srchBooks"))
        .respond_with(json_response(
            r#"{"response": {"docs": [
                {"book": {"bookname": "A", "isbn13": "9780000000001"}},
                {"bookname": "B", "isbn13": "9780000000002"}
            ]}}"#,
        ))
        .mount(&server)
        .await;

    let client = LibraryClient::new(server.uri(), "test-key").unwrap();
    let books = client.search_books(&SearchBooks::keyword("sf")).await.unwrap();

    let names: Vec<&str> = books.iter().map(|b| b.bookname.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[tokio::test]
async fn usage_analysis_parses_nested_sections() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/usageAnalysisList"))
        .and(query_param("isbn13", "9791191114225"))
        .respond_with(json_response(
            r#"{"response": {
                "book": {"book": {"bookname": "지구 끝의 온실", "isbn13": "9791191114225"}},
                "coLoanBooks": [{"book": {"bookname": "co", "isbn13": "9780000000001"}}],
                "maniaRecBooks": [{"book": {"bookname": "mania", "isbn13": "9780000000002"}}],
                "readerRecBooks": [],
                "keywords": [{"keyword": {"word": "SF", "weight": "33"}}]
            }}"#,
        ))
        .mount(&server)
        .await;

    let client = LibraryClient::new(server.uri(), "test-key").unwrap();
    let analysis = client.usage_analysis("9791191114225").await.unwrap();

    assert_eq!(analysis.book.unwrap().isbn13, "9791191114225");
    assert_eq!(analysis.co_loan_books.len(), 1);
    assert_eq!(analysis.mania_rec_books[0].bookname, "mania");
    assert!(analysis.reader_rec_books.is_empty());
    assert_eq!(analysis.keywords[0].word, "SF");
}

#[tokio::test]
async fn recommend_list_joins_isbns_and_sets_type() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/recommandList"))
        .and(query_param("isbn13", "9780000000001;9780000000002"))
        .and(query_param("type", "reader"))
        .respond_with(json_response(
            r#"{"response": {"list": [
                {"book": {"bookname": "rec", "isbn13": "9780000000003"}}
            ]}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = LibraryClient::new(server.uri(), "test-key").unwrap();
    let isbns = vec!["9780000000001".to_string(), "9780000000002".to_string()];
    let books = client.recommend_list(&isbns, RecommendType::Reader).await.unwrap();

    assert_eq!(books.len(), 1);
    assert_eq!(books[0].bookname, "rec");
}

#[tokio::test]
async fn libraries_by_book_queries_one_region() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/libSrchByBook"))
        .and(query_param("isbn", "9791191114225"))
        .and(query_param("region", "11"))
        .respond_with(json_response(
            r#"{"response": {"libs": [
                {"lib": {"libCode": "111001", "libName": "서울도서관", "latitude": "37.5662", "longitude": "126.9779"}},
                {"libCode": "111002", "libName": "정독도서관"}
            ]}}"#,
        ))
        .mount(&server)
        .await;

    let client = LibraryClient::new(server.uri(), "test-key").unwrap();
    let libs = client.libraries_by_book("9791191114225", "11").await.unwrap();

    assert_eq!(libs.len(), 2);
    assert_eq!(libs[0].lib_name, "서울도서관");
    assert!(libs[0].coords().is_some());
    assert!(libs[1].coords().is_none());
}

#[tokio::test]
async fn in_payload_error_maps_to_upstream_variant() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/srchBooks"))
        .respond_with(json_response(
            r#"{"response": {"error": "Invalid authentication key."}}"#,
        ))
        .mount(&server)
        .await;

    let client = LibraryClient::new(server.uri(), "bad-key").unwrap();
    let err = client.search_books(&SearchBooks::keyword("sf")).await.unwrap_err();

    match err {
        CatalogError::Upstream(message) => assert!(message.contains("authentication")),
        other => panic!("expected Upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn http_error_status_maps_to_api_variant() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/usageAnalysisList"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let client = LibraryClient::new(server.uri(), "test-key").unwrap();
    let err = client.usage_analysis("9791191114225").await.unwrap_err();

    match err {
        CatalogError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "upstream down");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
