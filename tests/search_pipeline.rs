//! Integration tests for the search pipeline: request construction through
//! HTTP outcome classification and response normalization, against a local
//! mock server.

use mockito::Matcher;
use paper_trail::config::Config;
use paper_trail::search::{
    SearchBackend, SearchError, SearchOutcome, SearchRequest, SearchSession,
    SemanticScholarBackend,
};
use std::sync::Arc;

fn test_config() -> Config {
    Config {
        api_key: None,
        requests_per_second: 100,
        ..Config::default()
    }
}

fn backend_for(server: &mockito::ServerGuard) -> SemanticScholarBackend {
    SemanticScholarBackend::from_config(&test_config())
        .with_base_url(format!("{}/paper/search", server.url()))
}

#[tokio::test]
async fn test_http_429_is_rate_limited_and_body_is_never_decoded() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/paper/search")
        .match_query(Matcher::Any)
        .with_status(429)
        // Deliberately not JSON: classification must happen before decoding
        .with_body("slow down")
        .create_async()
        .await;

    let backend = backend_for(&server);
    let result = backend.fetch(&SearchRequest::casual(&["graphs"])).await;
    assert!(matches!(result, Err(SearchError::RateLimited)));
}

#[tokio::test]
async fn test_non_success_status_is_a_network_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/paper/search")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let backend = backend_for(&server);
    let result = backend.fetch(&SearchRequest::casual(&["graphs"])).await;
    assert!(matches!(result, Err(SearchError::Network(_))));
}

#[tokio::test]
async fn test_malformed_body_on_success_is_a_decoding_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/paper/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"unexpected": "shape"}"#)
        .create_async()
        .await;

    let backend = backend_for(&server);
    let result = backend.fetch(&SearchRequest::casual(&["graphs"])).await;
    assert!(matches!(result, Err(SearchError::Decoding(_))));
}

#[tokio::test]
async fn test_empty_result_is_not_an_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/paper/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"total": 0, "data": null}"#)
        .create_async()
        .await;

    let backend = Arc::new(backend_for(&server));
    let session = SearchSession::new(backend);
    match session.run(SearchRequest::casual(&["graphs"])).await.unwrap() {
        SearchOutcome::Results(papers) => assert!(papers.is_empty()),
        SearchOutcome::Superseded => panic!("nothing superseded this search"),
    }
}

#[tokio::test]
async fn test_results_are_normalized_in_service_order() {
    let body = r#"{
        "total": 2,
        "data": [
            {
                "paperId": "second-alphabetically",
                "title": "Zebra Stripes",
                "openAccessPdf": null,
                "authors": [{"authorId": null, "name": "Jane Doe"}, {"authorId": "a2", "name": null}],
                "publicationDate": "2021-06-15"
            },
            {
                "title": "Untitled Fields Everywhere"
            }
        ]
    }"#;

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/paper/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;

    let backend = backend_for(&server);
    let page = backend
        .fetch(&SearchRequest::casual(&["graphs"]))
        .await
        .unwrap();
    let papers = page.into_papers();

    assert_eq!(papers.len(), 2);
    assert_eq!(papers[0].title.as_deref(), Some("Zebra Stripes"));
    assert_eq!(papers[0].open_access_pdf.url, "");
    assert_eq!(papers[0].author_names(), vec!["Jane Doe"]);
    assert_eq!(
        papers[0].publication_date_formatted().as_deref(),
        Some("Jun 15, 2021")
    );
    assert_eq!(papers[1].stable_id(), "title::Untitled Fields Everywhere");
}

#[tokio::test]
async fn test_casual_request_parameters_reach_the_wire() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/paper/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("query".into(), "deep+learning+Biology".into()),
            Matcher::UrlEncoded("fieldsOfStudy".into(), "Biology".into()),
            Matcher::UrlEncoded("limit".into(), "50".into()),
            Matcher::UrlEncoded(
                "fields".into(),
                "paperId,title,abstract,openAccessPdf,fieldsOfStudy,publicationDate,authors,tldr,externalIds,publicationTypes".into(),
            ),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"total": 0, "data": []}"#)
        .create_async()
        .await;

    let backend = backend_for(&server);
    backend
        .fetch(&SearchRequest::casual(&["deep learning", "Biology"]))
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_advanced_request_parameters_reach_the_wire() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/paper/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("query".into(), "graphs+Jane+Doe".into()),
            Matcher::UrlEncoded("year".into(), "2020-01-01:2024-01-01".into()),
            // The bare flag serializes with no value; the fields list also
            // names openAccessPdf, so match the standalone key exactly
            Matcher::Regex("&openAccessPdf&".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"total": 0, "data": []}"#)
        .create_async()
        .await;

    let backend = backend_for(&server);
    let request = SearchRequest::advanced(
        &["graphs"],
        &["Jane Doe"],
        None,
        "2020-01-01",
        "2024-01-01",
        true,
    );
    let url = request.to_url("https://unused.example/paper/search").unwrap();
    assert!(!url.query().unwrap().contains("minCitationCount"));

    backend.fetch(&request).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_api_key_is_sent_when_configured() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/paper/search")
        .match_query(Matcher::Any)
        .match_header("x-api-key", "sekrit")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"total": 0, "data": []}"#)
        .create_async()
        .await;

    let backend = backend_for(&server).with_api_key("sekrit");
    backend
        .fetch(&SearchRequest::casual(&["graphs"]))
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_invalid_query_never_reaches_the_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/paper/search")
        .match_query(Matcher::Any)
        .expect(0)
        .with_status(200)
        .create_async()
        .await;

    let backend = backend_for(&server);
    let result = backend.fetch(&SearchRequest::casual::<&str>(&[])).await;
    assert!(matches!(result, Err(SearchError::InvalidQuery(_))));
    mock.assert_async().await;
}
