//! Discovery provider tests, local ranking and the semantic-search backend

use std::sync::Arc;

use agentmesh::directory::{AgentDirectory, MemoryDirectory};
use agentmesh::discovery::{DiscoveryProvider, DiscoveryRequest, LocalDiscovery, RemoteDiscovery};
use agentmesh::models::{AgentDescriptor, ResourceGrant};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn directory() -> Arc<dyn AgentDirectory> {
    Arc::new(MemoryDirectory::from_agents(vec![
        AgentDescriptor::new(
            "crawler",
            "Searches the web",
            vec!["search".into(), "index".into()],
            "http://crawler.local/tasks",
        ),
        AgentDescriptor::new(
            "warehouse",
            "Stores search results",
            vec!["storage".into()],
            "http://warehouse.local/tasks",
        ),
        AgentDescriptor::new(
            "reviewer",
            "Reviews pull requests",
            vec!["code-review".into()],
            "http://reviewer.local/tasks",
        )
        .with_resources(vec![ResourceGrant::new("https://github.com/acme/*")]),
    ]))
}

#[tokio::test]
async fn test_local_ranking() {
    let provider = LocalDiscovery::new(directory());

    let results = provider
        .discover(&DiscoveryRequest::new("web search indexing"))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].agent.name, "crawler");
    assert!((results[0].score - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(results[1].agent.name, "warehouse");
    assert!((results[1].score - 1.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_local_resource_filter() {
    let provider = LocalDiscovery::new(directory());

    let request = DiscoveryRequest::new("review pull requests")
        .with_resources(vec!["https://github.com/acme/api".to_string()]);
    let results = provider.discover(&request).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].agent.name, "reviewer");
    assert_eq!(results[0].score, 1.0);
    assert_eq!(results[0].matched_resources.len(), 1);
    assert_eq!(results[0].matched_resources[0].grant, "https://github.com/acme/*");
}

#[tokio::test]
async fn test_local_default_limit() {
    let provider = LocalDiscovery::new(directory()).with_default_limit(1);

    let results = provider
        .discover(&DiscoveryRequest::new("search"))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);

    let results = provider
        .discover(&DiscoveryRequest::new("search").with_limit(5))
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_remote_ranking_resolves_directory() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_json(serde_json::json!({"query": "find me a crawler", "limit": 10})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                {"name": "warehouse", "score": 0.4},
                {"name": "crawler", "score": 0.9, "matched_capabilities": ["search"]},
                {"name": "retired-agent", "score": 0.99}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = RemoteDiscovery::new(
        format!("{}/search", mock_server.uri()),
        LocalDiscovery::new(directory()),
    );

    let results = provider
        .discover(&DiscoveryRequest::new("find me a crawler"))
        .await
        .unwrap();

    // Names unknown to the directory are dropped
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].agent.name, "crawler");
    assert_eq!(results[0].agent.endpoint, "http://crawler.local/tasks");
    assert_eq!(results[0].matched_capabilities, vec!["search".to_string()]);
    assert_eq!(results[1].agent.name, "warehouse");
}

#[tokio::test]
async fn test_remote_ranking_applies_resource_filter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                {"name": "crawler", "score": 0.9},
                {"name": "reviewer", "score": 0.5}
            ]
        })))
        .mount(&mock_server)
        .await;

    let provider = RemoteDiscovery::new(mock_server.uri(), LocalDiscovery::new(directory()));

    let request = DiscoveryRequest::new("anything")
        .with_resources(vec!["https://github.com/acme/web".to_string()]);
    let results = provider.discover(&request).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].agent.name, "reviewer");
    assert!((results[0].score - 0.7).abs() < 1e-9);
}

#[tokio::test]
async fn test_remote_failure_falls_back_to_local() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("index rebuilding"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = RemoteDiscovery::new(mock_server.uri(), LocalDiscovery::new(directory()));

    let results = provider
        .discover(&DiscoveryRequest::new("web search indexing"))
        .await
        .unwrap();

    assert_eq!(results[0].agent.name, "crawler");
    assert!((results[0].score - 2.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_remote_malformed_body_falls_back_to_local() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let provider = RemoteDiscovery::new(mock_server.uri(), LocalDiscovery::new(directory()));

    let results = provider
        .discover(&DiscoveryRequest::new("pull requests"))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].agent.name, "reviewer");
}

#[tokio::test]
async fn test_remote_empty_query_skips_search() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{"name": "crawler", "score": 0.9}]
        })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let provider = RemoteDiscovery::new(mock_server.uri(), LocalDiscovery::new(directory()));

    let results = provider
        .discover(&DiscoveryRequest::new("  !! "))
        .await
        .unwrap();

    assert!(results.is_empty());
}
