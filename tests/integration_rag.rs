#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end pipeline tests against mocked OpenAI and Supabase endpoints
// Run with: cargo test --test integration_rag

use serde_json::json;
use smartspidy_rag::config::Config;
use smartspidy_rag::rag::{QueryOptions, RagErrorKind, RagOrchestrator};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DIMENSION: usize = 64;

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}

fn test_config(openai: &MockServer, supabase: &MockServer) -> Config {
    let mut config = Config::default();
    config.openai.base_url = format!("{}/v1/", openai.uri());
    config.openai.api_key = "sk-test".to_string();
    config.openai.embedding_dimension = DIMENSION as u32;
    config.supabase.url = supabase.uri();
    config.supabase.api_key = "anon-key".to_string();
    config.rag.fallback_answer = "No relevant knowledge.".to_string();
    config
}

async fn mount_embeddings(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"index": 0, "embedding": vec![0.25_f32; DIMENSION]}]
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn answers_from_retrieved_chunks() {
    init_test_tracing();

    let openai = MockServer::start().await;
    let supabase = MockServer::start().await;

    mount_embeddings(&openai).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/match_knowledge_chunks"))
        .and(body_partial_json(json!({"match_threshold": 0.7, "match_count": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1,
                "chunk": "Fundraising is...",
                "combined_text": "Fundraising is...",
                "similarity": 0.75
            }
        ])))
        .expect(1)
        .mount(&supabase)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Fundraising means raising funds."}
            }]
        })))
        .expect(1)
        .mount(&openai)
        .await;

    let orchestrator = RagOrchestrator::from_config(&test_config(&openai, &supabase))
        .expect("orchestrator should build");

    let result = orchestrator
        .get_answer("What is fundraising?", QueryOptions::default())
        .await
        .expect("pipeline should succeed");

    assert_eq!(result.answer, "Fundraising means raising funds.");
    assert_eq!(result.sources.len(), 1);
    assert_eq!(result.sources[0].id, "1");
    assert_eq!(result.sources[0].text, "Fundraising is...");
    assert!((result.confidence - 0.75).abs() < f64::EPSILON);
}

#[tokio::test]
async fn no_matches_returns_configured_fallback() {
    init_test_tracing();

    let openai = MockServer::start().await;
    let supabase = MockServer::start().await;

    mount_embeddings(&openai).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/match_knowledge_chunks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&supabase)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&openai)
        .await;

    let orchestrator = RagOrchestrator::from_config(&test_config(&openai, &supabase))
        .expect("orchestrator should build");

    let result = orchestrator
        .get_answer("Where are my reminders?", QueryOptions::default())
        .await
        .expect("empty search is a success");

    assert_eq!(result.answer, "No relevant knowledge.");
    assert!(result.sources.is_empty());
    assert!(result.confidence.abs() < f64::EPSILON);
}

#[tokio::test]
async fn failing_search_is_reported_as_search_error() {
    init_test_tracing();

    let openai = MockServer::start().await;
    let supabase = MockServer::start().await;

    mount_embeddings(&openai).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/match_knowledge_chunks"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&supabase)
        .await;

    let orchestrator = RagOrchestrator::from_config(&test_config(&openai, &supabase))
        .expect("orchestrator should build");

    let error = orchestrator
        .get_answer("What is fundraising?", QueryOptions::default())
        .await
        .expect_err("search should fail");

    assert_eq!(error.kind(), RagErrorKind::Search);
    assert!(error.message().contains("500"), "{}", error.message());
}

#[tokio::test]
async fn unauthorized_embedding_is_reported_as_embedding_error() {
    init_test_tracing();

    let openai = MockServer::start().await;
    let supabase = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&openai)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/match_knowledge_chunks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&supabase)
        .await;

    let orchestrator = RagOrchestrator::from_config(&test_config(&openai, &supabase))
        .expect("orchestrator should build");

    let error = orchestrator
        .get_answer("What is fundraising?", QueryOptions::default())
        .await
        .expect_err("embedding should fail");

    assert_eq!(error.kind(), RagErrorKind::Embedding);
}
