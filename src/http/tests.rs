use super::*;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string, header, method, path},
};

fn endpoint(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), route)).expect("mock url should parse")
}

#[test]
fn bearer_auth_skips_empty_key() {
    assert!(bearer_auth("").is_empty());
    assert_eq!(
        bearer_auth("sk-123"),
        vec![("Authorization", "Bearer sk-123".to_string())]
    );
}

#[tokio::test]
async fn get_text_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(header("apikey", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .expect(1)
        .mount(&server)
        .await;

    let url = endpoint(&server, "/ping");
    let body = run_blocking("ping", move || {
        let agent = build_agent(Duration::from_secs(5));
        Ok(get_text(&agent, &url, &vec![("apikey", "secret".to_string())])?)
    })
    .await
    .expect("request should succeed");

    assert_eq!(body, "pong");
}

#[tokio::test]
async fn post_json_sends_body_and_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(header("Content-Type", "application/json"))
        .and(body_string(r#"{"hello":"world"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let url = endpoint(&server, "/echo");
    let body = run_blocking("echo", move || {
        let agent = build_agent(Duration::from_secs(5));
        Ok(post_json(&agent, &url, &Vec::new(), r#"{"hello":"world"}"#)?)
    })
    .await
    .expect("request should succeed");

    assert_eq!(body, r#"{"ok":true}"#);
}

#[tokio::test]
async fn status_errors_carry_the_code() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let url = endpoint(&server, "/broken");
    let error = run_blocking("broken", move || {
        let agent = build_agent(Duration::from_secs(5));
        match post_json(&agent, &url, &Vec::new(), "{}") {
            Ok(_) => Ok(None),
            Err(e) => Ok(Some(e)),
        }
    })
    .await
    .expect("task should complete")
    .expect("request should fail");

    assert_eq!(error.status(), Some(503));
    assert!(error.to_string().contains("503"));
}

#[tokio::test]
async fn run_blocking_propagates_errors() {
    let result: anyhow::Result<()> =
        run_blocking("failing", || Err(anyhow!("boom"))).await;

    let message = result.expect_err("error should propagate").to_string();
    assert_eq!(message, "boom");
}
