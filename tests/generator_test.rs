use reqwest::Url;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use content_remixer::generator::{
    GenerationError, Generator, OpenAiClient, GENERIC_FAILURE_MESSAGE, SYSTEM_PROMPT,
    UNEXPECTED_FORMAT_MESSAGE,
};

fn generator_for(server: &MockServer, api_key: &str) -> Generator {
    let base = Url::parse(&format!("{}/v1/", server.uri())).unwrap();
    let client = OpenAiClient::with_base_url(api_key.into(), base);
    Generator::new(Arc::new(client), "gpt-test")
}

fn completion(content: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }
        ]
    }))
}

#[tokio::test]
async fn hello_world_yields_two_posts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-test",
            "temperature": 0.7,
            "max_tokens": 1024,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": "Hello world" }
            ]
        })))
        .respond_with(completion(json!("1. First\n---\n2. Second\n---\n")))
        .expect(1)
        .mount(&server)
        .await;

    let posts = generator_for(&server, "sk-test")
        .generate("Hello world")
        .await
        .unwrap();
    assert_eq!(posts, vec!["1. First".to_string(), "2. Second".to_string()]);
}

#[tokio::test]
async fn blank_input_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion(json!("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let posts = generator_for(&server, "sk-test").generate("  \n\t").await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn empty_content_is_a_distinct_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion(json!("")))
        .mount(&server)
        .await;

    let err = generator_for(&server, "sk-test")
        .generate("Hello world")
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::EmptyContent));
    assert_eq!(err.user_message(), UNEXPECTED_FORMAT_MESSAGE);
}

#[tokio::test]
async fn null_content_and_no_choices_fail_the_same_way() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion(serde_json::Value::Null))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let generator = generator_for(&server, "sk-test");
    assert!(matches!(
        generator.generate("x").await,
        Err(GenerationError::EmptyContent)
    ));
    assert!(matches!(
        generator.generate("x").await,
        Err(GenerationError::EmptyContent)
    ));
}

#[tokio::test]
async fn auth_failure_maps_to_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("{\"error\":\"bad key\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let err = generator_for(&server, "sk-wrong")
        .generate("Hello world")
        .await
        .unwrap_err();
    match &err {
        GenerationError::Api { status, body } => {
            assert_eq!(status.as_u16(), 401);
            assert!(body.contains("bad key"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = generator_for(&server, "sk-test")
        .generate("Hello world")
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Decode(_)));
    assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn missing_key_fails_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion(json!("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let err = generator_for(&server, "")
        .generate("Hello world")
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::MissingApiKey));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    // Nothing listens on a port whose listener has been dropped.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let base = Url::parse(&format!("http://127.0.0.1:{port}/v1/")).unwrap();
    let generator = Generator::new(
        Arc::new(OpenAiClient::with_base_url("sk-test".into(), base)),
        "gpt-test",
    );
    let err = generator.generate("Hello world").await.unwrap_err();
    assert!(matches!(err, GenerationError::Transport(_)));
}
