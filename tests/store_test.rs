use reqwest::Url;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use content_remixer::store::{SavedItemStore, SqliteStore, StoreError, SupabaseStore};

async fn memory_store() -> SqliteStore {
    SqliteStore::connect("sqlite::memory:").await.unwrap()
}

#[tokio::test]
async fn empty_table_lists_nothing() {
    let store = memory_store().await;
    assert!(store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn create_then_list_puts_new_item_first() {
    let store = memory_store().await;
    store.create("older").await.unwrap();
    let before = store.list_all().await.unwrap();

    store.create("newest").await.unwrap();
    let after = store.list_all().await.unwrap();

    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(after[0].content, "newest");
    assert_eq!(after[1].content, "older");
    assert!(after[0].created_at >= after[1].created_at);
    assert_ne!(after[0].id, after[1].id);
}

#[tokio::test]
async fn list_is_idempotent() {
    let store = memory_store().await;
    for text in ["a", "b", "c"] {
        store.create(text).await.unwrap();
    }
    let first = store.list_all().await.unwrap();
    let second = store.list_all().await.unwrap();
    assert_eq!(first, second);
    let contents: Vec<&str> = first.iter().map(|i| i.content.as_str()).collect();
    assert_eq!(contents, vec!["c", "b", "a"]);
}

#[tokio::test]
async fn update_replaces_content_and_keeps_id() {
    let store = memory_store().await;
    store.create("draft").await.unwrap();
    let id = store.list_all().await.unwrap()[0].id;

    store.update(id, "final").await.unwrap();
    let items = store.list_all().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, id);
    assert_eq!(items[0].content, "final");
}

#[tokio::test]
async fn delete_removes_only_that_item() {
    let store = memory_store().await;
    store.create("keep").await.unwrap();
    store.create("drop").await.unwrap();
    let items = store.list_all().await.unwrap();
    let drop_id = items.iter().find(|i| i.content == "drop").unwrap().id;

    store.delete(drop_id).await.unwrap();
    let items = store.list_all().await.unwrap();
    assert!(items.iter().all(|i| i.id != drop_id));
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].content, "keep");
}

#[tokio::test]
async fn unknown_ids_are_not_errors() {
    let store = memory_store().await;
    store.create("only").await.unwrap();
    store.update(9999, "ghost").await.unwrap();
    store.delete(9999).await.unwrap();
    let items = store.list_all().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].content, "only");
}

fn supabase_for(server: &MockServer) -> SupabaseStore {
    SupabaseStore::new(
        Some(Url::parse(&server.uri()).unwrap()),
        "anon-key".into(),
        "saved_tweets".into(),
    )
}

#[tokio::test]
async fn supabase_list_decodes_rows_in_server_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/saved_tweets"))
        .and(query_param("select", "*"))
        .and(query_param("order", "created_at.desc,id.desc"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 5, "content": "new", "created_at": "2024-05-02T09:00:00.000001+00:00" },
            { "id": 3, "content": "old", "created_at": "2024-05-01T09:00:00+00:00" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let items = supabase_for(&server).list_all().await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, 5);
    assert_eq!(items[0].content, "new");
    assert_eq!(items[1].id, 3);
}

#[tokio::test]
async fn supabase_mutations_hit_expected_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/saved_tweets"))
        .and(header("prefer", "return=minimal"))
        .and(body_json(json!([{ "content": "hello" }])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/saved_tweets"))
        .and(query_param("id", "eq.3"))
        .and(body_json(json!({ "content": "edited" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/saved_tweets"))
        .and(query_param("id", "eq.3"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = supabase_for(&server);
    store.create("hello").await.unwrap();
    store.update(3, "edited").await.unwrap();
    store.delete(3).await.unwrap();
}

#[tokio::test]
async fn supabase_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(403).set_body_string(r#"{"message":"permission denied"}"#),
        )
        .mount(&server)
        .await;

    let err = supabase_for(&server).create("nope").await.unwrap_err();
    match err {
        StoreError::Api { status, body } => {
            assert_eq!(status.as_u16(), 403);
            assert!(body.contains("permission denied"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn supabase_without_url_fails_every_call() {
    let store = SupabaseStore::new(None, "anon-key".into(), "saved_tweets".into());
    assert!(matches!(
        store.list_all().await,
        Err(StoreError::MissingConfig("supabase.url"))
    ));
    assert!(matches!(
        store.create("x").await,
        Err(StoreError::MissingConfig(_))
    ));
}
