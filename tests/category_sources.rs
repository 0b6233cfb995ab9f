//! Integration tests for loading a catalogue into the app, from a JSON file
//! and from a mocked backend, and sending a bulk action for the selection.

use catalog_tree::api::{BulkAction, CategoryClient};
use catalog_tree::app::{App, CategorySource};
use catalog_tree::config::Config;
use catalog_tree::tree::SelectionState;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CATALOGUE: &str = r#"{"categories": [
    {"_id": "10", "parent": null, "name": "Garden", "slug": "garden", "level": 0, "productCount": 12},
    {"_id": "11", "parent": "10", "name": "Tools", "slug": "garden-tools", "level": 1, "isActive": false},
    {"_id": "12", "parent": "10", "name": "Seeds", "slug": "seeds", "level": 1},
    {"_id": "20", "parent": null, "name": "Kitchen", "slug": "kitchen", "level": 0}
]}"#;

fn temp_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "catalog-tree-{}-{}.json",
        name,
        std::process::id()
    ));
    std::fs::write(&path, content).unwrap();
    path
}

fn app_for(source: CategorySource) -> App {
    let mut app = App::new(source, &Config::default());
    app.viewport_height = 20;
    app
}

// ============================================================================
// File Source
// ============================================================================

#[tokio::test]
async fn test_file_source_populates_table() {
    let path = temp_file("table", CATALOGUE);
    let source = CategorySource::File(path.clone());
    let categories = source.fetch().await.unwrap();
    std::fs::remove_file(&path).ok();

    let mut app = app_for(source);
    app.set_categories(categories);
    let names: Vec<&str> = app.rows().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Garden", "Kitchen"]);
    assert_eq!(app.rows()[0].product_count, Some(12));

    app.expand_current();
    let tools = &app.rows()[1];
    assert_eq!(tools.slug, "garden-tools");
    assert!(!tools.is_active);
    assert_eq!(tools.guide, "├─ ");
}

#[tokio::test]
async fn test_file_source_rejects_garbage() {
    let path = temp_file("garbage", "not json at all");
    let source = CategorySource::File(path.clone());
    let err = source.fetch().await.unwrap_err();
    std::fs::remove_file(&path).ok();

    assert!(format!("{:#}", err).contains("Failed to load"));
}

// ============================================================================
// API Source
// ============================================================================

#[tokio::test]
async fn test_api_source_load_select_and_bulk_deactivate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CATALOGUE))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/categories/bulk"))
        .and(body_json(serde_json::json!({
            "action": "deactivate",
            "ids": ["10", "11", "12"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"modifiedCount": 2}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = CategoryClient::new(
        reqwest::Client::new(),
        &format!("{}/v1", server.uri()),
        None,
    )
    .unwrap()
    .with_retry_base_delay(Duration::from_millis(1));
    let client = Arc::new(client);

    let source = CategorySource::Api(Arc::clone(&client));
    let categories = source.fetch().await.unwrap();
    let mut app = app_for(source);
    app.set_categories(categories);

    // Selecting Garden cascades to both children
    app.toggle_select_current();
    assert_eq!(app.state_of("10"), SelectionState::Selected);
    assert_eq!(app.state_of("20"), SelectionState::Unselected);
    let ids = app.selected_ids();
    assert_eq!(ids, vec!["10", "11", "12"]);

    let outcome = client
        .bulk_action(BulkAction::Deactivate, &ids)
        .await
        .unwrap();
    assert_eq!(outcome.requested, 3);
    assert_eq!(outcome.affected, 2);
}

#[tokio::test]
async fn test_reload_keeps_surviving_selection() {
    let mut app = app_for(CategorySource::File(PathBuf::from("unused.json")));
    let first = catalog_tree::api::parse_category_payload(CATALOGUE).unwrap();
    app.set_categories(first.clone());
    app.expand_current();
    app.nav_down();
    app.toggle_select_current();
    assert_eq!(app.state_of("10"), SelectionState::Indeterminate);

    // "11" disappears on the backend
    let second: Vec<_> = first.into_iter().filter(|c| c.id != "11").collect();
    app.set_categories(second);
    assert!(app.selected.is_empty());
    assert_eq!(app.state_of("10"), SelectionState::Unselected);
    assert!(app.expansion.is_expanded("10"));
}
