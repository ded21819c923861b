// tests/api_tests.rs

use score_tracker::{config::Config, routes, state::AppState, store::SqliteStore};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // 1. Create an in-memory pool. A single long-lived connection keeps
    //    the in-memory database alive for the whole test.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite for testing");

    // 2. Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    // 3. Create test configuration and state
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        rust_log: "error".to_string(),
    };

    let state = AppState {
        store: Arc::new(SqliteStore::new(pool)),
        config,
    };

    // 4. Create the router with the app state
    let app = routes::create_router(state);

    // 5. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 6. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn sample_attempt() -> serde_json::Value {
    serde_json::json!({
        "subject": "Control Systems",
        "category": "subject-wise",
        "provider": "MadeEasy",
        "maxMarks": 30,
        "obtainedMarks": 22.5,
        "testRank": 15,
        "totalTestTakers": 500,
        "date": "2026-01-10",
        "notes": "revise bode plots"
    })
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(&format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn create_attempt_derives_fields() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .post(&format!("{}/api/attempts", address))
        .json(&sample_attempt())
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 201);
    let created: serde_json::Value = response.json().await.unwrap();
    assert_eq!(created["percentage"], 75.0);
    assert_eq!(created["rankPercentile"], 97.0);
    assert!(!created["id"].as_str().unwrap().is_empty());
    // The count triple was never supplied, so it stays null.
    assert!(created["correctCount"].is_null());
}

#[tokio::test]
async fn create_attempt_fails_validation_with_field_and_reason() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let mut payload = sample_attempt();
    payload["obtainedMarks"] = serde_json::json!(35);

    // Act
    let response = client
        .post(&format!("{}/api/attempts", address))
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["field"], "obtainedMarks");
    assert_eq!(body["reason"], "exceeds maxMarks");
}

#[tokio::test]
async fn attempt_crud_flow() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // 1. Create
    let created: serde_json::Value = client
        .post(&format!("{}/api/attempts", address))
        .json(&sample_attempt())
        .send()
        .await
        .expect("Create failed")
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    // 2. Full replace-on-edit
    let mut updated = sample_attempt();
    updated["obtainedMarks"] = serde_json::json!(27);
    let response = client
        .put(&format!("{}/api/attempts/{}", address, id))
        .json(&updated)
        .send()
        .await
        .expect("Update failed");
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["percentage"], 90.0);

    // 3. List reflects the edit
    let listed: Vec<serde_json::Value> = client
        .get(&format!("{}/api/attempts", address))
        .send()
        .await
        .expect("List failed")
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["percentage"], 90.0);

    // 4. Delete is hard
    let response = client
        .delete(&format!("{}/api/attempts/{}", address, id))
        .send()
        .await
        .expect("Delete failed");
    assert_eq!(response.status().as_u16(), 204);

    // 5. Deleting again is a 404
    let response = client
        .delete(&format!("{}/api/attempts/{}", address, id))
        .send()
        .await
        .expect("Delete failed");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn update_unknown_id_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .put(&format!("{}/api/attempts/no-such-id", address))
        .json(&sample_attempt())
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn list_honours_filters() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    for (subject, date) in [
        ("Control Systems", "2026-01-10"),
        ("Networks", "2026-01-20"),
        ("Networks", "2026-02-05"),
    ] {
        let mut payload = sample_attempt();
        payload["subject"] = serde_json::json!(subject);
        payload["date"] = serde_json::json!(date);
        client
            .post(&format!("{}/api/attempts", address))
            .json(&payload)
            .send()
            .await
            .expect("Seed failed");
    }

    let listed: Vec<serde_json::Value> = client
        .get(&format!(
            "{}/api/attempts?subject=Networks&dateTo=2026-01-31",
            address
        ))
        .send()
        .await
        .expect("List failed")
        .json()
        .await
        .unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["date"], "2026-01-20");

    // "All" sentinel disables the subject filter.
    let listed: Vec<serde_json::Value> = client
        .get(&format!("{}/api/attempts?subject=All", address))
        .send()
        .await
        .expect("List failed")
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 3);
}

#[tokio::test]
async fn stats_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Seed three subject-wise attempts at 40/60/50 percent.
    for (obtained, date) in [(12.0, "2026-01-05"), (18.0, "2026-01-12"), (15.0, "2026-01-19")] {
        let mut payload = sample_attempt();
        payload["obtainedMarks"] = serde_json::json!(obtained);
        payload["date"] = serde_json::json!(date);
        payload.as_object_mut().unwrap().remove("testRank");
        payload.as_object_mut().unwrap().remove("totalTestTakers");
        client
            .post(&format!("{}/api/attempts", address))
            .json(&payload)
            .send()
            .await
            .expect("Seed failed");
    }

    // And one ranked full-length mock.
    let mock = serde_json::json!({
        "category": "full-length",
        "provider": "Ace",
        "maxMarks": 100,
        "obtainedMarks": 70,
        "testRank": 15,
        "totalTestTakers": 500,
        "date": "2026-01-25"
    });
    client
        .post(&format!("{}/api/attempts", address))
        .json(&mock)
        .send()
        .await
        .expect("Seed failed");

    let stats: serde_json::Value = client
        .get(&format!("{}/api/stats", address))
        .send()
        .await
        .expect("Stats failed")
        .json()
        .await
        .unwrap();

    assert_eq!(stats["summary"]["totalCount"], 4);
    assert_eq!(stats["summary"]["rankedCount"], 1);
    assert_eq!(stats["summary"]["avgRankPercentile"], 97.0);

    // Control Systems averages 50 and is weak (< 65).
    assert_eq!(stats["subjectAverages"][0]["subject"], "Control Systems");
    assert_eq!(stats["subjectAverages"][0]["avg"], 50.0);
    assert_eq!(stats["subjectAverages"][0]["count"], 3);
    assert_eq!(stats["weakestSubjects"][0]["subject"], "Control Systems");

    // The full-length mock is alone in its trend and in the rank trend.
    assert_eq!(stats["fullTestTrend"].as_array().unwrap().len(), 1);
    assert_eq!(stats["rankTrend"].as_array().unwrap().len(), 1);
    assert_eq!(stats["rankTrend"][0]["value"], 97.0);
    assert_eq!(stats["overallTrend"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn export_and_import_round_trip() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    client
        .post(&format!("{}/api/attempts", address))
        .json(&sample_attempt())
        .send()
        .await
        .expect("Seed failed");

    // Export the interchange payload.
    let exported = client
        .get(&format!("{}/api/export/json", address))
        .send()
        .await
        .expect("Export failed")
        .text()
        .await
        .unwrap();

    let mut records: Vec<serde_json::Value> = serde_json::from_str(&exported).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["percentage"], 75.0);

    // Re-import into a fresh app: ids survive, derived fields recomputed.
    let other = spawn_app().await;
    records.push(serde_json::json!({ "category": "mock" })); // malformed
    let response = client
        .post(&format!("{}/api/import", other))
        .body(serde_json::to_string(&records).unwrap())
        .send()
        .await
        .expect("Import failed");
    assert_eq!(response.status().as_u16(), 201);
    let report: serde_json::Value = response.json().await.unwrap();
    assert_eq!(report["imported"], 1);
    assert_eq!(report["skipped"], 1);

    let listed: Vec<serde_json::Value> = client
        .get(&format!("{}/api/attempts", other))
        .send()
        .await
        .expect("List failed")
        .json()
        .await
        .unwrap();
    assert_eq!(listed[0]["id"], records[0]["id"]);
}

#[tokio::test]
async fn import_with_id_collision_writes_nothing() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Seed an attempt with a known id.
    let mut seeded = sample_attempt();
    seeded["id"] = serde_json::json!("dup-1");
    client
        .post(&format!("{}/api/attempts", address))
        .json(&seeded)
        .send()
        .await
        .expect("Seed failed");

    // Import a batch where the second record collides with it.
    let mut fresh = sample_attempt();
    fresh["id"] = serde_json::json!("new-1");
    let payload = serde_json::json!([fresh, seeded]);
    let response = client
        .post(&format!("{}/api/import", address))
        .body(payload.to_string())
        .send()
        .await
        .expect("Import failed");
    assert_eq!(response.status().as_u16(), 400);

    // All-or-nothing: the non-colliding record was rolled back too.
    let listed: Vec<serde_json::Value> = client
        .get(&format!("{}/api/attempts", address))
        .send()
        .await
        .expect("List failed")
        .json()
        .await
        .unwrap();
    let ids: Vec<&str> = listed.iter().map(|a| a["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["dup-1"]);
}

#[tokio::test]
async fn import_rejects_non_array_payload() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/api/import", address))
        .body("{\"attempts\": []}")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);

    // Zero records written.
    let listed: Vec<serde_json::Value> = client
        .get(&format!("{}/api/attempts", address))
        .send()
        .await
        .expect("List failed")
        .json()
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn csv_export_has_fixed_header() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    client
        .post(&format!("{}/api/attempts", address))
        .json(&sample_attempt())
        .send()
        .await
        .expect("Seed failed");

    let response = client
        .get(&format!("{}/api/export/csv", address))
        .send()
        .await
        .expect("Export failed");

    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/csv"
    );
    let text = response.text().await.unwrap();
    assert!(text.starts_with(
        "subject,category,provider,maxMarks,obtainedMarks,correctCount,incorrectCount,\
notAttemptedCount,percentage,testRank,totalTestTakers,rankPercentile,date,notes\n"
    ));
    assert!(text.contains("Control Systems,subject-wise,MadeEasy,30,22.5,"));
}
