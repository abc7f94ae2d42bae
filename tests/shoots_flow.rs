mod common;

use anyhow::{anyhow, Result};
use axum::http::StatusCode;
use common::{acquire_db_lock, json_body, TestApp};
use serde_json::{json, Value};

async fn create(app: &TestApp, path: &str, payload: Value, token: &str) -> Result<Value> {
    let response = app.post_json(path, &payload, Some(token)).await?;
    let status = response.status();
    let body = json_body(response).await?;
    if status != StatusCode::CREATED {
        return Err(anyhow!("POST {path} returned {status}: {body}"));
    }
    Ok(body)
}

fn id(value: &Value) -> &str {
    value["id"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn scheduled_shoot_requires_a_date() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.team_member_token("alice", "Alice Cosplay").await?;

    let response = app
        .post_json(
            "/api/shoots",
            &json!({ "title": "Zelda at the mill", "status": "scheduled" }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await?["error"],
        json!("a scheduled shoot needs a date")
    );

    let idea = create(&app, "/api/shoots", json!({ "title": "Someday" }), &token).await?;
    assert_eq!(idea["status"], json!("idea"));
    assert!(idea["date"].is_null());

    let path = format!("/api/shoots/{}", id(&idea));
    let response = app
        .patch_json(&path, &json!({ "status": "completed" }), Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .patch_json(
            &path,
            &json!({ "status": "scheduled", "date": "2024-07-20T00:00:00.000Z", "time": "14:00:00" }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let scheduled = json_body(response).await?;
    assert_eq!(scheduled["date"], json!("2024-07-20"));
    assert_eq!(scheduled["time"], json!("14:00"));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn legacy_status_is_stored_as_scheduled() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.team_member_token("alice", "Alice Cosplay").await?;

    let shoot = create(
        &app,
        "/api/shoots",
        json!({
            "title": "Rooftop Midna",
            "status": "ready to shoot",
            "date": "2024-08-02",
            "color": "#FFAA00",
            "durationMinutes": "90",
            "instagramLinks": ["https://instagram.com/p/1", "  "],
        }),
        &token,
    )
    .await?;

    assert_eq!(shoot["status"], json!("scheduled"));
    assert_eq!(shoot["color"], json!("#ffaa00"));
    assert_eq!(shoot["durationMinutes"], json!(90));
    assert_eq!(shoot["instagramLinks"], json!(["https://instagram.com/p/1"]));

    let response = app
        .post_json(
            "/api/shoots",
            &json!({ "title": "Bad", "status": "wrapped" }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn shoots_list_in_date_order_with_undated_last() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.team_member_token("alice", "Alice Cosplay").await?;

    create(&app, "/api/shoots", json!({ "title": "Undated" }), &token).await?;
    create(
        &app,
        "/api/shoots",
        json!({ "title": "Later", "status": "planning", "date": "2024-09-01" }),
        &token,
    )
    .await?;
    create(
        &app,
        "/api/shoots",
        json!({ "title": "Sooner", "status": "planning", "date": "2024-06-01" }),
        &token,
    )
    .await?;

    let response = app.get("/api/shoots", Some(&token)).await?;
    let list = json_body(response).await?;
    let titles: Vec<&str> = list
        .as_array()
        .map(|rows| rows.iter().filter_map(|row| row["title"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(titles, ["Sooner", "Later", "Undated"]);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn participants_snapshot_personnel_details() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.team_member_token("alice", "Alice Cosplay").await?;

    let shoot = create(&app, "/api/shoots", json!({ "title": "Forest Link" }), &token).await?;
    let person = create(
        &app,
        "/api/personnel",
        json!({ "name": "Aki", "email": "aki@example.com" }),
        &token,
    )
    .await?;
    let participants = format!("/api/shoots/{}/participants", id(&shoot));

    let participant = create(
        &app,
        &participants,
        json!({ "personnelId": id(&person), "role": "Photographer" }),
        &token,
    )
    .await?;
    assert_eq!(participant["name"], json!("Aki"));
    assert_eq!(participant["email"], json!("aki@example.com"));
    assert_eq!(participant["role"], json!("Photographer"));

    let response = app
        .post_json(&participants, &json!({ "personnelId": id(&person) }), Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .patch_json(
            &format!("/api/personnel/{}", id(&person)),
            &json!({ "name": "Aki Renamed" }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get(&participants, Some(&token)).await?;
    let list = json_body(response).await?;
    assert_eq!(list[0]["name"], json!("Aki"));

    let response = app
        .patch_json(
            &format!("{participants}/{}", id(&participant)),
            &json!({ "role": "Assistant" }),
            Some(&token),
        )
        .await?;
    assert_eq!(json_body(response).await?["role"], json!("Assistant"));

    let response = app
        .delete(&format!("{participants}/{}", id(&participant)), Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app.get(&participants, Some(&token)).await?;
    assert_eq!(json_body(response).await?, json!([]));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn equipment_links_are_idempotent_and_team_scoped() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let alice = app.team_member_token("alice", "Alice Cosplay").await?;
    let bob = app.team_member_token("bob", "Bob Studio").await?;

    let shoot = create(&app, "/api/shoots", json!({ "title": "Studio day" }), &alice).await?;
    let camera = create(
        &app,
        "/api/equipment",
        json!({ "name": "Canon EOS R5", "category": "Camera" }),
        &alice,
    )
    .await?;
    let foreign = create(
        &app,
        "/api/equipment",
        json!({ "name": "Bob's lens", "category": "Lens" }),
        &bob,
    )
    .await?;
    let linked = format!("/api/shoots/{}/equipment", id(&shoot));

    let first = create(&app, &linked, json!({ "equipmentId": id(&camera) }), &alice).await?;
    assert_eq!(first["name"], json!("Canon EOS R5"));
    create(&app, &linked, json!({ "id": id(&camera) }), &alice).await?;

    let response = app
        .post_json(&linked, &json!({ "equipmentId": id(&foreign) }), Some(&alice))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get(&linked, Some(&alice)).await?;
    let list = json_body(response).await?;
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let response = app.get(&linked, Some(&bob)).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .delete(&format!("{linked}/{}", id(&camera)), Some(&alice))
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app
        .delete(&format!("{linked}/{}", id(&camera)), Some(&alice))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn references_default_to_images() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.team_member_token("alice", "Alice Cosplay").await?;

    let shoot = create(&app, "/api/shoots", json!({ "title": "Moodboard" }), &token).await?;
    let references = format!("/api/shoots/{}/references", id(&shoot));

    let image = create(
        &app,
        &references,
        json!({ "url": "https://cdn/ref.png" }),
        &token,
    )
    .await?;
    assert_eq!(image["type"], json!("image"));

    let insta = create(
        &app,
        &references,
        json!({ "type": "instagram", "url": "https://instagram.com/p/abc" }),
        &token,
    )
    .await?;
    assert_eq!(insta["type"], json!("instagram"));

    let response = app
        .post_json(&references, &json!({ "type": "tiktok", "url": "x" }), Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .delete(&format!("{references}/{}", id(&image)), Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app.get(&references, Some(&token)).await?;
    assert_eq!(json_body(response).await?.as_array().map(Vec::len), Some(1));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn shoot_location_must_belong_to_team() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let alice = app.team_member_token("alice", "Alice Cosplay").await?;
    let bob = app.team_member_token("bob", "Bob Studio").await?;

    let mill = create(&app, "/api/locations", json!({ "name": "Old Mill" }), &alice).await?;
    let rooftop = create(&app, "/api/locations", json!({ "name": "Rooftop" }), &bob).await?;

    let shoot = create(
        &app,
        "/api/shoots",
        json!({ "title": "Mill", "locationId": id(&mill) }),
        &alice,
    )
    .await?;
    assert_eq!(shoot["locationId"], json!(id(&mill)));

    let response = app
        .post_json(
            "/api/shoots",
            &json!({ "title": "Rooftop", "locationId": id(&rooftop) }),
            Some(&alice),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}
