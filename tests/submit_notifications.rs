mod common;

use anyhow::{Context, Result};

use picksheet::remote::RemoteClient;

#[test]
fn notifications_are_recorded_in_order() -> Result<()> {
    let server = common::spawn_server()?;
    let client = RemoteClient::new(&server.base_url, &server.token)?;

    client.notify_submitted("Pat Example", "pat@example.com")?;
    client.notify_submitted("Sam Example", "sam@example.com")?;

    let path = server.data_dir.path().join("notifications.json");
    let bytes = std::fs::read(&path).context("read notifications.json")?;
    let entries: Vec<serde_json::Value> =
        serde_json::from_slice(&bytes).context("parse notifications.json")?;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["display_name"], "Pat Example");
    assert_eq!(entries[0]["email"], "pat@example.com");
    assert_eq!(entries[1]["display_name"], "Sam Example");
    assert!(entries[0]["received_at"].as_str().is_some_and(|s| !s.is_empty()));
    Ok(())
}

#[test]
fn notify_requires_authentication() -> Result<()> {
    let server = common::spawn_server()?;
    let resp = reqwest::blocking::Client::new()
        .post(format!("{}/notify", server.base_url))
        .json(&serde_json::json!({ "display_name": "x", "email": "y" }))
        .send()?;
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    Ok(())
}
