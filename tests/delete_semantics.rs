mod common;

use anyhow::Result;

use picksheet::error::SelectionError;
use picksheet::images::extract_storage_path;
use picksheet::remote::RemoteClient;
use picksheet::session::{ItemField, SelectionSession};
use picksheet::store::{HeaderFields, SelectionStore};

#[test]
fn delete_item_shifts_later_items_down() -> Result<()> {
    let server = common::spawn_server()?;
    let client = RemoteClient::new(&server.base_url, &server.token)?;
    let store = SelectionStore::new(&client);

    let session = SelectionSession::default()
        .set_field("Tile", 0, ItemField::TypeOrModel, "A")
        .set_field("Tile", 1, ItemField::TypeOrModel, "B")
        .set_field("Tile", 2, ItemField::TypeOrModel, "C");
    store.save_all("U1", &HeaderFields::default(), &session.to_persistable()?)?;

    store.delete_item("U1", "Tile", 1)?;

    let docs = store.load_categories("U1")?;
    let types: Vec<&str> = docs[0]
        .items
        .iter()
        .map(|i| i.type_or_model.as_str())
        .collect();
    assert_eq!(types, vec!["A", "C"]);
    Ok(())
}

#[test]
fn delete_item_rejects_stale_indices_and_missing_categories() -> Result<()> {
    let server = common::spawn_server()?;
    let client = RemoteClient::new(&server.base_url, &server.token)?;
    let store = SelectionStore::new(&client);

    let session = SelectionSession::default().set_field("Tile", 0, ItemField::TypeOrModel, "A");
    store.save_all("U1", &HeaderFields::default(), &session.to_persistable()?)?;

    match store.delete_item("U1", "Tile", 5) {
        Err(SelectionError::NotFound(_)) => {}
        other => panic!("expected NotFound for stale index, got {other:?}"),
    }
    match store.delete_item("U1", "Wallpaper", 0) {
        Err(SelectionError::NotFound(_)) => {}
        other => panic!("expected NotFound for missing category, got {other:?}"),
    }

    // The stored document is untouched.
    let docs = store.load_categories("U1")?;
    assert_eq!(docs[0].items.len(), 1);
    Ok(())
}

#[test]
fn delete_owner_removes_docs_and_storage_and_is_idempotent() -> Result<()> {
    let server = common::spawn_server()?;
    let client = RemoteClient::new(&server.base_url, &server.token)?;
    let store = SelectionStore::new(&client);

    let session = SelectionSession::default().set_field("Tile", 0, ItemField::TypeOrModel, "Hex");
    store.save_all("U1", &HeaderFields::default(), &session.to_persistable()?)?;
    let url = store.persist_item_image("U1", "Tile", 0, "hex.png", b"png bytes".to_vec())?;
    let path = extract_storage_path(&url).expect("stored image path");

    store.delete_owner("U1")?;

    match store.load_header("U1") {
        Err(SelectionError::NotFound(_)) => {}
        other => panic!("expected NotFound after delete, got {:?}", other.map(|_| ())),
    }
    assert!(store.load_categories("U1")?.is_empty());
    assert!(client.list_prefix("uploads/U1").is_ok_and(|l| l.items.is_empty()));

    // The durable URL no longer resolves.
    let resp = reqwest::blocking::Client::new()
        .get(&url)
        .header(reqwest::header::AUTHORIZATION, common::auth_header(&server.token))
        .send()?;
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND, "{path}");

    // Second delete is a no-op success.
    store.delete_owner("U1")?;
    Ok(())
}
