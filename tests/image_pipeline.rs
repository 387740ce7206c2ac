mod common;

use std::sync::Arc;

use anyhow::Result;

use picksheet::error::SelectionError;
use picksheet::images::{ImageResolver, extract_storage_path};
use picksheet::remote::RemoteClient;
use picksheet::session::{ItemField, SelectionSession};
use picksheet::store::{HeaderFields, SelectionStore};

#[test]
fn upload_yields_a_durable_resolvable_url() -> Result<()> {
    let server = common::spawn_server()?;
    let client = RemoteClient::new(&server.base_url, &server.token)?;
    let resolver = ImageResolver::new(&client);

    let url = resolver.upload("U1", "Flooring Type", "oak plank.png", b"png bytes".to_vec())?;
    assert!(url.starts_with(&server.base_url));
    assert!(url.ends_with("?alt=media"));

    let path = extract_storage_path(&url).expect("storage path");
    assert!(path.starts_with("uploads/U1/Flooring_Type/"));

    let resp = reqwest::blocking::Client::new()
        .get(&url)
        .header(reqwest::header::AUTHORIZATION, common::auth_header(&server.token))
        .send()?;
    assert!(resp.status().is_success());
    assert_eq!(resp.bytes()?.as_ref(), b"png bytes");
    Ok(())
}

#[test]
fn resolve_to_url_passes_durable_urls_through() -> Result<()> {
    let server = common::spawn_server()?;
    let client = RemoteClient::new(&server.base_url, &server.token)?;
    let resolver = ImageResolver::new(&client);

    let durable = "https://elsewhere.example/o/abc?alt=media";
    assert_eq!(resolver.resolve_to_url(durable), durable);

    let resolved = resolver.resolve_to_url("uploads/U1/cat/x.png");
    assert!(resolved.starts_with(&server.base_url));
    assert!(resolved.contains("uploads%2FU1%2Fcat%2Fx.png"));
    Ok(())
}

#[test]
fn append_image_rejects_non_durable_references() -> Result<()> {
    let server = common::spawn_server()?;
    let client = RemoteClient::new(&server.base_url, &server.token)?;
    let store = SelectionStore::new(&client);

    match store.append_image("U1", "Tile", 0, "preview://1/x.png") {
        Err(SelectionError::Validation(_)) => {}
        other => panic!("expected Validation, got {other:?}"),
    }
    Ok(())
}

#[test]
fn concurrent_same_slot_uploads_both_survive() -> Result<()> {
    let server = common::spawn_server()?;
    let client = RemoteClient::new(&server.base_url, &server.token)?;
    let store = SelectionStore::new(&client);

    let session = SelectionSession::default().set_field("Tile", 0, ItemField::TypeOrModel, "Hex");
    store.save_all("U1", &HeaderFields::default(), &session.to_persistable()?)?;

    let base_url = Arc::new(server.base_url.clone());
    let token = Arc::new(server.token.clone());
    let mut handles = Vec::new();
    for n in 0..2u8 {
        let base_url = Arc::clone(&base_url);
        let token = Arc::clone(&token);
        handles.push(std::thread::spawn(move || -> Result<String> {
            let client = RemoteClient::new(base_url.as_str(), token.as_str())?;
            let store = SelectionStore::new(&client);
            let bytes = vec![n; 64];
            Ok(store.persist_item_image("U1", "Tile", 0, &format!("photo-{n}.png"), bytes)?)
        }));
    }
    let mut urls = Vec::new();
    for handle in handles {
        urls.push(handle.join().expect("join upload thread")?);
    }
    assert_ne!(urls[0], urls[1]);

    let docs = store.load_categories("U1")?;
    let images = &docs[0].items[0].images;
    assert_eq!(images.len(), 2);
    for url in &urls {
        assert_eq!(images.iter().filter(|u| *u == url).count(), 1);
    }
    Ok(())
}

#[test]
fn repeated_append_of_the_same_url_is_stored_once() -> Result<()> {
    let server = common::spawn_server()?;
    let client = RemoteClient::new(&server.base_url, &server.token)?;
    let store = SelectionStore::new(&client);

    let session = SelectionSession::default().set_field("Tile", 0, ItemField::TypeOrModel, "Hex");
    store.save_all("U1", &HeaderFields::default(), &session.to_persistable()?)?;

    let url = "https://cdn.example/o/uploads%2FU1%2FTile%2Fabc_x.png?alt=media";
    store.append_image("U1", "Tile", 0, url)?;
    store.append_image("U1", "Tile", 0, url)?;

    let docs = store.load_categories("U1")?;
    assert_eq!(docs[0].items[0].images, vec![url]);
    Ok(())
}
