mod common;

use anyhow::Result;

use picksheet::model::Status;
use picksheet::remote::RemoteClient;
use picksheet::session::{ItemField, SelectionSession};
use picksheet::store::{HeaderFields, SelectionStore};

fn seed(store: &SelectionStore) -> Result<()> {
    let session =
        SelectionSession::default().set_field("Flooring Type", 0, ItemField::TypeOrModel, "Oak");
    store.save_all(
        "U1",
        &HeaderFields {
            display_name: "Pat".into(),
            contact_email: "pat@example.com".into(),
            status: Some(Status::Pending),
        },
        &session.to_persistable()?,
    )?;
    Ok(())
}

#[test]
fn set_status_preserves_unrelated_header_fields() -> Result<()> {
    let server = common::spawn_server()?;
    let client = RemoteClient::new(&server.base_url, &server.token)?;
    let store = SelectionStore::new(&client);
    seed(&store)?;

    store.set_status("U1", &Status::Reviewed)?;

    let header = store.load_header("U1")?;
    assert_eq!(header.status, Status::Reviewed);
    assert_eq!(header.display_name, "Pat");
    assert_eq!(header.contact_email, "pat@example.com");
    assert_eq!(header.category_summary["Flooring Type"].count, 1);
    Ok(())
}

#[test]
fn any_status_moves_to_any_other_status() -> Result<()> {
    let server = common::spawn_server()?;
    let client = RemoteClient::new(&server.base_url, &server.token)?;
    let store = SelectionStore::new(&client);
    seed(&store)?;

    for status in [
        Status::Submitted,
        Status::Pending,
        Status::Final,
        Status::Other("on-hold".into()),
        Status::Reviewed,
    ] {
        store.set_status("U1", &status)?;
        assert_eq!(store.load_header("U1")?.status, status);
    }
    Ok(())
}

#[test]
fn save_without_status_leaves_stored_status_alone() -> Result<()> {
    let server = common::spawn_server()?;
    let client = RemoteClient::new(&server.base_url, &server.token)?;
    let store = SelectionStore::new(&client);
    seed(&store)?;
    store.set_status("U1", &Status::Submitted)?;

    let session = SelectionSession::default()
        .set_field("Flooring Type", 0, ItemField::TypeOrModel, "Maple")
        .set_field("Flooring Type", 1, ItemField::TypeOrModel, "Walnut");
    store.save_all(
        "U1",
        &HeaderFields {
            display_name: "Pat".into(),
            contact_email: "pat@example.com".into(),
            status: None,
        },
        &session.to_persistable()?,
    )?;

    let header = store.load_header("U1")?;
    assert_eq!(header.status, Status::Submitted);
    assert_eq!(header.category_summary["Flooring Type"].count, 2);
    Ok(())
}

#[test]
fn resave_overwrites_items_and_bumps_updated_at() -> Result<()> {
    let server = common::spawn_server()?;
    let client = RemoteClient::new(&server.base_url, &server.token)?;
    let store = SelectionStore::new(&client);
    seed(&store)?;
    let first = store.load_header("U1")?.updated_at;

    let session =
        SelectionSession::default().set_field("Flooring Type", 0, ItemField::TypeOrModel, "Maple");
    store.save_all("U1", &HeaderFields::default(), &session.to_persistable()?)?;

    let header = store.load_header("U1")?;
    assert_ne!(header.updated_at, first);

    let docs = store.load_categories("U1")?;
    assert_eq!(docs[0].items[0].type_or_model, "Maple");
    Ok(())
}
