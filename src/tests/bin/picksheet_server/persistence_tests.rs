use super::*;

#[test]
fn merge_overwrites_only_patched_fields() {
    let mut target = serde_json::json!({ "a": 1, "b": { "keep": true }, "c": "old" });
    merge_into(&mut target, &serde_json::json!({ "c": "new", "d": 4 }));
    assert_eq!(
        target,
        serde_json::json!({ "a": 1, "b": { "keep": true }, "c": "new", "d": 4 })
    );
}

#[test]
fn merge_replaces_non_object_targets() {
    let mut target = Value::Null;
    merge_into(&mut target, &serde_json::json!({ "x": 1 }));
    assert_eq!(target, serde_json::json!({ "x": 1 }));
}

#[test]
fn next_updated_at_never_goes_backwards() {
    let far_future = "2999-01-01T00:00:00Z";
    let bumped = next_updated_at(Some(far_future));
    assert!(bumped.starts_with("2999-01-01T00:00:00.001"));
}

#[test]
fn next_updated_at_uses_wall_clock_when_ahead() {
    let ts = next_updated_at(Some("2000-01-01T00:00:00Z"));
    assert!(ts.as_str() > "2025-01-01T00:00:00Z");
}

#[test]
fn owner_records_roundtrip_through_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut record = OwnerRecord {
        header: serde_json::json!({ "owner_id": "U1", "display_name": "Pat" }),
        categories: Default::default(),
    };
    record.categories.insert(
        "Flooring_Type".to_string(),
        serde_json::json!({ "category_label": "Flooring Type", "items": [] }),
    );
    persist_owner(dir.path(), "U1", &record)?;

    let loaded = load_owners_from_disk(dir.path())?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded["U1"].header["display_name"], "Pat");
    assert!(loaded["U1"].categories.contains_key("Flooring_Type"));

    remove_owner_file(dir.path(), "U1")?;
    remove_owner_file(dir.path(), "U1")?;
    assert!(load_owners_from_disk(dir.path())?.is_empty());
    Ok(())
}
