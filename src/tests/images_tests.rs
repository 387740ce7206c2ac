use super::*;

#[test]
fn extract_storage_path_decodes_encoded_slashes() {
    assert_eq!(
        extract_storage_path("https://cdn.example/o/uploads%2FU1%2Fcat%2F123_x.png?token=abc"),
        Some("uploads/U1/cat/123_x.png".to_string())
    );
}

#[test]
fn extract_storage_path_ignores_fragment() {
    assert_eq!(
        extract_storage_path("https://cdn.example/o/uploads%2FU1%2Fa.png#top"),
        Some("uploads/U1/a.png".to_string())
    );
}

#[test]
fn extract_storage_path_rejects_foreign_urls() {
    assert_eq!(extract_storage_path("not-a-url"), None);
    assert_eq!(extract_storage_path("https://cdn.example/x/abc"), None);
    assert_eq!(extract_storage_path("https://cdn.example/o/"), None);
    assert_eq!(extract_storage_path("https://cdn.example/o/%zz"), None);
}

#[test]
fn preview_refs_are_unique_and_never_durable() {
    let a = issue_preview("photo.png");
    let b = issue_preview("photo.png");
    assert_ne!(a, b);
    assert!(is_preview_ref(&a));
    assert!(a.ends_with("/photo.png"));
    assert!(!is_durable_url(&a));
}

#[test]
fn upload_path_is_stable_for_identical_bytes() {
    let a = upload_path("U1", "Flooring Type", "oak plank.png", b"bytes");
    let b = upload_path("U1", "Flooring Type", "oak plank.png", b"bytes");
    assert_eq!(a, b);
    assert!(a.starts_with("uploads/U1/Flooring_Type/"));
    assert!(a.ends_with("_oak_plank.png"));

    let c = upload_path("U1", "Flooring Type", "oak plank.png", b"other bytes");
    assert_ne!(a, c);
}

#[test]
fn sanitize_filename_keeps_safe_chars_only() {
    assert_eq!(sanitize_filename("oak plank (2).png"), "oak_plank__2_.png");
    assert_eq!(sanitize_filename(""), "file");
    assert_eq!(sanitize_filename("ok-file_1.png"), "ok-file_1.png");
}
