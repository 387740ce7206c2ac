use super::*;

#[test]
fn encode_keeps_unreserved_chars() {
    assert_eq!(encode_storage_path("abc-DEF_1.2~x"), "abc-DEF_1.2~x");
}

#[test]
fn encode_escapes_slashes_and_spaces() {
    assert_eq!(
        encode_storage_path("uploads/U1/cat/a b.png"),
        "uploads%2FU1%2Fcat%2Fa%20b.png"
    );
}

#[test]
fn decode_is_the_inverse_of_encode() {
    let path = "uploads/U1/Flooring_Type/0011aabb_oak plank.png";
    assert_eq!(
        decode_storage_path(&encode_storage_path(path)).as_deref(),
        Some(path)
    );
}

#[test]
fn decode_rejects_malformed_sequences() {
    assert_eq!(decode_storage_path("abc%"), None);
    assert_eq!(decode_storage_path("abc%2"), None);
    assert_eq!(decode_storage_path("abc%zz"), None);
}
