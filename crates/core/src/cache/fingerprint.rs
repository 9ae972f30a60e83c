//! Query fingerprints used as cache keys.

use serde_json::json;
use sha2::{Digest, Sha256};
use tokio_rusqlite::rusqlite::types::Value;

/// Compute the cache fingerprint of a read statement and its bound arguments.
///
/// SHA-256 over the exact SQL text and the JSON encoding of the ordered
/// parameter list. Whitespace, argument order and argument storage class
/// are all significant.
pub fn compute_fingerprint(sql: &str, params: &[Value]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sql.as_bytes());
    hasher.update(b"\n");
    hasher.update(encode_params(params).as_bytes());
    hex::encode(hasher.finalize())
}

/// Each argument is tagged with its storage class, so a blob never encodes
/// like the text of its hex digits. Reals are keyed by their bit pattern.
fn encode_params(params: &[Value]) -> String {
    let encoded: Vec<serde_json::Value> = params
        .iter()
        .map(|v| match v {
            Value::Null => serde_json::Value::Null,
            Value::Integer(i) => json!({ "i": i }),
            Value::Real(f) => json!({ "r": f.to_bits() }),
            Value::Text(t) => json!({ "t": t }),
            Value::Blob(b) => json!({ "b": hex::encode(b) }),
        })
        .collect();
    serde_json::Value::Array(encoded).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQL: &str = "SELECT * FROM resources WHERE id = ?";

    #[test]
    fn test_fingerprint_stability() {
        let a = compute_fingerprint(SQL, &[Value::Integer(1)]);
        let b = compute_fingerprint(SQL, &[Value::Integer(1)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_different_params() {
        let one = compute_fingerprint(SQL, &[Value::Integer(1)]);
        let two = compute_fingerprint(SQL, &[Value::Integer(2)]);
        assert_ne!(one, two);
    }

    #[test]
    fn test_fingerprint_param_order() {
        let sql = "SELECT * FROM resources WHERE id = ? AND category_id = ?";
        let ab = compute_fingerprint(sql, &[Value::Integer(1), Value::Integer(2)]);
        let ba = compute_fingerprint(sql, &[Value::Integer(2), Value::Integer(1)]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_fingerprint_distinguishes_text_from_integer() {
        let int = compute_fingerprint(SQL, &[Value::Integer(1)]);
        let text = compute_fingerprint(SQL, &[Value::Text("1".into())]);
        assert_ne!(int, text);
    }

    #[test]
    fn test_fingerprint_distinguishes_blob_from_hex_text() {
        let blob = compute_fingerprint(SQL, &[Value::Blob(vec![0xde, 0xad])]);
        let text = compute_fingerprint(SQL, &[Value::Text("dead".into())]);
        assert_ne!(blob, text);
    }

    #[test]
    fn test_fingerprint_distinguishes_nan_from_null() {
        let nan = compute_fingerprint(SQL, &[Value::Real(f64::NAN)]);
        let null = compute_fingerprint(SQL, &[Value::Null]);
        assert_ne!(nan, null);
    }

    #[test]
    fn test_fingerprint_different_sql() {
        let a = compute_fingerprint("SELECT id FROM resources", &[]);
        let b = compute_fingerprint("SELECT id FROM categories", &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = compute_fingerprint(SQL, &[Value::Null]);
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
