//! Tag list storage format.
//!
//! Tags live in a single TEXT column as a JSON array of strings.

use serde::{Deserialize, Deserializer, de::Error as _};

use crate::Error;

/// Encode tags for storage.
pub fn encode(tags: &[String]) -> Result<String, Error> {
    serde_json::to_string(tags).map_err(Error::from)
}

/// Decode a stored tag column. `NULL` and blank values decode to no tags.
pub fn decode(raw: Option<&str>) -> Result<Vec<String>, Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(json) => serde_json::from_str(json).map_err(|e| Error::InvalidData(format!("malformed tags: {e}"))),
    }
}

/// Either form a tag list can arrive in: a serialized record carries the
/// list itself, a storage row carries the JSON text column.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTags {
    List(Vec<String>),
    Text(Option<String>),
}

/// Serde adapter accepting the stored column or an already decoded list.
pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    match StoredTags::deserialize(deserializer)? {
        StoredTags::List(tags) => Ok(tags),
        StoredTags::Text(raw) => decode(raw.as_deref()).map_err(D::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let tags = vec!["ai".to_string(), "tool".to_string()];
        let stored = encode(&tags).unwrap();
        assert_eq!(stored, r#"["ai","tool"]"#);
        assert_eq!(decode(Some(&stored)).unwrap(), tags);
    }

    #[test]
    fn test_decode_absent_or_blank() {
        assert!(decode(None).unwrap().is_empty());
        assert!(decode(Some("")).unwrap().is_empty());
        assert!(decode(Some("  ")).unwrap().is_empty());
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(decode(Some("not json")), Err(Error::InvalidData(_))));
    }

    #[derive(Debug, Deserialize)]
    struct Tagged {
        #[serde(deserialize_with = "deserialize")]
        tags: Vec<String>,
    }

    #[test]
    fn test_deserialize_accepts_column_and_list() {
        let from_column: Tagged = serde_json::from_value(serde_json::json!({ "tags": r#"["ai","tool"]"# })).unwrap();
        let from_list: Tagged = serde_json::from_value(serde_json::json!({ "tags": ["ai", "tool"] })).unwrap();
        let from_null: Tagged = serde_json::from_value(serde_json::json!({ "tags": null })).unwrap();

        assert_eq!(from_column.tags, vec!["ai", "tool"]);
        assert_eq!(from_list.tags, from_column.tags);
        assert!(from_null.tags.is_empty());
        assert!(serde_json::from_value::<Tagged>(serde_json::json!({ "tags": "not json" })).is_err());
    }
}
