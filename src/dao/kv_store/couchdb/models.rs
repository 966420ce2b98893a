use serde::{Deserialize, Serialize};

/// One KV entry, stored as a document whose `_id` is the key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchValueDocument {
    /// Storage key.
    #[serde(rename = "_id")]
    pub id: String,
    /// Revision being replaced; absent on first write.
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Stored value, kept as an opaque string.
    pub value: String,
}

/// Subset of the document used to learn the current revision.
#[derive(Debug, Deserialize)]
pub struct CouchRevision {
    /// Current revision.
    #[serde(rename = "_rev")]
    pub rev: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_documents_omit_revision() {
        let doc = CouchValueDocument {
            id: "user:a:state".into(),
            rev: None,
            value: "{}".into(),
        };
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"_id": "user:a:state", "value": "{}"})
        );
    }

    #[test]
    fn revision_is_read_from_full_document() {
        let raw = json!({"_id": "k", "_rev": "3-abc", "value": "v"});
        let rev: CouchRevision = serde_json::from_value(raw).unwrap();
        assert_eq!(rev.rev, "3-abc");
    }
}
