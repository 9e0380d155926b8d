use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::FieldId;

/// Storage key holding the in-progress report.
pub const SNAPSHOT_STORAGE_KEY: &str = "managerReportData";

const UPLOADED_FILE_NAMES_KEY: &str = "uploadedFileNames";

/// Persisted form answers: field id to raw value, plus the names of files
/// that were attached when the snapshot was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct StoredSnapshot {
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
    #[serde(rename = "uploadedFileNames")]
    pub uploaded_file_names: Vec<String>,
}

// Written by other versions too: values that are not text are dropped
// instead of failing the whole document.
impl From<Map<String, Value>> for StoredSnapshot {
    fn from(mut raw: Map<String, Value>) -> Self {
        let uploaded_file_names = match raw.remove(UPLOADED_FILE_NAMES_KEY) {
            Some(Value::Array(names)) => names
                .into_iter()
                .filter_map(|name| match name {
                    Value::String(name) => Some(name),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        let fields = raw
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::String(text) => Some((key, text)),
                Value::Number(number) => Some((key, number.to_string())),
                _ => None,
            })
            .collect();

        Self {
            fields,
            uploaded_file_names,
        }
    }
}

impl StoredSnapshot {
    pub fn value(&self, field: FieldId) -> Option<&str> {
        self.fields.get(field.as_str()).map(String::as_str)
    }

    /// Known, non-file fields present in the snapshot. Unknown keys are skipped.
    pub fn known_fields(&self) -> impl Iterator<Item = (FieldId, &str)> {
        self.fields.iter().filter_map(|(key, value)| {
            let field = key.parse::<FieldId>().ok()?;
            (!field.is_file()).then_some((field, value.as_str()))
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Multipart part name for the attachment at `index`.
pub fn receipt_part_name(index: usize) -> String {
    format!("receipt_{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_uses_flat_field_keys_and_file_name_list() {
        let mut snapshot = StoredSnapshot::default();
        snapshot
            .fields
            .insert(FieldId::NewLeads.as_str().to_string(), "12".to_string());
        snapshot.uploaded_file_names = vec!["check.pdf".to_string()];

        let json: serde_json::Value =
            serde_json::from_str(&snapshot.to_json().expect("encode")).expect("json");
        assert_eq!(json["newLeads"], "12");
        assert_eq!(json["uploadedFileNames"][0], "check.pdf");
    }

    #[test]
    fn known_fields_skip_unknown_and_file_keys() {
        let snapshot = StoredSnapshot::from_json(
            r#"{"newLeads":"3","receipts":"C:\\fakepath\\a.png","legacy":"x","uploadedFileNames":[]}"#,
        )
        .expect("decode");
        let fields: Vec<_> = snapshot.known_fields().collect();
        assert_eq!(fields, vec![(FieldId::NewLeads, "3")]);
    }

    #[test]
    fn missing_file_name_list_defaults_to_empty() {
        let snapshot = StoredSnapshot::from_json(r#"{"comments":"ok"}"#).expect("decode");
        assert!(snapshot.uploaded_file_names.is_empty());
        assert_eq!(snapshot.value(FieldId::Comments), Some("ok"));
    }

    #[test]
    fn foreign_keys_with_other_types_do_not_drop_answers() {
        let snapshot = StoredSnapshot::from_json(
            r#"{"newLeads":"3","schemaVersion":2,"meta":{"tz":"UTC"},"flags":[true],"uploadedFileNames":["a.pdf"]}"#,
        )
        .expect("decode");
        assert_eq!(snapshot.value(FieldId::NewLeads), Some("3"));
        assert_eq!(snapshot.uploaded_file_names, vec!["a.pdf"]);
        let fields: Vec<_> = snapshot.known_fields().collect();
        assert_eq!(fields, vec![(FieldId::NewLeads, "3")]);
    }

    #[test]
    fn malformed_file_name_list_defaults_to_empty() {
        let snapshot =
            StoredSnapshot::from_json(r#"{"paidOrders":"1","uploadedFileNames":null}"#)
                .expect("decode");
        assert!(snapshot.uploaded_file_names.is_empty());
        assert_eq!(snapshot.value(FieldId::PaidOrders), Some("1"));

        let snapshot =
            StoredSnapshot::from_json(r#"{"uploadedFileNames":["a.pdf",7,null,"b.png"]}"#)
                .expect("decode");
        assert_eq!(snapshot.uploaded_file_names, vec!["a.pdf", "b.png"]);
    }

    #[test]
    fn numeric_answers_are_kept_as_text() {
        let snapshot = StoredSnapshot::from_json(r#"{"activeChats":4,"closedDeals":null}"#)
            .expect("decode");
        assert_eq!(snapshot.value(FieldId::ActiveChats), Some("4"));
        assert_eq!(snapshot.value(FieldId::ClosedDeals), None);
    }

    #[test]
    fn non_object_document_is_rejected() {
        assert!(StoredSnapshot::from_json("[1,2]").is_err());
    }

    #[test]
    fn receipt_parts_are_indexed() {
        assert_eq!(receipt_part_name(0), "receipt_0");
        assert_eq!(receipt_part_name(3), "receipt_3");
    }
}
