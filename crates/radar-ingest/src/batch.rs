use std::path::Path;

use serde_json::Value;

use crate::error::IngestError;
use crate::record::RawRecord;

/// Raw records collected for one run.
#[derive(Debug, Clone, Default)]
pub struct RawBatch {
    pub records: Vec<RawRecord>,
    /// Entries that did not parse as any known record shape.
    pub malformed: usize,
}

impl RawBatch {
    pub fn len(&self) -> usize {
        self.records.len() + self.malformed
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn extend(&mut self, other: RawBatch) {
        self.records.extend(other.records);
        self.malformed += other.malformed;
    }
}

impl From<Vec<RawRecord>> for RawBatch {
    fn from(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            malformed: 0,
        }
    }
}

/// Parse a batch from JSON text: either an array of records or
/// an object with a `records` array. Unparseable entries are counted, not fatal.
pub fn parse_batch(content: &str) -> Result<RawBatch, IngestError> {
    let value: Value = serde_json::from_str(content)?;
    let entries = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("records") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(IngestError::Batch(
                    "expected an array of records or an object with a `records` array".into(),
                ))
            }
        },
        _ => return Err(IngestError::Batch("batch must be a JSON array or object".into())),
    };

    let mut batch = RawBatch::default();
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<RawRecord>(entry) {
            Ok(record) => batch.records.push(record),
            Err(e) => {
                tracing::warn!("Skipping malformed record #{index}: {e}");
                batch.malformed += 1;
            }
        }
    }
    Ok(batch)
}

/// Load a batch file.
pub fn load_batch(path: &Path) -> Result<RawBatch, IngestError> {
    let content = std::fs::read_to_string(path)?;
    let batch = parse_batch(&content)
        .map_err(|e| IngestError::Batch(format!("{}: {e}", path.display())))?;
    tracing::debug!(
        "Loaded {} records from {} ({} malformed)",
        batch.records.len(),
        path.display(),
        batch.malformed
    );
    Ok(batch)
}

/// Load and concatenate several batch files, one per collector.
pub fn load_batches<P: AsRef<Path>>(paths: &[P]) -> Result<RawBatch, IngestError> {
    let mut batch = RawBatch::default();
    for path in paths {
        batch.extend(load_batch(path.as_ref())?);
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_array_batch() {
        let batch = parse_batch(
            r#"[{"source": "value-flow", "name": "Jito", "tvl_delta": 10, "observed_at": "2026-02-10"}]"#,
        )
        .unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.malformed, 0);
    }

    #[test]
    fn test_parse_object_batch_counts_malformed() {
        let batch = parse_batch(
            r#"{"records": [
                {"source": "social-mention", "subject": "Jito"},
                {"source": "carrier-pigeon", "subject": "?"},
                {"source": "value-flow", "tvl": "lots"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.malformed, 2);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_parse_rejects_scalar() {
        assert!(matches!(parse_batch("42"), Err(IngestError::Batch(_))));
        assert!(matches!(parse_batch("{\"items\": []}"), Err(IngestError::Batch(_))));
        assert!(matches!(parse_batch("not json"), Err(IngestError::Json(_))));
    }

    #[test]
    fn test_load_batches_concatenates() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.json");
        let b = tmp.path().join("b.json");
        std::fs::write(&a, r#"[{"source": "social-mention", "subject": "A"}]"#).unwrap();
        std::fs::write(&b, r#"[{"source": "social-mention", "subject": "B"}, 7]"#).unwrap();
        let batch = load_batches(&[a, b]).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.malformed, 1);
    }

    #[test]
    fn test_empty_batch() {
        let batch = parse_batch("[]").unwrap();
        assert!(batch.is_empty());
    }
}
