//! Embedding Payload Wire Types
//!
//! Types for the upstream embedding output and validation of individual
//! segment records. A segment is one raw embedding for a single modality
//! over a time range; it is consumed once during consolidation and never
//! mutated.

use serde::Deserialize;

/// Embedding output payload as written by the upstream embedding stage.
///
/// Entries in `data` are kept as raw JSON and parsed one at a time so a
/// malformed segment can be dropped without failing the whole payload.
#[derive(Debug, Deserialize)]
pub struct EmbeddingPayload {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

/// One raw per-segment embedding record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSegment {
    #[serde(default)]
    pub start_sec: f64,
    #[serde(default)]
    pub end_sec: f64,
    #[serde(default)]
    pub embedding_option: Option<String>,
    /// Raw embedding value; validated separately against the configured
    /// dimension before use.
    #[serde(default)]
    pub embedding: serde_json::Value,
}

/// Embedding modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modality {
    Visual,
    Audio,
    Transcription,
}

impl Modality {
    /// Parse an upstream modality tag. Unknown tags return `None` and the
    /// segment is dropped by the consolidator.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "visual" => Some(Self::Visual),
            "audio" => Some(Self::Audio),
            "transcription" => Some(Self::Transcription),
            _ => None,
        }
    }

    /// Index document field carrying this modality's vector.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Visual => "emb_visual",
            Self::Audio => "emb_audio",
            Self::Transcription => "emb_transcription",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::Visual => "visual",
            Self::Audio => "audio",
            Self::Transcription => "transcription",
        };
        f.write_str(tag)
    }
}

/// Validate a raw embedding value and convert it to a vector.
///
/// Pure predicate over the input: the value must be a flat numeric sequence
/// of exactly `expected_dim` finite elements (no NaN). Returns the parsed
/// vector, or a human-readable rejection reason. Rejected segments are
/// dropped from consolidation, never fatal to the run.
pub fn validate_embedding(raw: &serde_json::Value, expected_dim: usize) -> Result<Vec<f32>, String> {
    let values = match raw.as_array() {
        Some(values) => values,
        None => return Err("embedding is not a numeric sequence".to_string()),
    };

    if values.len() != expected_dim {
        return Err(format!(
            "embedding dimension mismatch: expected {}, got {}",
            expected_dim,
            values.len()
        ));
    }

    let mut vector = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        let number = match value.as_f64() {
            Some(number) => number,
            None => return Err(format!("embedding contains non-numeric value at index {}", i)),
        };
        if !number.is_finite() {
            return Err(format!("embedding contains non-finite value at index {}", i));
        }
        vector.push(number as f32);
    }

    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_known_modalities() {
        assert_eq!(Modality::parse("visual"), Some(Modality::Visual));
        assert_eq!(Modality::parse("audio"), Some(Modality::Audio));
        assert_eq!(Modality::parse("transcription"), Some(Modality::Transcription));
        assert_eq!(Modality::parse("text-visual"), None);
        assert_eq!(Modality::parse(""), None);
    }

    #[test]
    fn modality_field_names_match_index_schema() {
        assert_eq!(Modality::Visual.field_name(), "emb_visual");
        assert_eq!(Modality::Audio.field_name(), "emb_audio");
        assert_eq!(Modality::Transcription.field_name(), "emb_transcription");
    }

    #[test]
    fn accepts_well_formed_embedding() {
        let raw = json!(vec![0.5_f64; 512]);
        let vector = validate_embedding(&raw, 512).unwrap();
        assert_eq!(vector.len(), 512);
        assert!((vector[0] - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn rejects_wrong_dimension() {
        let raw = json!(vec![0.0_f64; 511]);
        let reason = validate_embedding(&raw, 512).unwrap_err();
        assert!(reason.contains("dimension mismatch"));
        assert!(reason.contains("511"));

        let raw = json!(vec![0.0_f64; 513]);
        assert!(validate_embedding(&raw, 512).is_err());
    }

    #[test]
    fn rejects_non_sequence_values() {
        assert!(validate_embedding(&json!("not a vector"), 512).is_err());
        assert!(validate_embedding(&json!(null), 512).is_err());
        assert!(validate_embedding(&json!({"0": 1.0}), 512).is_err());
    }

    #[test]
    fn rejects_non_numeric_elements() {
        let mut values = vec![json!(0.0); 512];
        values[17] = json!("oops");
        let reason = validate_embedding(&json!(values), 512).unwrap_err();
        assert!(reason.contains("non-numeric"));
        assert!(reason.contains("17"));

        // NaN cannot survive JSON encoding; it arrives as null and is
        // rejected the same way.
        let mut values = vec![json!(0.0); 512];
        values[3] = serde_json::Value::Null;
        assert!(validate_embedding(&json!(values), 512).is_err());
    }

    #[test]
    fn raw_segment_parses_wire_names() {
        let segment: RawSegment = serde_json::from_value(json!({
            "startSec": 2.0,
            "endSec": 4.0,
            "embeddingOption": "audio",
            "embedding": [1.0, 2.0]
        }))
        .unwrap();
        assert_eq!(segment.start_sec, 2.0);
        assert_eq!(segment.end_sec, 4.0);
        assert_eq!(segment.embedding_option.as_deref(), Some("audio"));
    }

    #[test]
    fn payload_tolerates_missing_data_field() {
        let payload: EmbeddingPayload = serde_json::from_value(json!({})).unwrap();
        assert!(payload.data.is_empty());
    }
}
