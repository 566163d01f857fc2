//! Clip Records and Identities
//!
//! A clip is the consolidated, multi-modal indexing unit for one time range
//! of one video. Clips exist only within a pipeline run; the index
//! document, not the in-memory record, is the durable artifact.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::segment::Modality;

/// Deterministic clip identifier (`clip_` + 16 hex chars).
pub type ClipId = String;

/// Derive the deterministic identity for a time range of a video.
///
/// Timestamps are formatted to exactly two decimal places before hashing,
/// so identical rounded inputs always yield the same identity regardless of
/// call order.
pub fn clip_identity(video_id: &str, start_time: f64, end_time: f64) -> ClipId {
    let key = format!("{}_{:.2}_{:.2}", video_id, start_time, end_time);
    let hash = format!("{:x}", Sha256::digest(key.as_bytes()));
    format!("clip_{}", &hash[..16])
}

/// Caller-supplied context shared by every clip produced from one payload.
#[derive(Debug, Clone)]
pub struct VideoContext {
    /// Identifier assigned once per pipeline run.
    pub video_id: String,
    /// Source video locator.
    pub video_path: String,
    /// Display name derived from the source video key.
    pub video_name: String,
    /// Caller-supplied shard index.
    pub part: i32,
    /// Categories attached to every clip; never empty.
    pub categories: Vec<String>,
}

/// One consolidated clip, serialized as-is into the index document.
///
/// Vector fields are omitted from the document when absent; `thumbnail_path`
/// is always present (null when no thumbnail was produced).
#[derive(Debug, Clone, Serialize)]
pub struct Clip {
    pub clip_id: ClipId,
    pub video_id: String,
    pub video_path: String,
    pub video_name: String,
    pub video_duration_sec: f64,
    pub part: i32,
    pub timestamp_start: f64,
    pub timestamp_end: f64,
    pub clip_duration: f64,
    pub clip_text: String,
    pub categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub thumbnail_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emb_visual: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emb_audio: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emb_transcription: Option<Vec<f32>>,
}

impl Clip {
    /// Create a clip with metadata populated from the shared context.
    /// Called once per identity; later segments only add vectors.
    pub fn new(
        clip_id: ClipId,
        context: &VideoContext,
        video_duration_sec: f64,
        timestamp_start: f64,
        timestamp_end: f64,
    ) -> Self {
        Self {
            clip_id,
            video_id: context.video_id.clone(),
            video_path: context.video_path.clone(),
            video_name: context.video_name.clone(),
            video_duration_sec,
            part: context.part,
            timestamp_start,
            timestamp_end,
            clip_duration: timestamp_end - timestamp_start,
            clip_text: context.video_name.clone(),
            categories: context.categories.clone(),
            created_at: Utc::now(),
            thumbnail_path: None,
            emb_visual: None,
            emb_audio: None,
            emb_transcription: None,
        }
    }

    /// Mutable slot for one modality's vector.
    pub fn vector_slot(&mut self, modality: Modality) -> &mut Option<Vec<f32>> {
        match modality {
            Modality::Visual => &mut self.emb_visual,
            Modality::Audio => &mut self.emb_audio,
            Modality::Transcription => &mut self.emb_transcription,
        }
    }

    /// Number of modality vectors attached to this clip.
    pub fn modality_count(&self) -> usize {
        [
            self.emb_visual.is_some(),
            self.emb_audio.is_some(),
            self.emb_transcription.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    /// Field names of the attached modalities, for logging.
    pub fn modalities(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.emb_visual.is_some() {
            names.push(Modality::Visual.field_name());
        }
        if self.emb_audio.is_some() {
            names.push(Modality::Audio.field_name());
        }
        if self.emb_transcription.is_some() {
            names.push(Modality::Transcription.field_name());
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> VideoContext {
        VideoContext {
            video_id: "vid-123".to_string(),
            video_path: "s3://videos/raw/demo.mp4".to_string(),
            video_name: "demo.mp4".to_string(),
            part: 0,
            categories: vec!["Uncategorized".to_string()],
        }
    }

    #[test]
    fn identity_is_deterministic() {
        let a = clip_identity("vid-123", 0.0, 2.0);
        let b = clip_identity("vid-123", 0.0, 2.0);
        assert_eq!(a, b);
    }

    #[test]
    fn identity_changes_with_any_argument() {
        let base = clip_identity("vid-123", 0.0, 2.0);
        assert_ne!(base, clip_identity("vid-456", 0.0, 2.0));
        assert_ne!(base, clip_identity("vid-123", 0.5, 2.0));
        assert_ne!(base, clip_identity("vid-123", 0.0, 2.5));
    }

    #[test]
    fn identity_has_fixed_format() {
        let id = clip_identity("vid-123", 12.345, 67.891);
        assert!(id.starts_with("clip_"));
        let hex = &id["clip_".len()..];
        assert_eq!(hex.len(), 16);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn identity_uses_two_decimal_rounding() {
        // 1.004 and 1.0 both format as "1.00".
        assert_eq!(clip_identity("v", 1.004, 2.0), clip_identity("v", 1.0, 2.0));
        assert_ne!(clip_identity("v", 1.006, 2.0), clip_identity("v", 1.0, 2.0));
    }

    #[test]
    fn clip_metadata_comes_from_context() {
        let clip = Clip::new("clip_abc".to_string(), &context(), 30.0, 2.0, 4.5);
        assert_eq!(clip.video_id, "vid-123");
        assert_eq!(clip.clip_duration, 2.5);
        assert_eq!(clip.clip_text, clip.video_name);
        assert!(clip.thumbnail_path.is_none());
        assert_eq!(clip.modality_count(), 0);
    }

    #[test]
    fn vector_slots_map_to_modalities() {
        let mut clip = Clip::new("clip_abc".to_string(), &context(), 30.0, 0.0, 2.0);
        *clip.vector_slot(Modality::Audio) = Some(vec![1.0; 4]);
        assert_eq!(clip.modality_count(), 1);
        assert_eq!(clip.modalities(), vec!["emb_audio"]);

        *clip.vector_slot(Modality::Visual) = Some(vec![0.0; 4]);
        assert_eq!(clip.modality_count(), 2);
    }

    #[test]
    fn document_omits_absent_vectors_but_keeps_null_thumbnail() {
        let mut clip = Clip::new("clip_abc".to_string(), &context(), 30.0, 0.0, 2.0);
        *clip.vector_slot(Modality::Visual) = Some(vec![0.0; 4]);

        let document = serde_json::to_value(&clip).unwrap();
        assert!(document.get("emb_visual").is_some());
        assert!(document.get("emb_audio").is_none());
        assert!(document.get("emb_transcription").is_none());
        assert!(document.get("thumbnail_path").unwrap().is_null());
        assert_eq!(document.get("clip_id").unwrap(), "clip_abc");
    }
}
