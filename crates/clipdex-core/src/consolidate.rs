//! Clip Consolidation
//!
//! Folds an ordered sequence of per-modality segments into one clip record
//! per time range. Metadata is populated once per clip identity; later
//! segments for the same identity only contribute vectors. Segments that
//! fail validation are dropped with a logged reason, never fatal.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::clip::{clip_identity, Clip, ClipId, VideoContext};
use crate::segment::{validate_embedding, Modality, RawSegment};

/// Why a segment was dropped from consolidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The record did not deserialize as a segment, or its timing is
    /// inverted (end before start).
    Malformed(String),
    /// The embedding failed shape or numeric validation.
    InvalidEmbedding(String),
    /// The modality tag is not one of visual/audio/transcription.
    UnknownModality(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(reason) => write!(f, "malformed segment: {}", reason),
            Self::InvalidEmbedding(reason) => write!(f, "invalid embedding: {}", reason),
            Self::UnknownModality(tag) => write!(f, "unknown modality: {}", tag),
        }
    }
}

/// A segment dropped during consolidation, by payload position.
#[derive(Debug, Clone)]
pub struct SkippedSegment {
    pub index: usize,
    pub reason: SkipReason,
}

/// Outcome of consolidating one payload.
#[derive(Debug)]
pub struct Consolidation {
    /// Indexable clips by identity. Clips that accumulated zero vectors
    /// are already excluded.
    pub clips: HashMap<ClipId, Clip>,
    /// Estimated total video duration, see [`estimate_video_duration`].
    pub video_duration_sec: f64,
    /// Segments dropped, with reasons. Every entry has been logged.
    pub skipped: Vec<SkippedSegment>,
}

/// Round to two decimal places, matching the precision used for identities.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Estimate total video duration from segment timing.
///
/// Sums `endSec - startSec` in encountered order, stopping at the first
/// segment whose start resets to zero after a non-zero total has
/// accumulated. The upstream payload repeats the full timeline once per
/// modality, so only the first pass contributes. This is a heuristic tied
/// to that ordering, not a hard guarantee.
pub fn estimate_video_duration(segments: &[serde_json::Value]) -> f64 {
    let mut total = 0.0;
    for segment in segments {
        let start = segment.get("startSec").and_then(|v| v.as_f64());
        if total > 0.0 && start == Some(0.0) {
            break;
        }
        let end = segment.get("endSec").and_then(|v| v.as_f64()).unwrap_or(0.0);
        total += end - start.unwrap_or(0.0);
    }
    round2(total)
}

/// Fold an ordered segment sequence into one clip record per time range.
///
/// Idempotent on the same segment sequence modulo the caller-supplied
/// `video_id` and the clips' creation times.
pub fn consolidate_segments(
    segments: &[serde_json::Value],
    context: &VideoContext,
    embedding_dimension: usize,
) -> Consolidation {
    let video_duration_sec = estimate_video_duration(segments);

    let mut clips: HashMap<ClipId, Clip> = HashMap::new();
    let mut skipped = Vec::new();
    let skip = |index: usize, reason: SkipReason, skipped: &mut Vec<SkippedSegment>| {
        warn!("Skipping segment {}: {}", index, reason);
        skipped.push(SkippedSegment { index, reason });
    };

    for (index, value) in segments.iter().enumerate() {
        let raw: RawSegment = match serde_json::from_value(value.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                skip(index, SkipReason::Malformed(e.to_string()), &mut skipped);
                continue;
            }
        };

        let vector = match validate_embedding(&raw.embedding, embedding_dimension) {
            Ok(vector) => vector,
            Err(reason) => {
                skip(index, SkipReason::InvalidEmbedding(reason), &mut skipped);
                continue;
            }
        };

        let start = round2(raw.start_sec);
        let end = round2(raw.end_sec);
        if end < start {
            let reason = format!("time range {}~{} has negative duration", start, end);
            skip(index, SkipReason::Malformed(reason), &mut skipped);
            continue;
        }

        let clip_id = clip_identity(&context.video_id, start, end);
        let clip = clips
            .entry(clip_id)
            .or_insert_with_key(|id| Clip::new(id.clone(), context, video_duration_sec, start, end));

        let tag = raw.embedding_option.unwrap_or_else(|| "unknown".to_string());
        match Modality::parse(&tag) {
            Some(modality) => {
                *clip.vector_slot(modality) = Some(vector);
                debug!("Clip {}: added {} vector", clip.clip_id, modality);
            }
            None => skip(index, SkipReason::UnknownModality(tag), &mut skipped),
        }
    }

    // A clip can exist with metadata only (e.g. its segments all carried
    // unknown modality tags); those never reach the index.
    clips.retain(|_, clip| clip.modality_count() > 0);

    Consolidation {
        clips,
        video_duration_sec,
        skipped,
    }
}
