//! Segment aggregation
//!
//! Reduces an ordered segment timeline into a `ProblemSolvingAnalytics` record.
//! Every statistic is an independent scan over the same slice, so the result
//! depends only on the segments and the optional first-reaction override.

use crate::types::{
    sanitize_seconds, ActivitySegment, ActivitySession, ProblemSolvingAnalytics, SegmentType,
};

/// Aggregator for activity segments
pub struct SegmentAggregator;

impl SegmentAggregator {
    /// Aggregate an ordered segment list
    ///
    /// `first_reaction_override` is only consulted when segment 0 is not a pause.
    pub fn aggregate(
        segments: &[ActivitySegment],
        first_reaction_override: Option<f64>,
    ) -> ProblemSolvingAnalytics {
        let first_reaction_time = compute_first_reaction(segments, first_reaction_override);
        let writing_time = sum_durations(segments, SegmentType::Writing);
        let thinking_time = compute_thinking_time(segments);
        let erasing_time = sum_durations(segments, SegmentType::Erasing);
        let max_pause_time = compute_max_pause(segments);
        let rework_count = count_rework(segments);

        let total_time = writing_time + thinking_time + erasing_time + first_reaction_time;

        log::debug!(
            "aggregated {} segments: total={total_time:.2}s rework={rework_count}",
            segments.len()
        );

        ProblemSolvingAnalytics {
            writing_time,
            thinking_time,
            erasing_time,
            first_reaction_time,
            max_pause_time,
            rework_count,
            total_time,
        }
    }

    /// Aggregate a parsed session using its own first-reaction fallback
    pub fn aggregate_session(session: &ActivitySession) -> ProblemSolvingAnalytics {
        Self::aggregate(&session.segments, session.first_reaction_time)
    }
}

/// First reaction: the leading pause if there is one, otherwise the override.
///
/// The two sources are mutually exclusive; they are never summed.
fn compute_first_reaction(segments: &[ActivitySegment], fallback: Option<f64>) -> f64 {
    match segments.first() {
        Some(first) if first.segment_type == SegmentType::Paused => first.duration_sec(),
        _ => sanitize_seconds(fallback.unwrap_or(0.0)),
    }
}

/// Sum of durations for one segment type, regardless of position
fn sum_durations(segments: &[ActivitySegment], segment_type: SegmentType) -> f64 {
    segments
        .iter()
        .filter(|s| s.segment_type == segment_type)
        .map(ActivitySegment::duration_sec)
        .sum()
}

/// Pauses after index 0.
///
/// Index 0 is skipped by position even when it is not a pause, so the first
/// reaction interval never reaches thinking time or max pause.
fn later_pauses(segments: &[ActivitySegment]) -> impl Iterator<Item = f64> + '_ {
    segments
        .iter()
        .skip(1)
        .filter(|s| s.segment_type == SegmentType::Paused)
        .map(ActivitySegment::duration_sec)
}

fn compute_thinking_time(segments: &[ActivitySegment]) -> f64 {
    later_pauses(segments).sum()
}

fn compute_max_pause(segments: &[ActivitySegment]) -> f64 {
    later_pauses(segments).fold(0.0, f64::max)
}

/// Erasing segments flagged as rework by the recorder
fn count_rework(segments: &[ActivitySegment]) -> u32 {
    segments
        .iter()
        .filter(|s| s.segment_type == SegmentType::Erasing && s.is_rework())
        .count() as u32
}
