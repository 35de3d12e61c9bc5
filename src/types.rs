//! Activity data types
//!
//! This module defines the segment timeline produced by the pen recorder, the
//! analytics record derived from it, and the report payload built around that
//! record.

use serde::{Deserialize, Serialize};

/// Behavior captured during one contiguous interval of pen activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentType {
    /// Pen is actively drawing
    Writing,
    /// Pen is actively erasing
    Erasing,
    /// No pen activity
    Paused,
    /// Any type tag the recorder is not expected to emit.
    ///
    /// Kept so a single stray segment does not reject the whole session;
    /// it contributes to no statistic.
    #[serde(other)]
    Unknown,
}

impl SegmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentType::Writing => "writing",
            SegmentType::Erasing => "erasing",
            SegmentType::Paused => "paused",
            SegmentType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SegmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flags attached to a segment by the capture layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMetadata {
    /// Erase-then-redraw judged as a redo rather than a minor correction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_rework: Option<bool>,
}

/// One contiguous interval of a single behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySegment {
    /// Behavior recorded during the interval
    #[serde(rename = "type")]
    pub segment_type: SegmentType,
    /// Interval length in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Upstream flags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SegmentMetadata>,
}

impl ActivitySegment {
    pub fn new(segment_type: SegmentType, duration: f64) -> Self {
        Self {
            segment_type,
            duration: Some(duration),
            metadata: None,
        }
    }

    pub fn writing(duration: f64) -> Self {
        Self::new(SegmentType::Writing, duration)
    }

    pub fn erasing(duration: f64) -> Self {
        Self::new(SegmentType::Erasing, duration)
    }

    pub fn paused(duration: f64) -> Self {
        Self::new(SegmentType::Paused, duration)
    }

    /// Mark the segment as rework
    pub fn with_rework(mut self, is_rework: bool) -> Self {
        self.metadata = Some(SegmentMetadata {
            is_rework: Some(is_rework),
        });
        self
    }

    /// Duration in seconds; absent, negative and non-finite values read as 0
    pub fn duration_sec(&self) -> f64 {
        sanitize_seconds(self.duration.unwrap_or(0.0))
    }

    /// Whether the recorder flagged this segment as rework
    pub fn is_rework(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.is_rework)
            .unwrap_or(false)
    }

    /// Whether the raw duration had to be clamped to produce `duration_sec`
    pub fn has_clamped_duration(&self) -> bool {
        matches!(self.duration, Some(d) if !d.is_finite() || d < 0.0)
    }
}

/// Clamp a seconds value into the finite non-negative domain
pub(crate) fn sanitize_seconds(value: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        0.0
    } else {
        value
    }
}

/// A completed problem-solving session as delivered by the capture layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActivitySession {
    /// Session identifier, if the producer supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Ordered segments, earliest first
    #[serde(default)]
    pub segments: Vec<ActivitySegment>,
    /// Externally measured first reaction, used when segment 0 is not a pause
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_reaction_time: Option<f64>,
}

impl ActivitySession {
    pub fn new(segments: Vec<ActivitySegment>) -> Self {
        Self {
            session_id: None,
            segments,
            first_reaction_time: None,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_first_reaction_time(mut self, seconds: f64) -> Self {
        self.first_reaction_time = Some(seconds);
        self
    }
}

/// Behavioral summary of one problem-solving session
///
/// All fields are seconds except `rework_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSolvingAnalytics {
    pub writing_time: f64,
    pub thinking_time: f64,
    pub erasing_time: f64,
    pub first_reaction_time: f64,
    pub max_pause_time: f64,
    pub rework_count: u32,
    pub total_time: f64,
}

// ============================================================================
// Report payload
// ============================================================================

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Whole-number share of total time spent in each component
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBreakdown {
    pub writing_pct: u32,
    pub thinking_pct: u32,
    pub erasing_pct: u32,
    pub first_reaction_pct: u32,
}

/// Pre-rendered strings for display layers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayTimes {
    pub total: String,
    pub total_verbose: String,
    pub writing: String,
    pub thinking: String,
    pub erasing: String,
    pub first_reaction: String,
    pub max_pause: String,
}

/// Data quality flags for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportQualityFlag {
    /// Session had no segments
    EmptySession,
    /// Every component summed to zero
    ZeroTotalTime,
    /// At least one duration was negative or non-finite and read as 0
    ClampedDurations,
    /// At least one segment carried an unrecognized type
    UnrecognizedSegments,
    /// A first-reaction override was supplied but segment 0 was a pause
    OverrideIgnored,
}

/// Data quality section of a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportQuality {
    pub segment_count: usize,
    pub flags: Vec<ReportQualityFlag>,
}

/// Complete analytics report for one session
///
/// Envelope and section fields serialize snake_case; the nested `analytics`
/// record keeps its own camelCase names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub analytics: ProblemSolvingAnalytics,
    pub breakdown: TimeBreakdown,
    pub display: DisplayTimes,
    pub quality: ReportQuality,
}
