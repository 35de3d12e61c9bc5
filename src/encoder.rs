//! Analytics report encoder
//!
//! Wraps a `ProblemSolvingAnalytics` record into a versioned report with
//! producer metadata, time shares, display strings and data quality flags.

use crate::error::AnalyticsError;
use crate::format::{format_time, format_time_verbose, percentage};
use crate::types::{
    ActivitySession, AnalyticsReport, DisplayTimes, ProblemSolvingAnalytics, ReportProducer,
    ReportQuality, ReportQualityFlag, SegmentType, TimeBreakdown,
};
use crate::{PRODUCER_NAME, SOLVETRACE_VERSION};
use chrono::Utc;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Analytics report encoder
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Build a report for a session and the analytics computed from it
    pub fn encode(
        &self,
        session: &ActivitySession,
        analytics: &ProblemSolvingAnalytics,
    ) -> AnalyticsReport {
        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: SOLVETRACE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        AnalyticsReport {
            report_version: REPORT_VERSION.to_string(),
            producer,
            computed_at_utc: Utc::now().to_rfc3339(),
            session_id: session.session_id.clone(),
            analytics: *analytics,
            breakdown: build_breakdown(analytics),
            display: build_display(analytics),
            quality: build_quality(session, analytics),
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(
        &self,
        session: &ActivitySession,
        analytics: &ProblemSolvingAnalytics,
    ) -> Result<String, AnalyticsError> {
        let report = self.encode(session, analytics);
        serde_json::to_string_pretty(&report).map_err(AnalyticsError::JsonError)
    }
}

fn build_breakdown(analytics: &ProblemSolvingAnalytics) -> TimeBreakdown {
    let total = analytics.total_time;
    TimeBreakdown {
        writing_pct: percentage(analytics.writing_time, total),
        thinking_pct: percentage(analytics.thinking_time, total),
        erasing_pct: percentage(analytics.erasing_time, total),
        first_reaction_pct: percentage(analytics.first_reaction_time, total),
    }
}

fn build_display(analytics: &ProblemSolvingAnalytics) -> DisplayTimes {
    DisplayTimes {
        total: format_time(analytics.total_time),
        total_verbose: format_time_verbose(analytics.total_time),
        writing: format_time(analytics.writing_time),
        thinking: format_time(analytics.thinking_time),
        erasing: format_time(analytics.erasing_time),
        first_reaction: format_time(analytics.first_reaction_time),
        max_pause: format_time(analytics.max_pause_time),
    }
}

fn build_quality(session: &ActivitySession, analytics: &ProblemSolvingAnalytics) -> ReportQuality {
    let segments = &session.segments;
    let mut flags = Vec::new();

    if segments.is_empty() {
        flags.push(ReportQualityFlag::EmptySession);
    }
    if analytics.total_time == 0.0 {
        flags.push(ReportQualityFlag::ZeroTotalTime);
    }
    if segments.iter().any(|s| s.has_clamped_duration()) {
        flags.push(ReportQualityFlag::ClampedDurations);
    }
    if segments.iter().any(|s| s.segment_type == SegmentType::Unknown) {
        flags.push(ReportQualityFlag::UnrecognizedSegments);
    }

    let leading_pause = segments
        .first()
        .is_some_and(|s| s.segment_type == SegmentType::Paused);
    if leading_pause && session.first_reaction_time.is_some() {
        flags.push(ReportQualityFlag::OverrideIgnored);
    }

    ReportQuality {
        segment_count: segments.len(),
        flags,
    }
}
