//! Activity session adapter
//!
//! Parses recorder output into `ActivitySession`s and checks segments against
//! the recorder's contract. Validation is advisory: the aggregator accepts
//! every segment, so issues are reported rather than rejected.

use crate::error::AnalyticsError;
use crate::types::{ActivitySegment, ActivitySession, SegmentType};

/// Parse a session JSON object, or a bare JSON array of segments
///
/// The shape is picked from the first non-whitespace character so that
/// serde_json's own error (with line and column) reaches the caller.
pub fn parse_session(json: &str) -> Result<ActivitySession, AnalyticsError> {
    let parsed = if json.trim_start().starts_with('[') {
        serde_json::from_str::<Vec<ActivitySegment>>(json).map(ActivitySession::new)
    } else {
        serde_json::from_str::<ActivitySession>(json)
    };
    let session = parsed.map_err(|e| AnalyticsError::ParseError(e.to_string()))?;

    log::debug!("parsed session with {} segments", session.segments.len());
    Ok(session)
}

/// Parse NDJSON (one segment per line)
pub fn parse_segments_ndjson(ndjson: &str) -> Result<Vec<ActivitySegment>, AnalyticsError> {
    let mut segments = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<ActivitySegment>(trimmed) {
            Ok(segment) => segments.push(segment),
            Err(e) => {
                return Err(AnalyticsError::ParseError(format!(
                    "line {}: {}",
                    line_num + 1,
                    e
                )));
            }
        }
    }
    Ok(segments)
}

/// Contract violations a recorder should not produce
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SegmentIssue {
    #[error("Negative duration: {0}s")]
    NegativeDuration(f64),

    #[error("Non-finite duration")]
    NonFiniteDuration,

    #[error("Unrecognized segment type")]
    UnrecognizedType,

    #[error("Rework flag set on a {0} segment")]
    ReworkOnNonErasing(SegmentType),
}

/// An issue found at a given segment index
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentValidation {
    pub index: usize,
    pub issue: SegmentIssue,
}

/// Check one segment against the recorder contract
pub fn check_segment(segment: &ActivitySegment) -> Vec<SegmentIssue> {
    let mut issues = Vec::new();

    if segment.segment_type == SegmentType::Unknown {
        issues.push(SegmentIssue::UnrecognizedType);
    }

    match segment.duration {
        Some(d) if !d.is_finite() => issues.push(SegmentIssue::NonFiniteDuration),
        Some(d) if d < 0.0 => issues.push(SegmentIssue::NegativeDuration(d)),
        _ => {}
    }

    if segment.is_rework() && segment.segment_type != SegmentType::Erasing {
        issues.push(SegmentIssue::ReworkOnNonErasing(segment.segment_type));
    }

    issues
}

/// Validate a batch of segments, returning only the problems found
pub fn validate_segments(segments: &[ActivitySegment]) -> Vec<SegmentValidation> {
    let results: Vec<SegmentValidation> = segments
        .iter()
        .enumerate()
        .flat_map(|(index, segment)| {
            check_segment(segment)
                .into_iter()
                .map(move |issue| SegmentValidation { index, issue })
        })
        .collect();

    for result in &results {
        log::warn!("segment {}: {}", result.index, result.issue);
    }

    results
}
