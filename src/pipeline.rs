//! Session pipeline orchestration
//!
//! This module provides the public API for turning a recorded session into an
//! analytics report: parse → aggregate → encode.

use crate::adapter::parse_session;
use crate::aggregator::SegmentAggregator;
use crate::encoder::ReportEncoder;
use crate::error::AnalyticsError;
use crate::types::{ActivitySegment, ActivitySession, AnalyticsReport};

/// Convert session JSON to report JSON (stateless, one-shot).
///
/// # Arguments
/// * `session_json` - Session object or bare array of segments
///
/// # Returns
/// Pretty-printed report JSON
///
/// # Example
/// ```
/// let json = r#"[{"type": "paused", "duration": 5}, {"type": "writing", "duration": 20}]"#;
/// let report = solvetrace::session_to_report(json.to_string()).unwrap();
/// assert!(report.contains("\"totalTime\": 25.0"));
/// ```
pub fn session_to_report(session_json: String) -> Result<String, AnalyticsError> {
    // Stage 1: Parse session JSON
    let session = parse_session(&session_json)?;

    // Stage 2: Aggregate segments
    let analytics = SegmentAggregator::aggregate_session(&session);

    // Stage 3: Encode report JSON
    ReportEncoder::new().encode_to_json(&session, &analytics)
}

/// Reusable analyzer holding one encoder, so every report it produces
/// carries the same producer instance id.
///
/// No state is carried from one session to the next.
pub struct SessionAnalyzer {
    encoder: ReportEncoder,
}

impl Default for SessionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionAnalyzer {
    pub fn new() -> Self {
        Self {
            encoder: ReportEncoder::new(),
        }
    }

    /// Create an analyzer around a preconfigured encoder
    pub fn with_encoder(encoder: ReportEncoder) -> Self {
        Self { encoder }
    }

    pub fn instance_id(&self) -> &str {
        self.encoder.instance_id()
    }

    /// Analyze an already-parsed session
    pub fn analyze_session(&self, session: &ActivitySession) -> AnalyticsReport {
        let analytics = SegmentAggregator::aggregate_session(session);
        self.encoder.encode(session, &analytics)
    }

    /// Analyze session JSON into a report
    pub fn analyze(&self, session_json: &str) -> Result<AnalyticsReport, AnalyticsError> {
        let session = parse_session(session_json)?;
        Ok(self.analyze_session(&session))
    }

    /// Analyze session JSON into pretty-printed report JSON
    pub fn analyze_to_json(&self, session_json: &str) -> Result<String, AnalyticsError> {
        let report = self.analyze(session_json)?;
        serde_json::to_string_pretty(&report).map_err(AnalyticsError::JsonError)
    }

    /// Analyze segments that did not come through the JSON adapter
    pub fn analyze_segments(
        &self,
        segments: &[ActivitySegment],
        first_reaction_override: Option<f64>,
    ) -> AnalyticsReport {
        let session = ActivitySession {
            session_id: None,
            segments: segments.to_vec(),
            first_reaction_time: first_reaction_override,
        };
        self.analyze_session(&session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProblemSolvingAnalytics;
    use pretty_assertions::assert_eq;

    fn sample_session_json() -> &'static str {
        r#"{
            "sessionId": "assignment-12-q4",
            "segments": [
                {"type": "paused", "duration": 5},
                {"type": "writing", "duration": 20},
                {"type": "paused", "duration": 3},
                {"type": "erasing", "duration": 2, "metadata": {"isRework": true}},
                {"type": "writing", "duration": 10}
            ]
        }"#
    }

    #[test]
    fn test_session_to_report_stateless() {
        let result = session_to_report(sample_session_json().to_string());

        assert!(result.is_ok());
        let json = result.unwrap();

        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(payload["report_version"], "1.0.0");
        assert_eq!(payload["producer"]["name"], "solvetrace");
        assert_eq!(payload["session_id"], "assignment-12-q4");

        let analytics = &payload["analytics"];
        assert_eq!(analytics["firstReactionTime"], 5.0);
        assert_eq!(analytics["writingTime"], 30.0);
        assert_eq!(analytics["thinkingTime"], 3.0);
        assert_eq!(analytics["erasingTime"], 2.0);
        assert_eq!(analytics["maxPauseTime"], 3.0);
        assert_eq!(analytics["reworkCount"], 1);
        assert_eq!(analytics["totalTime"], 40.0);
    }

    #[test]
    fn test_session_level_override() {
        let json = r#"{"firstReactionTime": 4, "segments": [{"type": "writing", "duration": 15}]}"#;
        let report = SessionAnalyzer::new().analyze(json).unwrap();

        assert_eq!(
            report.analytics,
            ProblemSolvingAnalytics {
                writing_time: 15.0,
                first_reaction_time: 4.0,
                total_time: 19.0,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_empty_array_session() {
        let report = SessionAnalyzer::new().analyze("[]").unwrap();

        assert_eq!(report.analytics, ProblemSolvingAnalytics::default());
        assert_eq!(report.quality.segment_count, 0);
    }

    #[test]
    fn test_invalid_json() {
        let result = session_to_report("not valid json".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_analyzer_reuses_instance_id() {
        let analyzer =
            SessionAnalyzer::with_encoder(ReportEncoder::with_instance_id("fixed".to_string()));

        let first = analyzer.analyze(sample_session_json()).unwrap();
        let second = analyzer.analyze("[]").unwrap();

        assert_eq!(analyzer.instance_id(), "fixed");
        assert_eq!(first.producer.instance_id, "fixed");
        assert_eq!(second.producer.instance_id, "fixed");
    }

    #[test]
    fn test_sessions_are_independent() {
        let analyzer = SessionAnalyzer::new();

        let before = analyzer.analyze(sample_session_json()).unwrap();
        analyzer.analyze(r#"[{"type": "writing", "duration": 500}]"#).unwrap();
        let after = analyzer.analyze(sample_session_json()).unwrap();

        assert_eq!(before.analytics, after.analytics);
    }

    #[test]
    fn test_analyze_segments() {
        let segments = vec![
            ActivitySegment::paused(10.0),
            ActivitySegment::paused(50.0),
            ActivitySegment::paused(2.0),
        ];
        let report = SessionAnalyzer::new().analyze_segments(&segments, None);

        assert_eq!(report.analytics.thinking_time, 52.0);
        assert_eq!(report.analytics.max_pause_time, 50.0);
        assert_eq!(report.analytics.total_time, 62.0);
        assert_eq!(report.display.total, "1:02");
    }

    #[test]
    fn test_analyze_to_json() {
        let json = SessionAnalyzer::new()
            .analyze_to_json(sample_session_json())
            .unwrap();

        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(payload["analytics"]["totalTime"], 40.0);
    }
}
