//! Solvetrace - Analytics engine for pen-based problem-solving sessions
//!
//! Solvetrace turns the segment timeline recorded while a student works a
//! problem (writing, erasing, pauses) into a behavioral summary: time-on-task
//! breakdown, first reaction, hesitation and rework. The pipeline is
//! deterministic: session adaptation → segment aggregation → report encoding.
//!
//! ## Example
//!
//! ```
//! use solvetrace::{ActivitySegment, SegmentAggregator};
//!
//! let segments = vec![
//!     ActivitySegment::paused(5.0),
//!     ActivitySegment::writing(20.0),
//!     ActivitySegment::paused(3.0),
//!     ActivitySegment::erasing(2.0).with_rework(true),
//!     ActivitySegment::writing(10.0),
//! ];
//! let analytics = SegmentAggregator::aggregate(&segments, None);
//!
//! assert_eq!(analytics.first_reaction_time, 5.0);
//! assert_eq!(analytics.thinking_time, 3.0);
//! assert_eq!(analytics.rework_count, 1);
//! assert_eq!(analytics.total_time, 40.0);
//! ```

pub mod adapter;
pub mod aggregator;
pub mod encoder;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use adapter::{parse_segments_ndjson, parse_session, validate_segments, SegmentIssue};
pub use aggregator::SegmentAggregator;
pub use encoder::ReportEncoder;
pub use error::AnalyticsError;
pub use pipeline::{session_to_report, SessionAnalyzer};
pub use types::{
    ActivitySegment, ActivitySession, AnalyticsReport, ProblemSolvingAnalytics, SegmentMetadata,
    SegmentType,
};

/// Solvetrace version embedded in all reports
pub const SOLVETRACE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "solvetrace";
