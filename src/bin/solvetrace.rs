//! Solvetrace CLI - Command-line interface for the Solvetrace analytics engine
//!
//! Commands:
//! - analyze: Turn a recorded session into an analytics report
//! - validate: Check segments against the recorder contract
//! - format: Run the presentation helpers on raw numbers
//! - schema: Print input/output schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use solvetrace::adapter::{parse_segments_ndjson, parse_session, validate_segments};
use solvetrace::encoder::ReportEncoder;
use solvetrace::format::{format_percentage, format_time, format_time_verbose};
use solvetrace::pipeline::SessionAnalyzer;
use solvetrace::types::{ActivitySegment, ActivitySession, AnalyticsReport, ReportQualityFlag};
use solvetrace::{AnalyticsError, PRODUCER_NAME, SOLVETRACE_VERSION};

/// Solvetrace - Analytics engine for pen-based problem-solving sessions
#[derive(Parser)]
#[command(name = "solvetrace")]
#[command(version = SOLVETRACE_VERSION)]
#[command(about = "Summarize pen activity segments into problem-solving analytics", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a recorded session
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// First reaction in seconds, used when the first segment is not a pause
        #[arg(long)]
        first_reaction: Option<f64>,

        /// Session identifier to stamp on the report
        #[arg(long)]
        session_id: Option<String>,

        /// Producer instance id (random when omitted)
        #[arg(long)]
        instance_id: Option<String>,
    },

    /// Validate segments against the recorder contract
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Format raw numbers the way reports display them
    Format {
        #[command(subcommand)]
        kind: FormatKind,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Subcommand)]
enum FormatKind {
    /// Seconds as M:SS
    Time { seconds: f64 },
    /// Seconds as "M minutes S seconds"
    Verbose { seconds: f64 },
    /// Whole-number percentage of part in total
    Percent { part: f64, total: f64 },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Session object or JSON array of segments
    Json,
    /// Newline-delimited JSON (one segment per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON report
    Json,
    /// Pretty-printed JSON report
    JsonPretty,
    /// Human-readable summary
    Summary,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (session / segments)
    Input,
    /// Output schema (analytics report)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(default_level);
    let _ = env_logger::Builder::from_env(env).try_init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error = CliError::from(e);
            eprintln!(
                "{}",
                serde_json::to_string(&error).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), SolvetraceCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            input_format,
            output_format,
            first_reaction,
            session_id,
            instance_id,
        } => cmd_analyze(
            &input,
            &output,
            input_format,
            output_format,
            first_reaction,
            session_id,
            instance_id,
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Format { kind } => cmd_format(kind),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_analyze(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    first_reaction: Option<f64>,
    session_id: Option<String>,
    instance_id: Option<String>,
) -> Result<(), SolvetraceCliError> {
    if let Some(seconds) = first_reaction {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(SolvetraceCliError::InvalidArgument(format!(
                "--first-reaction must be a non-negative number, got {}",
                seconds
            )));
        }
    }

    let input_data = read_input(input)?;
    let mut session = read_session(&input_data, &input_format)?;
    apply_overrides(&mut session, first_reaction, session_id);

    let encoder = match instance_id {
        Some(id) => ReportEncoder::with_instance_id(id),
        None => ReportEncoder::new(),
    };
    let analyzer = SessionAnalyzer::with_encoder(encoder);
    let report = analyzer.analyze_session(&session);
    log::debug!(
        "analyzed {} segments, flags: {:?}",
        report.quality.segment_count,
        report.quality.flags
    );

    let output_data = match output_format {
        OutputFormat::Json => serde_json::to_string(&report)? + "\n",
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)? + "\n",
        OutputFormat::Summary => render_summary(&report),
    };

    write_output(output, &output_data)
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), SolvetraceCliError> {
    let input_data = read_input(input)?;
    let session = read_session(&input_data, &input_format)?;
    let report = build_validation_report(&session);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total segments:   {}", report.total_segments);
        println!("Valid segments:   {}", report.valid_segments);
        println!("Invalid segments: {}", report.invalid_segments);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Segment {} ({}): {}", err.index, err.segment_type, err.error);
            }
        }
    }

    validation_outcome(&report)
}

/// A report with any invalid segment fails the command
fn validation_outcome(report: &ValidationReport) -> Result<(), SolvetraceCliError> {
    if report.invalid_segments > 0 {
        Err(SolvetraceCliError::ValidationFailed(report.invalid_segments))
    } else {
        Ok(())
    }
}

fn cmd_format(kind: FormatKind) -> Result<(), SolvetraceCliError> {
    let rendered = match kind {
        FormatKind::Time { seconds } => format_time(seconds),
        FormatKind::Verbose { seconds } => format_time_verbose(seconds),
        FormatKind::Percent { part, total } => format_percentage(part, total),
    };
    println!("{}", rendered);
    Ok(())
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), SolvetraceCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input: one problem-solving session");
                println!();
                println!("Either a session object:");
                println!("  {{ \"sessionId\"?: string, \"firstReactionTime\"?: number, \"segments\": [...] }}");
                println!("or a bare array of segments, or NDJSON with one segment per line.");
                println!();
                println!("Segment:");
                println!("  - type: writing | erasing | paused");
                println!("  - duration: seconds (absent reads as 0)");
                println!("  - metadata.isRework: true when an erase was a redo (erasing only)");
                println!();
                println!("Segments must be in chronological order. A leading paused segment is");
                println!("the first reaction interval.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output: analytics report");
                println!();
                println!("- report_version, producer {{ name, version, instance_id }}, computed_at_utc");
                println!("- session_id (when known)");
                println!("Field names are snake_case except inside `analytics`, which keeps the");
                println!("camelCase names of the analytics record.");
                println!();
                println!("- analytics: {{ writingTime, thinkingTime, erasingTime, firstReactionTime,");
                println!("               maxPauseTime, reworkCount, totalTime }}");
                println!("- breakdown: {{ writing_pct, thinking_pct, erasing_pct, first_reaction_pct }}");
                println!("- display: M:SS strings for each component plus total_verbose");
                println!("- quality: {{ segment_count, flags }}");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, SolvetraceCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            log::warn!("reading segments from an interactive terminal; end input with Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_session(data: &str, format: &InputFormat) -> Result<ActivitySession, SolvetraceCliError> {
    let session = match format {
        InputFormat::Json => parse_session(data)?,
        InputFormat::Ndjson => {
            let segments: Vec<ActivitySegment> = parse_segments_ndjson(data)?;
            ActivitySession::new(segments)
        }
    };
    Ok(session)
}

/// Command-line values replace what the input carried
fn apply_overrides(
    session: &mut ActivitySession,
    first_reaction: Option<f64>,
    session_id: Option<String>,
) {
    if first_reaction.is_some() {
        session.first_reaction_time = first_reaction;
    }
    if session_id.is_some() {
        session.session_id = session_id;
    }
}

/// Collect segment issues; a segment with several issues counts once as invalid
fn build_validation_report(session: &ActivitySession) -> ValidationReport {
    let results = validate_segments(&session.segments);
    let flagged: BTreeSet<usize> = results.iter().map(|r| r.index).collect();

    ValidationReport {
        total_segments: session.segments.len(),
        valid_segments: session.segments.len() - flagged.len(),
        invalid_segments: flagged.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                segment_type: session.segments[r.index].segment_type.to_string(),
                error: r.issue.to_string(),
            })
            .collect(),
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), SolvetraceCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn render_summary(report: &AnalyticsReport) -> String {
    let a = &report.analytics;
    let b = &report.breakdown;
    let d = &report.display;

    let flags = if report.quality.flags.is_empty() {
        "none".to_string()
    } else {
        report
            .quality
            .flags
            .iter()
            .map(flag_name)
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut lines = vec![
        "Problem-Solving Summary".to_string(),
        "=======================".to_string(),
        format!("Session:         {}", report.session_id.as_deref().unwrap_or("-")),
        format!("Segments:        {}", report.quality.segment_count),
        format!("Total time:      {} ({})", d.total, d.total_verbose),
        format!("  First reaction {:>6}  {:>3}%", d.first_reaction, b.first_reaction_pct),
        format!("  Writing        {:>6}  {:>3}%", d.writing, b.writing_pct),
        format!("  Thinking       {:>6}  {:>3}%", d.thinking, b.thinking_pct),
        format!("  Erasing        {:>6}  {:>3}%", d.erasing, b.erasing_pct),
        format!("Longest pause:   {}", d.max_pause),
        format!("Rework count:    {}", a.rework_count),
        format!("Flags:           {}", flags),
    ];
    lines.push(String::new());
    lines.join("\n")
}

fn flag_name(flag: &ReportQualityFlag) -> String {
    serde_json::to_value(flag)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{flag:?}"))
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "solvetrace.session.v1",
        "description": "Recorded pen activity for one problem-solving session",
        "$defs": {
            "segment": {
                "type": "object",
                "required": ["type"],
                "properties": {
                    "type": { "type": "string", "enum": ["writing", "erasing", "paused"] },
                    "duration": { "type": "number", "minimum": 0 },
                    "metadata": {
                        "type": "object",
                        "properties": {
                            "isRework": { "type": "boolean" }
                        }
                    }
                }
            }
        },
        "oneOf": [
            {
                "type": "array",
                "items": { "$ref": "#/$defs/segment" }
            },
            {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "sessionId": { "type": "string" },
                    "firstReactionTime": { "type": "number", "minimum": 0 },
                    "segments": {
                        "type": "array",
                        "items": { "$ref": "#/$defs/segment" }
                    }
                }
            }
        ]
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    let seconds = serde_json::json!({ "type": "number", "minimum": 0 });
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "solvetrace.report.v1",
        "description": "Solvetrace analytics report",
        "type": "object",
        "required": [
            "report_version",
            "producer",
            "computed_at_utc",
            "analytics",
            "breakdown",
            "display",
            "quality"
        ],
        "properties": {
            "report_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "computed_at_utc": { "type": "string", "format": "date-time" },
            "session_id": { "type": "string" },
            "analytics": {
                "type": "object",
                "properties": {
                    "writingTime": seconds.clone(),
                    "thinkingTime": seconds.clone(),
                    "erasingTime": seconds.clone(),
                    "firstReactionTime": seconds.clone(),
                    "maxPauseTime": seconds.clone(),
                    "reworkCount": { "type": "integer", "minimum": 0 },
                    "totalTime": seconds
                }
            },
            "breakdown": { "type": "object" },
            "display": { "type": "object" },
            "quality": {
                "type": "object",
                "properties": {
                    "segment_count": { "type": "integer" },
                    "flags": { "type": "array", "items": { "type": "string" } }
                }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum SolvetraceCliError {
    Io(io::Error),
    Analytics(AnalyticsError),
    Json(serde_json::Error),
    ValidationFailed(usize),
    InvalidArgument(String),
}

impl From<io::Error> for SolvetraceCliError {
    fn from(e: io::Error) -> Self {
        SolvetraceCliError::Io(e)
    }
}

impl From<AnalyticsError> for SolvetraceCliError {
    fn from(e: AnalyticsError) -> Self {
        SolvetraceCliError::Analytics(e)
    }
}

impl From<serde_json::Error> for SolvetraceCliError {
    fn from(e: serde_json::Error) -> Self {
        SolvetraceCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SolvetraceCliError> for CliError {
    fn from(e: SolvetraceCliError) -> Self {
        match e {
            SolvetraceCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SolvetraceCliError::Analytics(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(format!(
                    "Run '{} schema input' for the expected format",
                    PRODUCER_NAME
                )),
            },
            SolvetraceCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SolvetraceCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} segments failed validation", count),
                hint: Some("Fix the recorder output and retry".to_string()),
            },
            SolvetraceCliError::InvalidArgument(msg) => CliError {
                code: "INVALID_ARGUMENT".to_string(),
                message: msg,
                hint: Some("Run with --help for usage".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_segments: usize,
    valid_segments: usize,
    invalid_segments: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    segment_type: String,
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> AnalyticsReport {
        let session = ActivitySession::new(vec![
            ActivitySegment::paused(5.0),
            ActivitySegment::writing(20.0),
            ActivitySegment::paused(3.0),
            ActivitySegment::erasing(2.0).with_rework(true),
            ActivitySegment::writing(10.0),
        ])
        .with_session_id("q-1");
        SessionAnalyzer::new().analyze_session(&session)
    }

    #[test]
    fn test_render_summary() {
        let summary = render_summary(&sample_report());

        assert!(summary.contains("Session:         q-1"));
        assert!(summary.contains("Total time:      0:40 (40 seconds)"));
        assert!(summary.contains("  Writing          0:30   75%"));
        assert!(summary.contains("Rework count:    1"));
        assert!(summary.contains("Flags:           none"));
    }

    #[test]
    fn test_flag_name_matches_wire_format() {
        assert_eq!(flag_name(&ReportQualityFlag::OverrideIgnored), "override_ignored");
    }

    #[test]
    fn test_read_session_ndjson() {
        let data = "{\"type\": \"writing\", \"duration\": 15}\n";
        let session = read_session(data, &InputFormat::Ndjson).unwrap();

        assert_eq!(session.segments.len(), 1);
        assert_eq!(session.first_reaction_time, None);
    }

    #[test]
    fn test_first_reaction_flag_replaces_session_value() {
        let mut session = ActivitySession::new(vec![ActivitySegment::writing(15.0)])
            .with_first_reaction_time(4.0)
            .with_session_id("from-file");

        apply_overrides(&mut session, Some(9.0), None);

        assert_eq!(session.first_reaction_time, Some(9.0));
        assert_eq!(session.session_id.as_deref(), Some("from-file"));
        let report = SessionAnalyzer::new().analyze_session(&session);
        assert_eq!(report.analytics.first_reaction_time, 9.0);
        assert_eq!(report.analytics.total_time, 24.0);
    }

    #[test]
    fn test_absent_flags_keep_session_values() {
        let mut session = ActivitySession::new(vec![ActivitySegment::writing(15.0)])
            .with_first_reaction_time(4.0);

        apply_overrides(&mut session, None, Some("q-7".to_string()));

        assert_eq!(session.first_reaction_time, Some(4.0));
        assert_eq!(session.session_id.as_deref(), Some("q-7"));
    }

    #[test]
    fn test_validation_counts_each_segment_once() {
        let session = ActivitySession::new(vec![
            ActivitySegment::paused(2.0),
            ActivitySegment::writing(-3.0).with_rework(true),
            ActivitySegment::erasing(1.0).with_rework(true),
        ]);

        let report = build_validation_report(&session);

        assert_eq!(report.total_segments, 3);
        assert_eq!(report.invalid_segments, 1);
        assert_eq!(report.valid_segments, 2);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.iter().all(|e| e.index == 1 && e.segment_type == "writing"));
        assert!(matches!(
            validation_outcome(&report),
            Err(SolvetraceCliError::ValidationFailed(1))
        ));
    }

    #[test]
    fn test_clean_session_passes_validation() {
        let session = ActivitySession::new(vec![
            ActivitySegment::paused(2.0),
            ActivitySegment::erasing(1.0).with_rework(true),
        ]);

        let report = build_validation_report(&session);

        assert_eq!(report.invalid_segments, 0);
        assert!(report.errors.is_empty());
        assert!(validation_outcome(&report).is_ok());
    }

    #[test]
    fn test_validation_failure_maps_to_error_code() {
        let error = CliError::from(SolvetraceCliError::ValidationFailed(2));
        assert_eq!(error.code, "VALIDATION_FAILED");
    }

    #[test]
    fn test_read_session_rejects_misspelled_key() {
        let result = read_session(r#"{"segmnets": []}"#, &InputFormat::Json);
        assert!(matches!(result, Err(SolvetraceCliError::Analytics(_))));
    }

    #[test]
    fn test_schemas_are_valid_json() {
        assert!(serde_json::from_str::<serde_json::Value>(&get_input_json_schema()).is_ok());
        assert!(serde_json::from_str::<serde_json::Value>(&get_output_json_schema()).is_ok());
    }
}
