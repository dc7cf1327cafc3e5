use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use memo_canvas::export::{ExportError, SessionTranscript};
use memo_canvas::session::EventKind;
use memo_canvas::stroke::{Stroke, StrokeState};
use serde_json::{Value, json};
use tracing::{debug, info, warn};


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid transcript: {0}")]
    Transcript(#[from] ExportError),
    #[error("unknown event kind `{0}`")]
    UnknownEventKind(String),
    #[error("audit found {0} issue(s)")]
    Audit(usize),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "memo-cli", about = "Inspect exported memo canvas session transcripts")]
struct Cli {
    /// Log level for diagnostics on stderr.
    #[arg(long, env = "MEMO_LOG", default_value = "info")]
    log: tracing::Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print session totals, capabilities, and counters.
    Summary { file: PathBuf },
    /// Print one line per stroke.
    Strokes {
        file: PathBuf,
        /// Only strokes visible at the exported history cursor.
        #[arg(long)]
        visible: bool,
    },
    /// Print the event log, optionally filtered by type.
    Events {
        file: PathBuf,
        /// Event type, e.g. `stroke_end`.
        #[arg(long)]
        kind: Option<String>,
    },
    /// Check the transcript's structural invariants.
    Check { file: PathBuf },
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(cli.log).init();

    match cli.command {
        Command::Summary { file } => {
            let transcript = load(&file)?;
            print_json(&summary(&transcript))
        }
        Command::Strokes { file, visible } => {
            let transcript = load(&file)?;
            let strokes =
                if visible { &transcript.canvas_data.visible_strokes } else { &transcript.canvas_data.strokes };
            for stroke in strokes {
                println!("{}", serde_json::to_string(&stroke_row(stroke))?);
            }
            Ok(())
        }
        Command::Events { file, kind } => {
            let transcript = load(&file)?;
            let kind = kind.as_deref().map(parse_event_kind).transpose()?;
            for event in transcript.canvas_data.events.iter().filter(|e| kind.is_none_or(|k| e.kind == k)) {
                println!("{}", serde_json::to_string(event)?);
            }
            Ok(())
        }
        Command::Check { file } => {
            let transcript = load(&file)?;
            let issues = transcript.audit();
            for issue in &issues {
                warn!("{issue}");
            }
            if !issues.is_empty() {
                return Err(CliError::Audit(issues.len()));
            }
            info!(
                strokes = transcript.canvas_data.strokes.len(),
                events = transcript.canvas_data.events.len(),
                "transcript is consistent"
            );
            println!("ok");
            Ok(())
        }
    }
}

fn load(path: &Path) -> Result<SessionTranscript, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_owned(), source })?;
    debug!(path = %path.display(), bytes = raw.len(), "loaded transcript");
    Ok(SessionTranscript::from_json(&raw)?)
}

fn parse_event_kind(name: &str) -> Result<EventKind, CliError> {
    serde_json::from_value(Value::String(name.to_owned())).map_err(|_| CliError::UnknownEventKind(name.to_owned()))
}

fn state_name(state: StrokeState) -> &'static str {
    match state {
        StrokeState::Pending => "pending",
        StrokeState::Committed { .. } => "committed",
        StrokeState::Cleared { .. } => "cleared",
        StrokeState::Invalidated => "invalidated",
    }
}

fn summary(transcript: &SessionTranscript) -> Value {
    let strokes = &transcript.canvas_data.strokes;
    let count_state = |name: &str| strokes.iter().filter(|s| state_name(s.state) == name).count();
    let erasers = strokes.iter().filter(|s| s.is_eraser()).count();

    json!({
        "sessionId": transcript.session_id,
        "startTime": transcript.session_info.start_time,
        "endTime": transcript.session_info.end_time,
        "durationMs": transcript.session_info.duration,
        "strokes": {
            "total": strokes.len(),
            "visible": transcript.canvas_data.visible_strokes.len(),
            "pen": strokes.len() - erasers,
            "eraser": erasers,
            "committed": count_state("committed"),
            "cleared": count_state("cleared"),
            "invalidated": count_state("invalidated"),
        },
        "events": transcript.canvas_data.events.len(),
        "capabilities": transcript.device_capabilities,
        "statistics": transcript.statistics,
    })
}

fn stroke_row(stroke: &Stroke) -> Value {
    json!({
        "id": stroke.id,
        "tool": stroke.tool.as_str(),
        "state": state_name(stroke.state),
        "historyIndex": stroke.state.history_index(),
        "points": stroke.point_count(),
        "durationMs": stroke.duration_ms(),
        "pathLength": stroke.path_length,
        "averageSpeed": stroke.average_speed,
        "averagePressure": stroke.average_pressure,
        "bounds": stroke.bounds,
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
