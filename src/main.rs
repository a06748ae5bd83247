//! FormFit CLI
//!
//! Usage:
//!   formfit --list                              # Show the exercise catalog
//!   formfit --exercise squat < frames.jsonl     # Analyze a landmark stream
//!   formfit --exercise squat --input run.jsonl  # Same, from a file
//!   formfit --serve                             # HTTP + WebSocket API
//!   formfit --exercise squat --json             # One JSON outcome per frame
//!
//! Stream lines are either a frame
//!   {"timestamp": 0.033, "landmarks": [{"x": 0.5, "y": 0.2, "presence": 0.99}, ...]}
//! or a command: `exercise <id or alias>`, `quit`.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};

use formfit::core::{
    run_server, AnalysisEngine, AppState, CommandSpeechSink, DrainPolicy, ExerciseCatalog,
    LandmarkExtractor, SpeechQueue,
};
use formfit::types::{display_name, AngleSet, EngineEvent, FrameOutcome, TimedFrame};
use formfit::{EngineConfig, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "formfit",
    version = VERSION,
    about = "FormFit - Real-time exercise form feedback from pose landmarks",
    long_about = "FormFit turns a stream of 2-D body landmarks into exercise-form\n\
                  feedback: phase, accuracy, corrective cues, rep counts and\n\
                  debounced voice prompts.\n\n\
                  Modes:\n  \
                  (default)  Analyze JSON-lines frames from --input or stdin\n  \
                  --list     Show available exercises\n  \
                  --serve    HTTP + WebSocket API server\n\n\
                  Status:\n  \
                  PERFECT!    - accuracy >= 85\n  \
                  GOOD        - accuracy >= 70\n  \
                  KEEP GOING  - accuracy >= 50\n  \
                  ADJUST FORM - below 50"
)]
struct Args {
    /// Exercise id or alias to start with
    #[arg(short, long, default_value = "shoulder_press")]
    exercise: String,

    /// JSON-lines frame file (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// List exercises and exit
    #[arg(short, long)]
    list: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show every angle with each frame
    #[arg(long)]
    verbose: bool,

    /// Speak cues through the system voice
    #[arg(long)]
    speak: bool,

    /// Engine config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Exercise catalog replacing the built-in one (TOML)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Log level for stderr diagnostics
    #[arg(long, default_value = "warn")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(args.log_level)
        .init();

    if args.no_color {
        colored::control::set_override(false);
    }

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let catalog = match &args.catalog {
        Some(path) => ExerciseCatalog::load(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => ExerciseCatalog::builtin(),
    };
    catalog
        .validate_with(&config)
        .context("catalog does not fit the engine config")?;
    let catalog = Arc::new(catalog);

    if args.list {
        print_catalog(&catalog, args.json)?;
        return Ok(());
    }

    let speech = if args.speak {
        Some(SpeechQueue::spawn(
            Arc::new(CommandSpeechSink),
            config.speech_queue_capacity,
        ))
    } else {
        None
    };

    if args.serve {
        let mut state = AppState::new(config, catalog);
        if let Some(queue) = speech {
            state = state.with_speech(Arc::new(queue));
        }
        run_server(&args.addr, state)
            .await
            .with_context(|| format!("serving on {}", args.addr))?;
        return Ok(());
    }

    run_stream(&args, config, catalog, speech).await
}

/// Analyze frames line by line until EOF or `quit`
async fn run_stream(
    args: &Args,
    config: EngineConfig,
    catalog: Arc<ExerciseCatalog>,
    speech: Option<SpeechQueue>,
) -> Result<()> {
    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let extractor = LandmarkExtractor::new(config.min_presence);
    let mut engine = AnalysisEngine::new(config, catalog);
    let mut out = io::stdout().lock();

    let selected = engine.select_exercise(&args.exercise);
    print_selection(&mut out, &engine, args)?;
    dispatch(&speech, &selected);

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("reading input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }
        if let Some(name) = line.strip_prefix("exercise ") {
            let events = engine.select_exercise(name.trim());
            print_selection(&mut out, &engine, args)?;
            dispatch(&speech, &events);
            continue;
        }

        let frame: TimedFrame = match serde_json::from_str(line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "skipping malformed frame");
                continue;
            }
        };

        let angles = frame
            .landmarks
            .as_ref()
            .map(|lm| extractor.extract(lm))
            .unwrap_or_default();
        let outcome = engine.process_angles(angles.clone(), frame.timestamp);
        print_outcome(&mut out, &outcome, &angles, args)?;
        dispatch(&speech, &outcome.events);
    }

    let closing = engine.end_session();
    dispatch(&speech, &closing);
    let summary = engine.summary();
    if args.json {
        writeln!(out, "{}", serde_json::to_string(&summary)?)?;
    } else {
        for text in closing.iter().filter_map(speak_text) {
            writeln!(out, "{}", format!("♪ {}", text).magenta())?;
        }
        writeln!(
            out,
            "\nSession ended. Frames: {} | Reps: {}",
            summary.frames_processed,
            summary
                .rep_count
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string())
        )?;
    }
    out.flush()?;

    if let Some(queue) = speech {
        let stats = queue.shutdown(DrainPolicy::Drain).await;
        info!(spoken = stats.spoken, failed = stats.failed, "speech finished");
    }
    Ok(())
}

fn dispatch(speech: &Option<SpeechQueue>, events: &[EngineEvent]) {
    if let Some(queue) = speech {
        if let Err(e) = queue.enqueue_events(events) {
            warn!(error = %e, "speech unavailable");
        }
    }
}

fn speak_text(event: &EngineEvent) -> Option<&str> {
    match event {
        EngineEvent::Speak { text } => Some(text.as_str()),
        _ => None,
    }
}

/// Print a frame outcome
fn print_outcome(
    out: &mut impl Write,
    outcome: &FrameOutcome,
    angles: &AngleSet,
    args: &Args,
) -> Result<()> {
    if args.json {
        writeln!(out, "{}", serde_json::to_string(outcome)?)?;
        return Ok(());
    }

    if args.no_color {
        writeln!(out, "{}", outcome.record.to_parseable_string())?;
    } else {
        writeln!(out, "{}", outcome.record.to_terminal_string())?;
    }
    if let Some(cue) = &outcome.record.cue {
        writeln!(out, "  {} {}", "→".bold(), cue.bold())?;
    }
    for text in outcome.utterances() {
        writeln!(out, "  {}", format!("♪ {}", text).magenta())?;
    }
    if args.verbose {
        for (name, value) in angles.iter() {
            writeln!(out, "    {:<18} {:>6.1}°", display_name(name), value)?;
        }
    }
    Ok(())
}

fn print_selection(out: &mut impl Write, engine: &AnalysisEngine, args: &Args) -> Result<()> {
    if args.json {
        return Ok(());
    }
    match engine.definition() {
        Some(def) => {
            writeln!(out, "{}", format!("=== {} ===", def.name).bold())?;
            if !def.camera_position.is_empty() {
                writeln!(out, "Camera: {}", def.camera_position)?;
            }
            for step in &def.instructions {
                writeln!(out, "  • {}", step)?;
            }
            writeln!(out)?;
        }
        None => {
            writeln!(
                out,
                "{}",
                format!("Unknown exercise '{}' - scoring is neutral", engine.exercise()).yellow()
            )?;
        }
    }
    Ok(())
}

/// `--list` output
fn print_catalog(catalog: &ExerciseCatalog, json: bool) -> Result<()> {
    let mut out = io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&catalog.summaries())?)?;
        return Ok(());
    }
    writeln!(out, "{}", format!("FormFit v{} - exercises", VERSION).bold())?;
    for (i, def) in catalog.iter().enumerate() {
        writeln!(
            out,
            "  [{}] {:<16} {:<20} | {:<12} | {}",
            i + 1,
            def.id,
            def.name,
            def.difficulty,
            def.camera_position
        )?;
    }
    Ok(())
}
