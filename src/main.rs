use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gestureflow::document::{DiagramDocument, read_document};
use gestureflow::diagram::DiagramController;
use gestureflow::gesture::{
    GestureAction, GestureSession, GestureView, LinkEvent, ReplayLink, WebSocketLink,
};
use gestureflow::logging;
use gestureflow::settings::Settings;
use gestureflow::viewport::ViewportTransform;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Node-and-edge diagrams driven by hand gestures
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded pose stream (one JSON message per line) against a diagram
    Replay {
        /// Pose recording in JSON-lines format
        poses: PathBuf,

        /// Diagram to start from
        #[arg(long = "in")]
        input: Option<PathBuf>,

        /// Where to write the resulting diagram (stdout if omitted)
        #[arg(long = "out")]
        output: Option<PathBuf>,

        /// Simulated time between samples in milliseconds
        #[arg(long, default_value_t = 33)]
        interval_ms: u64,

        /// Screen width the hand position is mapped onto
        #[arg(long, default_value_t = 1280.0)]
        width: f64,

        /// Screen height the hand position is mapped onto
        #[arg(long, default_value_t = 720.0)]
        height: f64,
    },
    /// Drive a diagram from a live classifier over WebSocket
    Live {
        /// Classifier endpoint (defaults to `link_endpoint` from the settings)
        #[arg(long)]
        endpoint: Option<String>,

        /// Diagram to start from
        #[arg(long = "in")]
        input: Option<PathBuf>,

        /// Where to write the resulting diagram (stdout if omitted)
        #[arg(long = "out")]
        output: Option<PathBuf>,

        /// How long to listen, in seconds
        #[arg(long, default_value_t = 30)]
        seconds: u64,

        /// Screen width the hand position is mapped onto
        #[arg(long, default_value_t = 1280.0)]
        width: f64,

        /// Screen height the hand position is mapped onto
        #[arg(long, default_value_t = 720.0)]
        height: f64,
    },
}

#[derive(Debug, Default)]
struct ReplaySummary {
    samples: usize,
    created: usize,
    deleted: usize,
    connected: usize,
    selected: usize,
    moved: usize,
    suppressed: usize,
}

impl ReplaySummary {
    fn record(&mut self, action: &GestureAction) {
        self.samples += 1;
        match action {
            GestureAction::Created(_) => self.created += 1,
            GestureAction::Deleted(_) => self.deleted += 1,
            GestureAction::Connected { connection: Some(_), .. } => self.connected += 1,
            GestureAction::Selected(_) => self.selected += 1,
            GestureAction::Moved(_) => self.moved += 1,
            GestureAction::CoolingDown => self.suppressed += 1,
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Replay {
            poses,
            input,
            output,
            interval_ms,
            width,
            height,
        } => replay(poses, input, output, Duration::from_millis(interval_ms), width, height),
        Command::Live {
            endpoint,
            input,
            output,
            seconds,
            width,
            height,
        } => live(endpoint, input, output, Duration::from_secs(seconds), width, height),
    }
}

fn load_start(input: Option<&PathBuf>) -> Result<DiagramController> {
    let mut controller = DiagramController::new();
    if let Some(path) = input {
        read_document(path)
            .with_context(|| format!("Failed to read diagram {}", path.display()))?
            .load_into(&mut controller);
    }
    Ok(controller)
}

fn replay(
    poses: PathBuf,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    interval: Duration,
    width: f64,
    height: f64,
) -> Result<()> {
    let settings = Settings::load();
    let mut controller = load_start(input.as_ref())?;

    let link = ReplayLink::from_path(&poses, Duration::ZERO)
        .with_context(|| format!("Failed to read pose recording {}", poses.display()))?;
    let mut session = GestureSession::new(Box::new(link), settings.gesture.clone(), width, height);
    session.enable().context("Failed to start replay")?;

    let view = GestureView::full_screen(width, height, ViewportTransform::default());
    let mut now = Instant::now();
    let mut summary = ReplaySummary::default();

    while let Some(event) = session.next_event(Duration::from_secs(5)) {
        let closed = event == LinkEvent::Closed;
        if let Some(action) = session.handle_event(event, &mut controller, &view, now) {
            summary.record(&action);
            now += interval;
        }
        if closed {
            break;
        }
    }
    finish(session, &controller, &summary, output)
}

fn live(
    endpoint: Option<String>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    duration: Duration,
    width: f64,
    height: f64,
) -> Result<()> {
    let settings = Settings::load();
    let mut controller = load_start(input.as_ref())?;

    let link = match endpoint {
        Some(endpoint) => WebSocketLink::new(endpoint),
        None => WebSocketLink::from_settings(&settings),
    };
    let endpoint = link.endpoint().to_string();
    info!(%endpoint, seconds = duration.as_secs(), "Listening for gestures");
    let mut session = GestureSession::new(Box::new(link), settings.gesture.clone(), width, height);
    session.enable().context("Failed to start gesture link")?;

    let view = GestureView::full_screen(width, height, ViewportTransform::default());
    let deadline = Instant::now() + duration;
    let mut summary = ReplaySummary::default();
    let mut opened = false;

    while let Some(event) = session.next_event(deadline.saturating_duration_since(Instant::now())) {
        opened |= event == LinkEvent::Opened;
        let closed = event == LinkEvent::Closed;
        if let Some(action) = session.handle_event(event, &mut controller, &view, Instant::now()) {
            summary.record(&action);
        }
        if closed {
            break;
        }
    }
    if !opened {
        for toast in session.drain_notifications() {
            warn!("{}", toast.message);
        }
        anyhow::bail!("Could not reach the gesture classifier at {endpoint}");
    }
    finish(session, &controller, &summary, output)
}

/// Close the session, report and write the resulting diagram.
fn finish(
    mut session: GestureSession,
    controller: &DiagramController,
    summary: &ReplaySummary,
    output: Option<PathBuf>,
) -> Result<()> {
    session.disable();
    for toast in session.drain_notifications() {
        info!("{} {}", toast.variant.icon(), toast.message);
    }

    let model = controller.model();
    if let Err(e) = model.check_invariants() {
        warn!(error = %e, "Diagram invariants violated after gesture run");
    }
    eprintln!(
        "{} samples: {} created, {} deleted, {} connected, {} selected, {} moves, {} suppressed by cooldown",
        summary.samples,
        summary.created,
        summary.deleted,
        summary.connected,
        summary.selected,
        summary.moved,
        summary.suppressed,
    );
    eprintln!(
        "Result: {} nodes, {} connections",
        model.nodes().len(),
        model.connections().len()
    );

    let document = DiagramDocument::from_controller(controller);
    match output {
        Some(path) => document
            .write_to(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", document.to_json_pretty()?),
    }
    Ok(())
}
