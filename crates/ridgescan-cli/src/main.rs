//! Demo flows for the capture session layer.
//!
//! Each subcommand scripts the mock scanner and then drives a controller
//! through a complete operation, printing the progress callbacks a real
//! sensor would trigger. Useful as a smoke test and as living documentation
//! of the call sequences.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use ridgescan_device::drivers::AnyCaptureDriver;
use ridgescan_device::mock::{
    BaseTemplateScript, EnrollScript, MockScanner, MockScannerHandle, VerifyScript,
};
use ridgescan_device::progress::{CaptureProgress, Frame, ProgressEvent, ScanSignal};
use ridgescan_device::types::{
    BaseTemplateReply, CapturedTemplate, EnrollReply, IdentifyRecord, IdentifyReply, VerifyReply,
};
use ridgescan_session::{
    CompletionEvent, Enrollment, Identification, OperationObserver, ScannerRuntime,
    ScannerSession, Verification,
};

/// Upper bound for one scripted flow; generous because scripts pace their
/// events with real sleeps.
const DEMO_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "ridgescan")]
#[command(about = "Fingerprint capture session demos over a scripted scanner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print the session's state history as JSON after the flow
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging; RUST_LOG overrides this
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a finger from several scripted samples
    Enroll(EnrollArgs),
    /// Verify a live capture against a stored template
    Verify(VerifyArgs),
    /// Acquire a base template and identify it against a small gallery
    Identify(IdentifyArgs),
}

#[derive(Args)]
struct EnrollArgs {
    /// Finger models combined into the template (1-10)
    #[arg(long, default_value_t = 5)]
    models: u8,

    /// Scripted touch/lift sample pairs
    #[arg(long, default_value_t = 3)]
    samples: u32,
}

#[derive(Args)]
struct VerifyArgs {
    /// Raw FAR value to configure before the run (1-1000)
    #[arg(long)]
    far_value: Option<i32>,

    /// Script a non-matching finger
    #[arg(long)]
    no_match: bool,

    /// Inject a fake-source event mid-capture
    #[arg(long)]
    fake: bool,
}

#[derive(Args)]
struct IdentifyArgs {
    /// Number of templates in the scripted gallery
    #[arg(long, default_value_t = 4)]
    gallery: usize,

    /// Script an identification that matches nobody
    #[arg(long)]
    miss: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Enroll(args) => run_enroll(args, cli.json),
        Commands::Verify(args) => run_verify(args, cli.json),
        Commands::Identify(args) => run_identify(args, cli.json),
    }
}

/// Initialize the tracing subscriber; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn run_enroll(args: &EnrollArgs, json: bool) -> Result<()> {
    let (runtime, handle) = demo_runtime();
    let enrollment = Enrollment::new(runtime).context("Failed to attach enrollment session")?;
    enrollment.set_max_models(args.models)?;

    let capture = CapturedTemplate::new(demo_template(0x5A), 8)
        .context("Failed to build the scripted template")?;
    let mut script =
        EnrollScript::new(EnrollReply::ok(capture)).event_gap(Duration::from_millis(120));
    for count in 1..=args.samples {
        script = script
            .event(touch(count, args.samples))
            .event(lift(count, args.samples));
    }
    handle.queue_enroll(script);

    info!(models = args.models, samples = args.samples, "starting enrollment");
    let (observer, completions) = ConsoleObserver::channel();
    enrollment.enroll(observer)?;
    let event = wait(&completions)?;

    info!(status = %event.status(), success = event.succeeded(), "enrollment finished");
    if let Some(bytes) = enrollment.template()? {
        info!(
            bytes = bytes.len(),
            quality = enrollment.quality()?,
            "template captured"
        );
    }
    if json {
        print_history(&enrollment)?;
    }
    enrollment.dispose();
    Ok(())
}

fn run_verify(args: &VerifyArgs, json: bool) -> Result<()> {
    let (runtime, handle) = demo_runtime();
    let verification = Verification::new(runtime, &demo_template(0x5A))
        .context("Failed to attach verification session")?;
    if let Some(value) = args.far_value {
        verification.set_far_value(value)?;
    }
    if args.fake {
        verification.set_fake_detection(true)?;
    }

    let far = verification.far_value()?;
    let mut script = VerifyScript::new(VerifyReply::ok(!args.no_match, far))
        .event_gap(Duration::from_millis(120))
        .event(touch(1, 1));
    if args.fake {
        script = script.event(fake_source(1, 1));
    }
    script = script.event(lift(1, 1));
    handle.queue_verify(script);

    info!(far, level = %verification.far_level()?, "starting verification");
    let (observer, completions) = ConsoleObserver::channel();
    verification.verify(observer)?;
    let event = wait(&completions)?;

    info!(
        status = %event.status(),
        matched = verification.matched()?,
        far_used = verification.far_used()?,
        "verification finished"
    );
    if json {
        print_history(&verification)?;
    }
    verification.dispose();
    Ok(())
}

fn run_identify(args: &IdentifyArgs, json: bool) -> Result<()> {
    let (runtime, handle) = demo_runtime();
    let identification =
        Identification::new(runtime).context("Failed to attach identification session")?;

    handle.queue_base_template(
        BaseTemplateScript::new(BaseTemplateReply::ok(demo_template(0x1D)))
            .event_gap(Duration::from_millis(120))
            .event(touch(1, 1))
            .event(lift(1, 1)),
    );

    info!("starting base-template acquisition");
    let (observer, completions) = ConsoleObserver::channel();
    identification.acquire_base_template(observer)?;
    let event = wait(&completions)?;
    if !event.succeeded() {
        anyhow::bail!("base-template acquisition failed: {}", event.status());
    }

    let records = gallery(args.gallery)?;
    let reply = if args.miss {
        IdentifyReply::no_match()
    } else {
        IdentifyReply::matched((args.gallery / 2) as i32)
    };
    handle.queue_identify(reply);

    info!(gallery = records.len(), "identifying against the gallery");
    let outcome = identification.identify(&records)?;
    match outcome.matched_index() {
        Some(index) => info!(
            key = %String::from_utf8_lossy(&records[index].key),
            index,
            "finger identified"
        ),
        None => info!(status = %outcome.status, "no gallery record matched"),
    }

    if json {
        print_history(&identification)?;
    }
    identification.dispose();
    Ok(())
}

/// Isolated runtime over a fresh mock scanner plus its scripting handle.
fn demo_runtime() -> (Arc<ScannerRuntime>, MockScannerHandle) {
    let (scanner, handle) = MockScanner::new();
    (ScannerRuntime::new(AnyCaptureDriver::Mock(scanner)), handle)
}

/// Deterministic template bytes recognizable in hex dumps.
fn demo_template(seed: u8) -> Vec<u8> {
    (0..96u8).map(|i| seed ^ i).collect()
}

/// Scripted gallery with one template per person key.
fn gallery(size: usize) -> Result<Vec<IdentifyRecord>> {
    (0..size)
        .map(|i| {
            IdentifyRecord::new(format!("person-{i}").into_bytes(), demo_template(i as u8))
                .context("Failed to build a gallery record")
        })
        .collect()
}

fn touch(count: u32, total: u32) -> ProgressEvent {
    ProgressEvent::new(CaptureProgress::new(count, total)).with_signal(ScanSignal::TouchSensor)
}

fn lift(count: u32, total: u32) -> ProgressEvent {
    ProgressEvent::new(CaptureProgress::new(count, total)).with_signal(ScanSignal::TakeOff)
}

fn fake_source(count: u32, total: u32) -> ProgressEvent {
    ProgressEvent::new(CaptureProgress::new(count, total)).with_signal(ScanSignal::FakeSource)
}

fn wait(completions: &Receiver<CompletionEvent>) -> Result<CompletionEvent> {
    completions
        .recv_timeout(DEMO_TIMEOUT)
        .context("The operation never completed")
}

fn print_history(session: &impl ScannerSession) -> Result<()> {
    let history = session.state_history()?;
    println!("{}", serde_json::to_string_pretty(&history)?);
    Ok(())
}

/// Observer that narrates progress callbacks and forwards the completion
/// event to the foreground thread.
struct ConsoleObserver {
    completion_tx: Sender<CompletionEvent>,
}

impl ConsoleObserver {
    fn channel() -> (Arc<Self>, Receiver<CompletionEvent>) {
        let (completion_tx, completion_rx) = mpsc::channel();
        (Arc::new(ConsoleObserver { completion_tx }), completion_rx)
    }
}

impl OperationObserver for ConsoleObserver {
    fn on_touch_sensor(&self, progress: &CaptureProgress) {
        info!(
            sample = progress.count,
            of = progress.total,
            "place finger on the sensor"
        );
    }

    fn on_take_off(&self, progress: &CaptureProgress) {
        info!(sample = progress.count, of = progress.total, "lift finger");
    }

    fn on_fake_source(&self, progress: &CaptureProgress) -> bool {
        warn!(sample = progress.count, "fake source suspected, continuing");
        false
    }

    fn on_frame(&self, frame: &Frame) {
        debug!(width = frame.width, height = frame.height, "preview frame");
    }

    fn on_complete(&self, event: CompletionEvent) {
        let _ = self.completion_tx.send(event);
    }
}
