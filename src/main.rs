//! Sign Capture - community sign contribution pipeline
//!
//! Records repeated attempts of a vocabulary sign from a landmark stream,
//! reconciles them into one consensus sequence, scores it, and submits it.

use signcap::analysis::average;
use signcap::analysis::quality::{QualityBreakdown, QualityScorer};
use signcap::analysis::stats::AttemptStats;
use signcap::app::cli::{Cli, Commands, ConfigAction};
use signcap::app::config::Config;
use signcap::capture::frame_buffer::{FrameConsumer, FrameRingBuffer};
use signcap::capture::monitor::EnvironmentMonitor;
use signcap::capture::recorder::{AttemptRecorder, RecorderEvent, RecorderState};
use signcap::capture::session::ContributionSession;
use signcap::capture::source::JsonlSource;
use signcap::landmark::types::{Attempt, HandUse, SignClassification, SignMovement};
use signcap::submit::assembler::SubmissionAssembler;
use signcap::submit::client::SubmissionClient;
use signcap::time::clock::{Clock, MonotonicClock};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// How long to wait for the environment monitor before starting anyway;
/// the readiness check is advisory only.
const READY_TIMEOUT_SECS: f64 = 10.0;

/// Capture loop cadence
const LOOP_SLEEP: Duration = Duration::from_millis(10);

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so --verbose can set the log level
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    match cli.command {
        Commands::Record {
            word,
            input,
            attempts,
            movement,
            hands,
            output,
        } => {
            run_record(word, &input, attempts, movement, hands, output, &config)?;
        }
        Commands::Process {
            input,
            consensus_out,
        } => {
            run_process(&input, consensus_out, &config)?;
        }
        Commands::Submit { input, endpoint } => {
            run_submit(&input, endpoint, &config)?;
        }
        Commands::Monitor { input } => {
            run_monitor(&input, &config)?;
        }
        Commands::List { detailed } => {
            run_list(detailed)?;
        }
        Commands::Init { force } => {
            run_init(force, &config)?;
        }
        Commands::Config { action } => {
            run_config(action, &config)?;
        }
    }

    Ok(())
}

/// Outcome of one attempt capture pass.
enum CaptureOutcome {
    /// A valid attempt was frozen
    Completed(Attempt),
    /// The buffer was rejected (too short); the user can retake
    Discarded,
    /// The user aborted outside a recording
    Aborted,
    /// The landmark stream ran out
    StreamEnded,
}

fn run_record(
    word: String,
    input: &PathBuf,
    attempts_override: Option<usize>,
    movement: SignMovement,
    hands: HandUse,
    output: Option<String>,
    config: &Config,
) -> anyhow::Result<()> {
    let target_attempts = attempts_override.unwrap_or(config.session.target_attempts);
    info!(
        "Recording {} attempt(s) for '{}' from {:?}",
        target_attempts, word, input
    );

    let buffer = FrameRingBuffer::new();
    let stats = buffer.stats();
    let (mut producer, mut consumer) = buffer.split();

    // Ctrl+C stops the in-progress attempt (or aborts between attempts)
    let stop_flag = Arc::new(AtomicBool::new(false));
    {
        let stop = stop_flag.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))?;
    }

    // Replay the stream at the nominal capture rate, the way the live
    // engine callback would deliver it
    let source = JsonlSource::open(input)?;
    let stream_done = Arc::new(AtomicBool::new(false));
    let feeder_shutdown = Arc::new(AtomicBool::new(false));
    let feeder = {
        let done = stream_done.clone();
        let shutdown = feeder_shutdown.clone();
        let interval = Duration::from_secs_f64(1.0 / config.recorder.nominal_fps);
        std::thread::spawn(move || {
            for frame in source {
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                match frame {
                    Ok(frame) => {
                        if !producer.push(frame) {
                            warn!("frame dropped: capture loop is not draining");
                        }
                    }
                    Err(e) => {
                        error!("landmark stream error: {e}");
                        break;
                    }
                }
                std::thread::sleep(interval);
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let clock = MonotonicClock::new();
    let monitor = EnvironmentMonitor::with_config(config.monitor.clone());
    let mut recorder = AttemptRecorder::new(config.recorder.clone());
    let mut session = ContributionSession::new(
        word.clone(),
        SignClassification {
            movement,
            hand_use: hands,
        },
    );

    while session.len() < target_attempts {
        println!(
            "\nAttempt {}/{} - get ready",
            session.len() + 1,
            target_attempts
        );
        match capture_attempt(
            &mut recorder,
            &mut consumer,
            &monitor,
            &clock,
            &stop_flag,
            &stream_done,
        ) {
            CaptureOutcome::Completed(attempt) => {
                println!(
                    "  Attempt complete: {} frames, {:.1}s, quality {:.2}",
                    attempt.len(),
                    attempt.duration,
                    attempt.quality
                );
                session.push_attempt(attempt);
            }
            CaptureOutcome::Discarded => {
                println!("  Attempt discarded - hold the sign a little longer and retake");
            }
            CaptureOutcome::Aborted => {
                info!("capture aborted by user");
                break;
            }
            CaptureOutcome::StreamEnded => {
                info!("landmark stream ended");
                break;
            }
        }
    }

    feeder_shutdown.store(true, Ordering::SeqCst);
    let _ = feeder.join();

    let dropped = stats.frames_dropped.load(Ordering::Relaxed);
    if dropped > 0 {
        warn!("{dropped} frames were dropped during capture");
    }

    if session.is_empty() {
        anyhow::bail!("no valid attempts captured");
    }
    session.finalize();

    let sessions_dir = Cli::sessions_dir();
    std::fs::create_dir_all(&sessions_dir)?;
    let name = output.unwrap_or_else(|| {
        format!(
            "{}_{}",
            word,
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        )
    });
    let path = sessions_dir.join(format!("{name}.json"));
    session.save(&path)?;

    let attempt_stats = AttemptStats::from_attempts(&session.attempts);
    println!("\nSession saved: {}", path.display());
    println!("  Word: {word}");
    println!("  Attempts: {}", session.len());
    println!(
        "  Qualities: {}",
        attempt_stats
            .individual_qualities
            .iter()
            .map(|q| format!("{q:.2}"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Trend: {}", attempt_stats.improvement_trend.as_str());
    println!("\nNext: signcap process {}", path.display());

    Ok(())
}

/// Drive one attempt: readiness gate, countdown, recording, freeze.
fn capture_attempt(
    recorder: &mut AttemptRecorder,
    consumer: &mut FrameConsumer,
    monitor: &EnvironmentMonitor,
    clock: &MonotonicClock,
    stop_flag: &AtomicBool,
    stream_done: &AtomicBool,
) -> CaptureOutcome {
    // Environment readiness. Advisory: after the timeout we start anyway.
    let deadline = clock.now() + READY_TIMEOUT_SECS;
    let mut announced_guidance = false;
    loop {
        if stop_flag.swap(false, Ordering::SeqCst) {
            return CaptureOutcome::Aborted;
        }
        let batch = consumer.pop_batch(32);
        if let Some(slot) = batch.last() {
            let reading = monitor.assess(&slot.frame);
            if reading.can_proceed {
                debug!(
                    lighting = reading.lighting_quality,
                    hands = reading.hand_visibility,
                    "environment ready"
                );
                break;
            }
            if let Some(guidance) = &reading.guidance {
                if !announced_guidance {
                    println!("  {guidance}");
                    announced_guidance = true;
                }
            }
        }
        if stream_exhausted(consumer, stream_done) {
            return CaptureOutcome::StreamEnded;
        }
        if clock.now() >= deadline {
            warn!("environment not ready after {READY_TIMEOUT_SECS}s; starting anyway");
            break;
        }
        std::thread::sleep(LOOP_SLEEP);
    }

    for event in recorder.start(clock.now()) {
        report_event(&event);
    }

    loop {
        let mut events = Vec::new();
        if stop_flag.swap(false, Ordering::SeqCst) {
            events.extend(recorder.request_stop(clock.now()));
        }
        for slot in consumer.pop_batch(32) {
            events.extend(recorder.handle_frame(&slot.frame, clock.now()));
        }
        events.extend(recorder.tick(clock.now()));

        for event in events {
            report_event(&event);
            match event {
                RecorderEvent::AttemptReady(attempt) => {
                    return CaptureOutcome::Completed(attempt)
                }
                RecorderEvent::AttemptTooShort { .. } => return CaptureOutcome::Discarded,
                _ => {}
            }
        }

        if stream_exhausted(consumer, stream_done) {
            match recorder.state() {
                RecorderState::Recording => {
                    for event in recorder.request_stop(clock.now()) {
                        report_event(&event);
                    }
                }
                RecorderState::CountingDown => {
                    recorder.abort();
                    return CaptureOutcome::StreamEnded;
                }
                RecorderState::Idle => return CaptureOutcome::StreamEnded,
                // Stopping: wait for the freeze to come out of tick()
                RecorderState::Stopping => {}
            }
        }

        std::thread::sleep(LOOP_SLEEP);
    }
}

fn stream_exhausted(consumer: &FrameConsumer, stream_done: &AtomicBool) -> bool {
    stream_done.load(Ordering::SeqCst) && consumer.pending() == 0
}

fn report_event(event: &RecorderEvent) {
    match event {
        RecorderEvent::CountdownTick { remaining } => {
            if *remaining > 0 {
                println!("  {remaining}...");
            }
        }
        RecorderEvent::RecordingStarted => println!("  * Recording - sign now"),
        RecorderEvent::Progress { elapsed, remaining } => {
            debug!(elapsed, remaining, "recording progress");
        }
        RecorderEvent::RecordingStopped { reason } => {
            debug!(?reason, "recording stopped");
        }
        RecorderEvent::AttemptReady(_) | RecorderEvent::AttemptTooShort { .. } => {}
    }
}

fn run_process(
    input: &PathBuf,
    consensus_out: Option<PathBuf>,
    config: &Config,
) -> anyhow::Result<()> {
    let session = ContributionSession::load(input)?;
    info!(
        "Loaded session '{}' with {} attempt(s)",
        session.metadata.word,
        session.len()
    );

    let consensus = average::derive_consensus(&session.attempts)?;
    let scorer = QualityScorer::with_config(config.quality.clone());
    let breakdown = scorer.score(&consensus.frames, session.classification.movement);
    let stats = AttemptStats::from_attempts(&session.attempts);

    println!("Word: {}", session.metadata.word);
    println!(
        "Attempts: {} (frame counts {:?}, aligned to {})",
        session.len(),
        session.frame_counts(),
        consensus.reference_length
    );
    println!(
        "Attempt trend: {} (quality variance {:.4})",
        stats.improvement_trend.as_str(),
        stats.quality_variance
    );
    print_breakdown(&breakdown);

    if scorer.accepts(&breakdown) {
        println!(
            "Acceptance gate: PASS ({:.2} >= {:.2})",
            breakdown.overall,
            scorer.config().acceptance_threshold
        );
    } else {
        println!(
            "Acceptance gate: FAIL ({:.2} < {:.2})",
            breakdown.overall,
            scorer.config().acceptance_threshold
        );
    }

    if let Some(path) = consensus_out {
        let json = serde_json::to_string_pretty(&consensus.frames)?;
        std::fs::write(&path, json)?;
        println!("Consensus frames written to {}", path.display());
    }

    Ok(())
}

fn run_submit(input: &PathBuf, endpoint: Option<String>, config: &Config) -> anyhow::Result<()> {
    let session = ContributionSession::load(input)?;
    info!(
        "Submitting '{}' ({} attempts)",
        session.metadata.word,
        session.len()
    );

    let scorer = QualityScorer::with_config(config.quality.clone());
    let assembler = SubmissionAssembler::new(scorer, config.recorder.min_frames);

    let (payload, local_breakdown) = match assembler.assemble(&session) {
        Ok(assembled) => assembled,
        Err(signcap::Error::QualityRejected {
            score,
            threshold,
            breakdown,
        }) => {
            println!(
                "Submission blocked locally: composite quality {score:.2} is below the acceptance threshold {threshold:.2}"
            );
            print_breakdown(&breakdown);
            println!("The session file was kept; retake the weakest attempts and try again.");
            anyhow::bail!("quality below acceptance threshold");
        }
        Err(e) => return Err(e.into()),
    };

    let mut submit_config = config.submit.clone();
    if let Some(endpoint) = endpoint {
        submit_config.endpoint = endpoint;
    }
    let client = SubmissionClient::new(submit_config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    match runtime.block_on(client.submit(&payload)) {
        Ok(accepted) => {
            println!("Submission accepted");
            println!("  Total contributions: {}", accepted.total_contributions);
            println!("  Progress: {:.1}%", accepted.progress_percentage);
            print_breakdown(accepted.quality_breakdown.as_ref().unwrap_or(&local_breakdown));

            // The session is finished once the backend accepts it
            std::fs::remove_file(input)?;
            info!("session complete; removed {:?}", input);
            Ok(())
        }
        Err(e) => {
            match &e {
                signcap::Error::Backend {
                    reason, breakdown, ..
                } => {
                    println!("Submission rejected: {reason}");
                    if let Some(b) = breakdown {
                        print_breakdown(b);
                    }
                }
                other => println!("Submission failed: {other}"),
            }
            println!(
                "Session file kept at {}; retry submission without re-recording.",
                input.display()
            );
            Err(e.into())
        }
    }
}

fn print_breakdown(b: &QualityBreakdown) {
    println!("Quality breakdown:");
    println!(
        "  Overall:            {:.2} ({})",
        b.overall,
        b.overall_label().as_str()
    );
    println!(
        "  Hand visibility:    {:.2} ({})",
        b.hand_visibility,
        b.labels.hand_visibility.as_str()
    );
    println!(
        "  Motion smoothness:  {:.2} ({})",
        b.motion_smoothness,
        b.labels.motion_smoothness.as_str()
    );
    println!(
        "  Frame completeness: {:.2} ({})",
        b.frame_completeness,
        b.labels.frame_completeness.as_str()
    );
    println!(
        "  Lighting:           {:.2} ({})",
        b.lighting_quality,
        b.labels.lighting.as_str()
    );
    for recommendation in &b.recommendations {
        println!("  - {recommendation}");
    }
}

fn run_monitor(input: &PathBuf, config: &Config) -> anyhow::Result<()> {
    let monitor = EnvironmentMonitor::with_config(config.monitor.clone());

    let mut total = 0usize;
    let mut ready = 0usize;
    for (i, frame) in JsonlSource::open(input)?.enumerate() {
        let frame = frame?;
        let reading = monitor.assess(&frame);
        total += 1;
        if reading.can_proceed {
            ready += 1;
        }

        let status = if reading.can_proceed {
            "ready".to_string()
        } else {
            reading.guidance.clone().unwrap_or_else(|| "not ready".to_string())
        };
        println!(
            "frame {:>5}  lighting {:>4.2} ({:<10})  hands {:>4.2}  {}",
            i,
            reading.lighting_quality,
            reading.lighting.as_str(),
            reading.hand_visibility,
            status
        );
    }

    if total == 0 {
        println!("No frames in {}", input.display());
    } else {
        println!(
            "\n{ready}/{total} frames ready ({:.0}%)",
            100.0 * ready as f64 / total as f64
        );
    }
    Ok(())
}

fn run_list(detailed: bool) -> anyhow::Result<()> {
    let sessions_dir = Cli::sessions_dir();

    if !sessions_dir.exists() {
        println!("No sessions found in {}", sessions_dir.display());
        println!("Start one with: signcap record <word> --input <stream.jsonl>");
        return Ok(());
    }

    println!("Sessions in {:?}:", sessions_dir);

    let mut entries: Vec<_> = std::fs::read_dir(&sessions_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == "json")
                .unwrap_or(false)
        })
        .collect();

    entries.sort_by_key(|e| e.path());

    for entry in &entries {
        let path = entry.path();
        let file_name = path.file_name().unwrap_or_default().to_string_lossy();

        if detailed {
            match ContributionSession::load(&path) {
                Ok(session) => {
                    let qualities = session
                        .attempt_qualities()
                        .iter()
                        .map(|q| format!("{q:.2}"))
                        .collect::<Vec<_>>()
                        .join("/");
                    println!(
                        "  {}  (word: {}, {} attempts, qualities {})",
                        file_name,
                        session.metadata.word,
                        session.len(),
                        if qualities.is_empty() { "-".to_string() } else { qualities }
                    );
                }
                Err(_) => {
                    let fs_meta = entry.metadata()?;
                    println!("  {}  ({} bytes, failed to parse)", file_name, fs_meta.len());
                }
            }
        } else {
            println!("  {}", file_name);
        }
    }

    if entries.is_empty() {
        println!("  (none)");
        println!("Start one with: signcap record <word> --input <stream.jsonl>");
    }

    Ok(())
}

fn run_init(force: bool, config: &Config) -> anyhow::Result<()> {
    let config_path = Config::default_path();

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {:?}. Use --force to overwrite.",
            config_path
        );
    }

    config.save_default()?;
    println!("Created config at {:?}", config_path);
    println!("\nConfig content:\n{}", config.to_toml()?);

    std::fs::create_dir_all(Cli::sessions_dir())?;
    println!("Sessions directory: {:?}", Cli::sessions_dir());

    Ok(())
}

fn run_config(action: ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("Configuration ({:?}):\n", Config::default_path());
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Get { key } => {
            let root = toml::Value::try_from(config)?;
            match lookup_key(&root, &key) {
                Some(value) => println!("{key} = {value}"),
                None => anyhow::bail!("Configuration key '{}' not found", key),
            }
        }
        ConfigAction::Set { key, value } => {
            let config_path = Config::default_path();
            if !config_path.exists() {
                anyhow::bail!("No config file found. Run 'signcap init' first.");
            }

            let content = std::fs::read_to_string(&config_path)?;
            let mut root: toml::Value = toml::from_str(&content)?;
            if !set_key(&mut root, &key, &value) {
                anyhow::bail!(
                    "Failed to set '{}'. Key may not exist or the value has the wrong type.",
                    key
                );
            }

            // Round-trip through the typed config so invalid values are
            // rejected before they land on disk
            let updated: Config = root
                .try_into()
                .map_err(|e: toml::de::Error| anyhow::anyhow!(e.to_string()))?;
            updated.validate()?;
            updated.save(&config_path)?;
            println!("Set {key} = {value}");
        }
        ConfigAction::Reset { force } => {
            let config_path = Config::default_path();

            if config_path.exists() && !force {
                println!("Config exists at {:?}", config_path);
                println!("Use --force to reset to defaults");
                return Ok(());
            }

            Config::default().save_default()?;
            println!("Configuration reset to defaults at {:?}", config_path);
        }
    }

    Ok(())
}

/// Walk a dotted key through nested TOML tables.
fn lookup_key<'a>(root: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    let mut current = root;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

/// Set a dotted key, preserving the existing value's type.
fn set_key(root: &mut toml::Value, key: &str, raw: &str) -> bool {
    let mut parts: Vec<&str> = key.split('.').collect();
    let leaf = match parts.pop() {
        Some(leaf) => leaf,
        None => return false,
    };

    let mut current = root;
    for part in parts {
        current = match current.get_mut(part) {
            Some(value) => value,
            None => return false,
        };
    }
    let slot = match current.get_mut(leaf) {
        Some(slot) => slot,
        None => return false,
    };

    *slot = match slot {
        toml::Value::Boolean(_) => match raw.parse::<bool>() {
            Ok(v) => toml::Value::Boolean(v),
            Err(_) => return false,
        },
        toml::Value::Integer(_) => match raw.parse::<i64>() {
            Ok(v) => toml::Value::Integer(v),
            Err(_) => return false,
        },
        toml::Value::Float(_) => match raw.parse::<f64>() {
            Ok(v) => toml::Value::Float(v),
            Err(_) => return false,
        },
        toml::Value::String(_) => toml::Value::String(raw.to_string()),
        _ => return false,
    };
    true
}
