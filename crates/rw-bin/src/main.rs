//! rotatewords entrypoint.
use anyhow::Result;
use clap::Parser;
use core_config::{Config, OptionOverrides, load_from};
use core_events::{EVENT_CHANNEL_CAP, ElementId, Event, InputEvent};
use core_rotation::{InitOutcome, Phase, WidgetRegistry};
use core_terminal::{CrosstermBackend, TerminalBackend, TerminalGuard, TerminalHost};
use core_text::measure;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "rotatewords.log";
/// Left margin and first row of the element stack.
const ORIGIN: (u16, u16) = (2, 1);

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "rotatewords", version, about = "Rotate delimiter-separated phrases in place")]
struct Args {
    /// One element per argument; each is segmented and rotated independently.
    #[arg(required = true)]
    pub texts: Vec<String>,
    /// Delimiter for every element (beats `data-delim` and the config file).
    #[arg(long)]
    pub delim: Option<String>,
    /// Milliseconds between ticks (beats `data-interval` and the config file).
    #[arg(long)]
    pub interval: Option<u64>,
    /// Element attribute applied to every element, e.g. `--data delim=|`.
    #[arg(long = "data", value_name = "KEY=VALUE", value_parser = parse_data)]
    pub data: Vec<(String, String)>,
    /// Optional configuration file path (overrides discovery of `rotatewords.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> OptionOverrides {
        let mut o = OptionOverrides::new();
        if let Some(d) = &self.delim {
            o = o.with_delim(d.clone());
        }
        if let Some(ms) = self.interval {
            o = o.with_interval_ms(ms);
        }
        o
    }
}

/// Parse `KEY=VALUE` into an attribute pair. Keys get a `data-` prefix when missing.
fn parse_data(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty attribute name in `{raw}`"));
    }
    let key = if key.starts_with("data-") {
        key.to_string()
    } else {
        format!("data-{key}")
    };
    Ok((key, value.to_string()))
}

/// Top-left corner of each element. Every element reserves the rows of its
/// original text plus one blank separator row.
fn stack_origins<S: AsRef<str>>(texts: &[S], origin: (u16, u16)) -> Vec<(u16, u16)> {
    let (col, mut row) = origin;
    texts
        .iter()
        .map(|t| {
            let at = (col, row);
            row = row
                .saturating_add(measure(t.as_ref()).height.max(1))
                .saturating_add(1);
            at
        })
        .collect()
}

/// Rows from the top of the screen to the end of the last element.
fn stack_rows<S: AsRef<str>>(texts: &[S], origin: (u16, u16)) -> u16 {
    match (stack_origins(texts, origin).last(), texts.last()) {
        (Some(&(_, row)), Some(t)) => row.saturating_add(measure(t.as_ref()).height.max(1)),
        _ => origin.1,
    }
}

struct AppStartup {
    backend: CrosstermBackend,
    log_guard: Option<WorkerGuard>,
}

struct RuntimeContext<'a> {
    args: Args,
    config: Config,
    terminal_guard: TerminalGuard<'a>,
}

impl AppStartup {
    fn new() -> Self {
        Self {
            backend: CrosstermBackend::new(),
            log_guard: None,
        }
    }

    fn run<'a>(&'a mut self, args: Args) -> Result<RuntimeContext<'a>> {
        self.configure_logging()?;
        Self::install_panic_hook();

        info!(target: "runtime", "startup");
        let config = load_from(args.config.clone())?;
        info!(
            target: "runtime.startup",
            elements = args.texts.len(),
            config_override = args.config.is_some(),
            config_loaded = config.raw.is_some(),
            attributes = args.data.len(),
            "bootstrap_complete"
        );

        self.backend.set_title("rotatewords")?;
        let guard = self.backend.enter_guard()?;
        match guard.size() {
            Ok((cols, rows)) => {
                let needed = stack_rows(&args.texts, ORIGIN);
                if needed > rows {
                    warn!(target: "runtime.startup", rows, needed, "stack_exceeds_terminal");
                }
                debug!(target: "runtime.startup", cols, rows, "terminal_size");
            }
            Err(e) => warn!(target: "runtime.startup", error = %e, "terminal_size_unknown"),
        }
        Ok(RuntimeContext {
            args,
            config,
            terminal_guard: guard,
        })
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join(LOG_FILE);
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

enum LoopControl {
    Continue,
    Break { reason: ShutdownReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownReason {
    CtrlC,
    QuitKey,
    ShutdownEvent,
    ChannelClosed,
}

impl ShutdownReason {
    fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::CtrlC => "ctrl_c",
            ShutdownReason::QuitKey => "quit_key",
            ShutdownReason::ShutdownEvent => "shutdown_event",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn log_shutdown_stage(reason: ShutdownReason, stage: &'static str) {
    info!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        stage = stage,
        "shutdown_stage"
    );
}

/// Bind one widget per text. Elements that do not segment are painted as-is.
/// Returns how many elements rotate.
fn mount_elements<W, F>(
    registry: &mut WidgetRegistry<TerminalHost<W>>,
    texts: &[String],
    attributes: &[(String, String)],
    overrides: &OptionOverrides,
    mut make_out: F,
) -> usize
where
    W: Write,
    F: FnMut() -> W,
{
    let mut rotating = 0;
    for (i, (text, origin)) in texts.iter().zip(stack_origins(texts, ORIGIN)).enumerate() {
        let id = ElementId(i as u64);
        let host =
            TerminalHost::new(origin, text.as_str(), make_out()).with_attributes(attributes.to_vec());
        match registry.init_if_absent(id, host, overrides) {
            InitOutcome::Initialized(Phase::Passthrough) => {
                if let Some(widget) = registry.get_mut(id)
                    && let Err(e) = widget.host_mut().paint_passthrough()
                {
                    warn!(target: "runtime", element = %id, error = %e, "passthrough_paint_failed");
                }
            }
            InitOutcome::Initialized(phase) => {
                rotating += 1;
                debug!(target: "runtime", element = %id, phase = phase.as_str(), "element_mounted");
            }
            InitOutcome::AlreadyInitialized => {}
        }
    }
    rotating
}

struct Runtime<'a, W: Write> {
    registry: WidgetRegistry<TerminalHost<W>>,
    rx: mpsc::Receiver<Event>,
    input_task: Option<JoinHandle<()>>,
    input_shutdown: Option<core_input::AsyncInputShutdown>,
    _terminal_guard: Option<TerminalGuard<'a>>,
}

impl<'a, W: Write> Runtime<'a, W> {
    fn new(
        registry: WidgetRegistry<TerminalHost<W>>,
        rx: mpsc::Receiver<Event>,
        input_task: Option<JoinHandle<()>>,
        input_shutdown: Option<core_input::AsyncInputShutdown>,
        terminal_guard: Option<TerminalGuard<'a>>,
    ) -> Self {
        Self {
            registry,
            rx,
            input_task,
            input_shutdown,
            _terminal_guard: terminal_guard,
        }
    }

    async fn run(&mut self) -> Result<ShutdownReason> {
        let loop_span = tracing::debug_span!(target: "runtime", "event_loop");
        let _enter_loop = loop_span.enter();

        let mut shutdown_reason = ShutdownReason::ChannelClosed;
        while let Some(event) = self.rx.recv().await {
            if let LoopControl::Break { reason } = self.handle_event(&event) {
                shutdown_reason = reason;
                break;
            }
        }

        self.finalize_shutdown(shutdown_reason).await;
        Ok(shutdown_reason)
    }

    fn handle_event(&mut self, event: &Event) -> LoopControl {
        match event {
            Event::Tick(..) => {
                self.registry.handle_event(event);
                LoopControl::Continue
            }
            Event::Input(InputEvent::Quit) => LoopControl::Break {
                reason: ShutdownReason::QuitKey,
            },
            Event::Input(InputEvent::CtrlC) => LoopControl::Break {
                reason: ShutdownReason::CtrlC,
            },
            Event::Input(InputEvent::Resize(w, h)) => {
                // Dimensions are fixed at init; nothing is re-measured.
                debug!(target: "runtime", width = w, height = h, "resize_ignored");
                LoopControl::Continue
            }
            Event::Shutdown => LoopControl::Break {
                reason: ShutdownReason::ShutdownEvent,
            },
        }
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) {
        log_shutdown_stage(reason, "begin");

        let stopped = self.registry.stop_all();
        trace!(
            target: "runtime.shutdown",
            reason = reason.as_str(),
            stopped,
            "timers_stopped"
        );
        self.rx.close();

        if let Some(shutdown) = self.input_shutdown.take() {
            trace!(
                target: "runtime.shutdown",
                reason = reason.as_str(),
                "input_task_shutdown_signal"
            );
            shutdown.signal();
        }

        if let Some(handle) = self.input_task.take() {
            match tokio::time::timeout(Duration::from_millis(200), handle).await {
                Ok(Ok(_)) => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "input_task_joined"
                ),
                Ok(Err(err)) if err.is_cancelled() => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "input_task_cancelled"
                ),
                Ok(Err(err)) => error!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    ?err,
                    "input_task_join_failed"
                ),
                Err(_) => warn!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "input_task_timeout"
                ),
            }
        }

        info!(
            target: "runtime.shutdown",
            ticks_sent = core_events::TICKS_SENT.load(Ordering::Relaxed),
            timer_starts = core_events::TIMER_STARTS.load(Ordering::Relaxed),
            timer_cancels = core_events::TIMER_CANCELS.load(Ordering::Relaxed),
            send_failures = core_events::CHANNEL_SEND_FAILURES.load(Ordering::Relaxed),
            "event_counters"
        );
        log_shutdown_stage(reason, "complete");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    let context = startup.run(args)?;
    let RuntimeContext {
        args,
        config,
        terminal_guard,
    } = context;

    let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let (input_task, input_shutdown) = core_input::spawn_async_input(tx.clone());

    let mut registry = WidgetRegistry::new(config, tx);
    let rotating = mount_elements(
        &mut registry,
        &args.texts,
        &args.data,
        &args.overrides(),
        std::io::stdout,
    );
    info!(target: "runtime", elements = registry.len(), rotating, "elements_mounted");

    let mut runtime = Runtime::new(
        registry,
        rx,
        Some(input_task),
        Some(input_shutdown),
        Some(terminal_guard),
    );
    runtime.run().await?;
    Ok(())
}
