use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

use wikisync_core::config::{RegistryConfig, WikiConfig};
use wikisync_core::registry::RegistryClient;
use wikisync_sync::{run_full_sync, PassReport, SyncError};
use wikisync_wiki::WikiGateway;

use crate::error::{io_err, DaemonError};
use crate::stream::{run_change_stream, ChangeEvent, STREAM_CHANNEL_CAPACITY};

/// Quiet period after the last notification before a full pass runs.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(30);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// One full reconciliation pass. Runs on the blocking pool.
pub trait PassRunner: Send + Sync + 'static {
    fn run_pass(&self) -> Result<PassReport, SyncError>;
}

impl<F> PassRunner for F
where
    F: Fn() -> Result<PassReport, SyncError> + Send + Sync + 'static,
{
    fn run_pass(&self) -> Result<PassReport, SyncError> {
        self()
    }
}

/// Debounced scheduling loop.
///
/// Holds a single pending deadline. Every notification pushes it out to
/// `now + window`; when it fires, exactly one pass runs and the slot is
/// cleared. A pass is scheduled one window after start even without
/// notifications.
pub struct Orchestrator<R> {
    runner: Arc<R>,
    window: Duration,
}

impl<R: PassRunner> Orchestrator<R> {
    pub fn new(runner: R) -> Self {
        Orchestrator {
            runner: Arc::new(runner),
            window: DEBOUNCE_WINDOW,
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub async fn run(
        self,
        mut events: mpsc::Receiver<ChangeEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), DaemonError> {
        let mut pending: Option<Instant> = Some(Instant::now() + self.window);
        let mut events_open = true;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("shutting down");
                    break;
                }
                event = events.recv(), if events_open => match event {
                    Some(event) => {
                        tracing::debug!(
                            kind = event.kind.as_str(),
                            package = %event.package,
                            "change received, resetting debounce window"
                        );
                        pending = Some(Instant::now() + self.window);
                    }
                    None => {
                        tracing::warn!("change stream channel closed");
                        events_open = false;
                    }
                },
                _ = wait_for(pending) => {
                    pending = None;
                    self.run_pass().await;
                }
            }
        }
        Ok(())
    }

    /// Run one pass to completion. Pass failures, panics included, are
    /// logged and never end the loop.
    async fn run_pass(&self) {
        let runner = self.runner.clone();
        let result = match tokio::task::spawn_blocking(move || runner.run_pass()).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = %err, "sync pass task failed");
                return;
            }
        };
        match result {
            Ok(report) if report.is_clean() => {
                tracing::info!(changed = report.changed(), "debounced sync completed");
            }
            Ok(report) => {
                tracing::warn!(
                    changed = report.changed(),
                    failures = report.failures.len(),
                    "debounced sync completed with failures"
                );
            }
            Err(err) => tracing::error!(error = %err, "full sync aborted"),
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Resolve on ctrl-c, or on SIGTERM where available.
async fn shutdown_signal() -> Result<&'static str, DaemonError> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).map_err(|e| io_err("SIGTERM handler", e))?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res
                .map(|()| "ctrl-c")
                .map_err(|e| io_err("ctrl-c handler", e)),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| io_err("ctrl-c handler", e))?;
        Ok("ctrl-c")
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn from_name(name: &str) -> Result<Self, DaemonError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(DaemonError::LogFormat(name.to_string())),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info`.
pub fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = match format {
        LogFormat::Text => fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_target(false)
            .try_init(),
        LogFormat::Json => fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_current_span(false)
            .try_init(),
    };
}

/// Connect to the wiki, then run the daemon on a fresh runtime until ctrl-c
/// or SIGTERM.
///
/// A failed initial login is returned before the runtime starts.
pub fn start_blocking(registry: RegistryConfig, wiki: &WikiConfig) -> Result<(), DaemonError> {
    let gateway = wikisync_wiki::connect(wiki)?;
    let client = RegistryClient::new(registry);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio runtime", e))?;
    let result = runtime.block_on(run(client, gateway));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

/// Run the daemon: stream consumer thread, signal handler, and the
/// coordination loop.
pub async fn run(client: RegistryClient, wiki: Box<dyn WikiGateway>) -> Result<(), DaemonError> {
    let (event_tx, event_rx) = mpsc::channel::<ChangeEvent>(STREAM_CHANNEL_CAPACITY);
    let (shutdown_tx, _) = broadcast::channel::<()>(4);

    let stream_client = client.clone();
    std::thread::Builder::new()
        .name("change-stream".into())
        .spawn(move || run_change_stream(stream_client, event_tx))
        .map_err(|e| io_err("spawn change stream thread", e))?;

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok::<(), DaemonError>(()),
                signal = shutdown_signal() => {
                    let name = signal?;
                    tracing::info!(signal = name, "received shutdown signal, shutting down daemon");
                    let _ = shutdown.send(());
                    Ok(())
                }
            }
        })
    };

    let wiki: Arc<dyn WikiGateway> = Arc::from(wiki);
    let runner = move || run_full_sync(&client, wiki.as_ref());
    tracing::info!(window_s = DEBOUNCE_WINDOW.as_secs(), "daemon started, first sync scheduled");
    let result = Orchestrator::new(runner)
        .run(event_rx, shutdown_tx.subscribe())
        .await;

    let _ = shutdown_tx.send(());
    match signal_handle.await {
        Ok(inner) => inner?,
        Err(err) => {
            return Err(DaemonError::Join {
                task: "signal handler",
                detail: err.to_string(),
            })
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
    use tokio::time::{sleep, timeout};

    use crate::stream::ChangeKind;

    fn event(package: &str) -> ChangeEvent {
        ChangeEvent {
            kind: ChangeKind::Updated,
            package: package.into(),
            id: None,
        }
    }

    fn counting_runner() -> (
        impl Fn() -> Result<PassReport, SyncError> + Send + Sync + 'static,
        mpsc::UnboundedReceiver<()>,
    ) {
        let (tx, rx) = unbounded_channel();
        let runner = move || {
            let _ = tx.send(());
            Ok(PassReport::default())
        };
        (runner, rx)
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn first_pass_runs_one_window_after_start() {
        let (_tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (runner, mut passes) = counting_runner();
        let start = Instant::now();
        tokio::spawn(Orchestrator::new(runner).run(rx, shutdown_rx));

        passes.recv().await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= DEBOUNCE_WINDOW, "ran after {elapsed:?}");
        assert!(elapsed < DEBOUNCE_WINDOW + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn burst_of_events_collapses_into_one_pass() {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (runner, mut passes) = counting_runner();
        let start = Instant::now();
        tokio::spawn(Orchestrator::new(runner).run(rx, shutdown_rx));

        tx.send(event("a")).await.unwrap();
        sleep(Duration::from_secs(10)).await;
        tx.send(event("b")).await.unwrap();
        sleep(Duration::from_secs(10)).await;
        tx.send(event("a")).await.unwrap();

        passes.recv().await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(50), "ran after {elapsed:?}");
        assert!(elapsed < Duration::from_secs(51));

        assert!(timeout(Duration::from_secs(120), passes.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn shutdown_stops_the_loop_before_any_pass() {
        let (_tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (runner, mut passes) = counting_runner();

        let handle = tokio::spawn(Orchestrator::new(runner).run(rx, shutdown_rx));
        shutdown_tx.send(()).unwrap();

        handle.await.unwrap().unwrap();
        assert!(passes.try_recv().is_err());
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn closed_event_channel_keeps_scheduled_pass() {
        let (tx, rx) = mpsc::channel::<ChangeEvent>(STREAM_CHANNEL_CAPACITY);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (runner, mut passes) = counting_runner();
        tokio::spawn(Orchestrator::new(runner).run(rx, shutdown_rx));
        drop(tx);

        timeout(DEBOUNCE_WINDOW + Duration::from_secs(1), passes.recv())
            .await
            .expect("startup pass")
            .unwrap();
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn pass_errors_do_not_stop_the_loop() {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (pass_tx, mut passes) = unbounded_channel::<()>();

        let orchestrator = Orchestrator::new(move || {
            let _ = pass_tx.send(());
            Err(SyncError::Registry(
                wikisync_core::RegistryError::Transport("down".into()),
            ))
        })
        .with_window(Duration::from_secs(5));
        tokio::spawn(orchestrator.run(rx, shutdown_rx));

        passes.recv().await.unwrap();
        tx.send(event("a")).await.unwrap();
        timeout(Duration::from_secs(10), passes.recv())
            .await
            .expect("second pass after failure")
            .unwrap();
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn shutdown_waits_for_the_running_pass() {
        let (_tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (started_tx, mut started) = unbounded_channel::<()>();
        let finished = Arc::new(AtomicBool::new(false));

        let done = finished.clone();
        let orchestrator = Orchestrator::new(move || {
            let _ = started_tx.send(());
            std::thread::sleep(std::time::Duration::from_millis(200));
            done.store(true, AtomicOrdering::SeqCst);
            Ok(PassReport::default())
        })
        .with_window(Duration::from_secs(1));
        let handle = tokio::spawn(orchestrator.run(rx, shutdown_rx));

        started.recv().await.unwrap();
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
        assert!(finished.load(AtomicOrdering::SeqCst));
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn panicking_pass_does_not_stop_the_loop() {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (pass_tx, mut passes) = unbounded_channel::<usize>();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let orchestrator = Orchestrator::new(move || {
            let n = counter.fetch_add(1, AtomicOrdering::SeqCst);
            if n == 0 {
                panic!("first pass blows up");
            }
            let _ = pass_tx.send(n);
            Ok(PassReport::default())
        })
        .with_window(Duration::from_secs(5));
        let handle = tokio::spawn(orchestrator.run(rx, shutdown_rx));

        sleep(Duration::from_secs(6)).await;
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
        assert!(!handle.is_finished());

        tx.send(event("a")).await.unwrap();
        let second = timeout(Duration::from_secs(10), passes.recv())
            .await
            .expect("second pass after panic")
            .unwrap();
        assert_eq!(second, 1);
    }

    #[test]
    fn log_format_names() {
        assert_eq!(LogFormat::from_name("JSON").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_name("text").unwrap(), LogFormat::Text);
        assert!(matches!(
            LogFormat::from_name("xml"),
            Err(DaemonError::LogFormat(name)) if name == "xml"
        ));
    }
}
