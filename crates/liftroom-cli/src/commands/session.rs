use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use tokio::sync::broadcast::error::RecvError;

use super::{print_json, CliResult};
use liftroom_core::storage::data_dir;
use liftroom_core::{
    Config, ControllerState, FileBoundary, RemoteEvent, SessionController, SessionRunner,
    SyncPublisher, SystemTimeSource, WorkoutStore,
};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a session from a saved plan
    Start {
        /// Plan ID or name
        plan: String,
    },
    /// Mark or unmark a set (both numbers start at 1)
    Toggle {
        /// Exercise number
        exercise: usize,
        /// Set number
        set: usize,
    },
    /// Complete the first pending set, as the widget button does
    MarkNext,
    /// End the running rest early
    SkipRest,
    /// Freeze the session clock and rest countdown
    Pause,
    /// Continue a paused session
    Resume,
    /// Print current session state as JSON
    Status,
    /// Finish the session and move it to history
    Finish,
    /// Apply events queued by the widget
    Sync,
    /// Queue an event in the widget inbox (MARK_NEXT_SET or SKIP_REST)
    Remote {
        event: RemoteEvent,
    },
    /// Run the session live, printing one JSON event per line
    Watch {
        /// Stop after this many seconds (default: until Ctrl-C)
        #[arg(long)]
        seconds: Option<u64>,
    },
}

fn file_boundary(config: &Config) -> CliResult<FileBoundary> {
    let dir = data_dir()?;
    Ok(FileBoundary::new(
        Config::sync_path(&dir, &config.sync.surface_file),
        Config::sync_path(&dir, &config.sync.inbox_file),
    ))
}

fn load_controller(config: &Config, store: &WorkoutStore) -> CliResult<SessionController> {
    let state = store.load_active().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "discarding unreadable session state");
        ControllerState::default()
    });
    let sync = if config.sync.enabled {
        SyncPublisher::new(file_boundary(config)?)
    } else {
        SyncPublisher::disabled()
    };
    let mut controller = SessionController::restore(state, Arc::new(SystemTimeSource), sync)
        .with_rest_defaults(config.rest_defaults());

    // Catch up on whatever happened since the last invocation.
    if let Some(event) = controller.tick() {
        tracing::debug!(?event, "caught up");
    }
    Ok(controller)
}

fn save_controller(store: &WorkoutStore, mut controller: SessionController) -> CliResult {
    for event in controller.take_events() {
        tracing::info!(?event, "session event");
    }
    store.append_history(&controller.take_history())?;
    let state = controller.shutdown();
    store.save_active(&state)?;
    Ok(())
}

fn one_based(n: usize, what: &str) -> CliResult<usize> {
    n.checked_sub(1)
        .ok_or_else(|| format!("{what} numbers start at 1").into())
}

pub fn run(action: SessionAction) -> CliResult {
    let config = Config::load_or_default();

    if let SessionAction::Remote { event } = action {
        // Widget side: only touches the inbox.
        file_boundary(&config)?.send_remote(event)?;
        return print_json(&serde_json::json!({ "queued": event }));
    }

    let store = WorkoutStore::open()?;
    let mut controller = load_controller(&config, &store)?;

    let output = match action {
        SessionAction::Start { plan } => {
            let plan = store.find_plan(&plan)?;
            serde_json::to_value(controller.start(&plan)?)?
        }
        SessionAction::Toggle { exercise, set } => {
            let event = controller.toggle_set(one_based(exercise, "exercise")?, one_based(set, "set")?)?;
            serde_json::to_value(event.unwrap_or_else(|| controller.snapshot()))?
        }
        SessionAction::MarkNext => {
            let event = controller.handle_remote(RemoteEvent::MarkNextSet)?;
            serde_json::to_value(event.unwrap_or_else(|| controller.snapshot()))?
        }
        SessionAction::SkipRest => {
            let event = controller.skip_rest()?;
            serde_json::to_value(event.unwrap_or_else(|| controller.snapshot()))?
        }
        SessionAction::Pause => {
            let event = controller.pause()?;
            serde_json::to_value(event.unwrap_or_else(|| controller.snapshot()))?
        }
        SessionAction::Resume => {
            let event = controller.resume()?;
            serde_json::to_value(event.unwrap_or_else(|| controller.snapshot()))?
        }
        SessionAction::Status => serde_json::to_value(controller.snapshot())?,
        SessionAction::Finish => serde_json::to_value(controller.finish()?)?,
        SessionAction::Sync => serde_json::to_value(controller.drain_remote())?,
        SessionAction::Watch { seconds } => {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
            let (returned, last) = runtime.block_on(watch(controller, &config, seconds))?;
            controller = returned;
            last
        }
        SessionAction::Remote { .. } => serde_json::Value::Null,
    };

    save_controller(&store, controller)?;
    print_json(&output)
}

/// Hand the controller to a runner until the deadline or Ctrl-C, streaming
/// its events. Returns the controller and a final snapshot.
async fn watch(
    controller: SessionController,
    config: &Config,
    seconds: Option<u64>,
) -> CliResult<(SessionController, serde_json::Value)> {
    let period = Duration::from_millis(config.ticker.interval_ms);
    let (handle, join) = SessionRunner::spawn(controller, period);
    let mut events = handle.subscribe();
    let deadline = seconds.map(|s| tokio::time::Instant::now() + Duration::from_secs(s));

    loop {
        let until_deadline = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = until_deadline => break,
            received = events.recv() => match received {
                Ok(event) => println!("{}", serde_json::to_string(&event)?),
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "watch output fell behind"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    let last = serde_json::to_value(handle.snapshot().await?)?;
    drop(events);
    drop(handle);
    let controller = join.await?;
    Ok((controller, last))
}
