//! Async driver for a [`SessionController`].
//!
//! The controller lives on a single tokio task. Local commands and remote
//! events arrive through one channel and are applied one at a time, in
//! arrival order, interleaved with ~1 Hz ticks. Ticks only run while a
//! session is active and unpaused; finishing the session or dropping every
//! [`SessionHandle`] stops them.
//!
//! The sync boundary's inbox is polled on its own interval, paused or not,
//! and again before every command, so a widget event is never applied
//! after a command that reached the runner later.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use super::controller::{SessionController, SessionPhase};
use crate::error::{CoreError, Result, SessionError};
use crate::events::Event;
use crate::sync::RemoteEvent;
use crate::timer::Ticker;
use crate::workout::{WorkoutPlan, WorkoutSession};

const COMMAND_BUFFER: usize = 64;
const EVENT_BUFFER: usize = 256;

type Reply<T> = oneshot::Sender<Result<T>>;

enum Command {
    Start(Box<WorkoutPlan>, Reply<Event>),
    Toggle(usize, usize, Reply<Option<Event>>),
    SkipRest(Reply<Option<Event>>),
    Pause(Reply<Option<Event>>),
    Resume(Reply<Option<Event>>),
    Finish(Reply<Event>),
    Remote(RemoteEvent),
    Snapshot(oneshot::Sender<Event>),
    TakeHistory(oneshot::Sender<Vec<WorkoutSession>>),
}

/// Cloneable front door to a running session task.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("closed", &self.commands.is_closed())
            .finish()
    }
}

pub struct SessionRunner {
    controller: SessionController,
    commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<Event>,
    ticker: Ticker,
    inbox: Ticker,
}

impl SessionRunner {
    /// Move `controller` onto its own task. The task hands the controller
    /// back once every handle is dropped.
    pub fn spawn(controller: SessionController, tick_period: Duration) -> (SessionHandle, JoinHandle<SessionController>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);
        let runner = SessionRunner {
            controller,
            commands: command_rx,
            events: event_tx.clone(),
            ticker: Ticker::new(tick_period),
            inbox: Ticker::new(tick_period),
        };
        let join = tokio::spawn(runner.run());
        (
            SessionHandle {
                commands: command_tx,
                events: event_tx,
            },
            join,
        )
    }

    async fn run(mut self) -> SessionController {
        self.sync_ticker();
        self.inbox.start();
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(command) => {
                        self.pump_remote();
                        self.apply(command);
                    }
                    None => break,
                },
                _ = self.ticker.tick() => self.on_tick(),
                _ = self.inbox.tick() => {
                    self.pump_remote();
                    self.sync_ticker();
                }
            }
        }
        self.ticker.stop();
        self.inbox.stop();
        tracing::debug!("session runner stopped");
        self.controller
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Start(plan, reply) => {
                let result = self.controller.start(&plan);
                self.reply(reply, result, |e| Some(e.clone()));
            }
            Command::Toggle(exercise, set, reply) => {
                let result = self.controller.toggle_set(exercise, set);
                self.reply(reply, result, |e| e.clone());
            }
            Command::SkipRest(reply) => {
                let result = self.controller.skip_rest();
                self.reply(reply, result, |e| e.clone());
            }
            Command::Pause(reply) => {
                let result = self.controller.pause();
                self.reply(reply, result, |e| e.clone());
            }
            Command::Resume(reply) => {
                let result = self.controller.resume();
                self.reply(reply, result, |e| e.clone());
            }
            Command::Finish(reply) => {
                let result = self.controller.finish();
                self.reply(reply, result, |e| Some(e.clone()));
            }
            Command::Remote(remote) => match self.controller.handle_remote(remote) {
                Ok(event) => self.emit_with_side_events(event),
                Err(e) => tracing::warn!(%remote, error = %e, "remote event rejected"),
            },
            Command::Snapshot(reply) => {
                let _ = reply.send(self.controller.snapshot());
            }
            Command::TakeHistory(reply) => {
                let _ = reply.send(self.controller.take_history());
            }
        }
        self.sync_ticker();
    }

    fn on_tick(&mut self) {
        self.pump_remote();
        let event = self.controller.tick();
        self.emit_with_side_events(event);
        self.sync_ticker();
        if self.ticker.is_running() {
            let tick = self.controller.tick_event();
            self.emit(tick);
        }
    }

    /// Apply whatever the sync boundary has queued.
    fn pump_remote(&mut self) {
        for event in self.controller.drain_remote() {
            self.emit(event);
        }
    }

    /// Run the ticker exactly while the session is live and unpaused.
    fn sync_ticker(&mut self) {
        let wants_ticks = matches!(self.controller.phase(), SessionPhase::Active | SessionPhase::Resting);
        match (wants_ticks, self.ticker.is_running()) {
            (true, false) => self.ticker.start(),
            (false, true) => self.ticker.stop(),
            _ => {}
        }
    }

    fn reply<T>(&mut self, reply: Reply<T>, result: Result<T>, event_of: impl Fn(&T) -> Option<Event>) {
        let event = result.as_ref().ok().and_then(event_of);
        self.emit_with_side_events(event);
        let _ = reply.send(result);
    }

    /// Emit events the controller raised on the way, then `event` itself.
    fn emit_with_side_events(&mut self, event: Option<Event>) {
        for side in self.controller.take_events() {
            self.emit(side);
        }
        if let Some(event) = event {
            self.emit(event);
        }
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl SessionHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn start(&self, plan: WorkoutPlan) -> Result<Event> {
        self.call(|reply| Command::Start(Box::new(plan), reply)).await
    }

    pub async fn toggle_set(&self, exercise_index: usize, set_index: usize) -> Result<Option<Event>> {
        self.call(|reply| Command::Toggle(exercise_index, set_index, reply)).await
    }

    pub async fn skip_rest(&self) -> Result<Option<Event>> {
        self.call(Command::SkipRest).await
    }

    pub async fn pause(&self) -> Result<Option<Event>> {
        self.call(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<Option<Event>> {
        self.call(Command::Resume).await
    }

    pub async fn finish(&self) -> Result<Event> {
        self.call(Command::Finish).await
    }

    /// Queue a remote event behind any commands already sent.
    pub async fn remote(&self, event: RemoteEvent) -> Result<()> {
        self.commands
            .send(Command::Remote(event))
            .await
            .map_err(|_| CoreError::from(SessionError::RunnerClosed))
    }

    pub async fn snapshot(&self) -> Result<Event> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx)).await?;
        rx.await.map_err(|_| SessionError::RunnerClosed.into())
    }

    pub async fn take_history(&self) -> Result<Vec<WorkoutSession>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::TakeHistory(tx)).await?;
        rx.await.map_err(|_| SessionError::RunnerClosed.into())
    }

    async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.send(make(tx)).await?;
        rx.await.map_err(|_| CoreError::from(SessionError::RunnerClosed))?
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::RunnerClosed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{MemoryBoundary, SyncPublisher};
    use crate::timer::{RestState, TokioTimeSource};
    use crate::workout::{ExerciseTemplate, RestTrigger};
    use std::sync::Arc;

    fn spawn() -> (SessionHandle, JoinHandle<SessionController>, MemoryBoundary) {
        spawn_every(Duration::from_secs(1))
    }

    fn spawn_every(period: Duration) -> (SessionHandle, JoinHandle<SessionController>, MemoryBoundary) {
        let surface = MemoryBoundary::new();
        let controller = SessionController::new(
            Arc::new(TokioTimeSource::new()),
            SyncPublisher::new(surface.clone()),
        );
        let (handle, join) = SessionRunner::spawn(controller, period);
        (handle, join, surface)
    }

    fn plan() -> WorkoutPlan {
        WorkoutPlan::new(
            "Runner",
            vec![ExerciseTemplate::new("Squat", 2, "5").with_rest(3, RestTrigger::AfterSet)],
        )
    }

    fn rest_of(event: &Event) -> Option<RestState> {
        match event {
            Event::StateSnapshot { rest, .. } => Some(*rest),
            _ => None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rest_runs_out_on_ticks() {
        let (handle, _join, _) = spawn();
        let mut events = handle.subscribe();
        handle.start(plan()).await.unwrap();
        handle.toggle_set(0, 0).await.unwrap();

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let rest = rest_of(&handle.snapshot().await.unwrap()).unwrap();
        assert_eq!(rest, RestState::default());

        let mut saw_end = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, Event::RestEnded { skipped: false, .. }) {
                saw_end = true;
            }
        }
        assert!(saw_end);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_rest_and_elapsed() {
        let (handle, _join, _) = spawn();
        handle.start(plan()).await.unwrap();
        handle.toggle_set(0, 0).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        handle.pause().await.unwrap();

        let before = handle.snapshot().await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        let after = handle.snapshot().await.unwrap();
        assert_eq!(rest_of(&before), rest_of(&after));
        match (before, after) {
            (
                Event::StateSnapshot { elapsed_secs: a, phase, .. },
                Event::StateSnapshot { elapsed_secs: b, .. },
            ) => {
                assert_eq!(a, b);
                assert_eq!(phase, SessionPhase::Paused);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_after_finish() {
        let (handle, _join, _) = spawn();
        handle.start(plan()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        handle.finish().await.unwrap();

        let mut events = handle.subscribe();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
        assert_eq!(handle.take_history().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn remote_events_are_serialized_with_local_ones() {
        let (handle, _join, surface) = spawn();
        handle.start(plan()).await.unwrap();
        handle.remote(RemoteEvent::MarkNextSet).await.unwrap();
        handle.remote(RemoteEvent::SkipRest).await.unwrap();
        handle.toggle_set(0, 1).await.unwrap();

        let snap = surface.last_published().unwrap();
        assert_eq!(snap.set_grid, vec![vec![true, true]]);
        assert!(snap.is_resting);
    }

    #[tokio::test(start_paused = true)]
    async fn surface_inbox_is_polled_on_tick() {
        let (handle, _join, surface) = spawn();
        handle.start(plan()).await.unwrap();
        surface.push_remote(RemoteEvent::MarkNextSet);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(surface.last_published().unwrap().progress_pct, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn surface_inbox_is_polled_while_paused() {
        let (handle, _join, surface) = spawn();
        handle.start(plan()).await.unwrap();
        handle.pause().await.unwrap();
        surface.push_remote(RemoteEvent::MarkNextSet);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(surface.last_published().unwrap().set_grid, vec![vec![true, false]]);

        handle.toggle_set(0, 0).await.unwrap();
        handle.resume().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(surface.last_published().unwrap().set_grid, vec![vec![false, false]]);
    }

    #[tokio::test(start_paused = true)]
    async fn queued_surface_events_precede_later_commands() {
        let (handle, _join, surface) = spawn();
        handle.start(plan()).await.unwrap();
        surface.push_remote(RemoteEvent::MarkNextSet);

        // The widget marked set 1 first, so this toggle unmarks it.
        let toggled = handle.toggle_set(0, 0).await.unwrap().unwrap();
        assert!(matches!(toggled, Event::SetToggled { completed: false, .. }));
        assert_eq!(surface.last_published().unwrap().set_grid, vec![vec![false, false]]);
    }

    #[tokio::test(start_paused = true)]
    async fn rest_ended_by_a_toggle_is_broadcast_first() {
        let (handle, _join, _) = spawn_every(Duration::from_secs(30));
        handle.start(plan()).await.unwrap();
        handle.toggle_set(0, 0).await.unwrap();
        let mut events = handle.subscribe();

        // No tick lands before the second toggle; it settles the 3 s rest.
        tokio::time::sleep(Duration::from_secs(5)).await;
        handle.toggle_set(0, 1).await.unwrap();

        assert!(matches!(
            events.try_recv().unwrap(),
            Event::RestEnded { exercise_index: Some(0), skipped: false, .. }
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            Event::SetToggled { set_number: 2, rest_started_secs: Some(3), .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handles_returns_controller() {
        let (handle, join, _) = spawn();
        handle.start(plan()).await.unwrap();
        drop(handle);
        let controller = join.await.unwrap();
        assert_eq!(controller.phase(), SessionPhase::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_reports_already_active() {
        let (handle, _join, _) = spawn();
        handle.start(plan()).await.unwrap();
        let err = handle.start(plan()).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Session(SessionError::SessionAlreadyActive { .. })
        ));
    }
}
