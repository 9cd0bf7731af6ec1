//! Workout session controller.
//!
//! Orchestrates the elapsed clock, the rest countdown and the set ledger for
//! the one active session on the device. Like the clocks it drives, it has
//! no thread of its own: the caller (the async runner, or the CLI) invokes
//! `tick()` periodically and forwards user and remote commands.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Active <--> Resting
//!                   |  ^         |  ^
//!              pause|  |resume   |  |
//!                   v  |         v  |
//!                  Paused (remembers which)
//! Active|Resting|Paused --finish--> Idle (session moved to history)
//! ```
//!
//! Every visible change is pushed to the sync boundary. Sync failures are
//! logged by [`SyncPublisher`] and never undo a transition.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::events::Event;
use crate::sync::{RemoteEvent, SyncPublisher, SyncSnapshot};
use crate::timer::{format_clock, ElapsedClock, RestState, RestTimer, TimeSource};
use crate::workout::{RestDefaults, WorkoutPlan, WorkoutSession};

/// Finished sessions kept in memory before the oldest are dropped.
pub const HISTORY_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Active,
    Resting,
    Paused,
}

/// Serializable part of the controller. Saved between CLI invocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerState {
    session: Option<WorkoutSession>,
    clock: ElapsedClock,
    rest: RestTimer,
    /// Instant up to which the rest countdown has been applied.
    #[serde(default)]
    rest_anchor: Option<DateTime<Utc>>,
}

impl ControllerState {
    pub fn session(&self) -> Option<&WorkoutSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }
}

pub struct SessionController {
    state: ControllerState,
    defaults: RestDefaults,
    time: Arc<dyn TimeSource>,
    sync: SyncPublisher,
    history: Vec<WorkoutSession>,
    side_events: Vec<Event>,
}

impl SessionController {
    pub fn new(time: Arc<dyn TimeSource>, sync: SyncPublisher) -> Self {
        Self::restore(ControllerState::default(), time, sync)
    }

    /// Rebuild a controller around previously saved state.
    pub fn restore(state: ControllerState, time: Arc<dyn TimeSource>, mut sync: SyncPublisher) -> Self {
        sync.init();
        Self {
            state,
            defaults: RestDefaults::default(),
            time,
            sync,
            history: Vec::new(),
            side_events: Vec::new(),
        }
    }

    pub fn with_rest_defaults(mut self, defaults: RestDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        if self.state.session.is_none() {
            SessionPhase::Idle
        } else if self.state.clock.is_paused() {
            SessionPhase::Paused
        } else if self.state.rest.is_resting() {
            SessionPhase::Resting
        } else {
            SessionPhase::Active
        }
    }

    pub fn session(&self) -> Option<&WorkoutSession> {
        self.state.session.as_ref()
    }

    pub fn rest(&self) -> RestState {
        self.state.rest.state()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.state.clock.elapsed_seconds(self.time.now())
    }

    pub fn completion_pct(&self) -> u8 {
        self.session().map(WorkoutSession::completion_pct).unwrap_or(0)
    }

    /// Sessions finished since the last [`take_history`](Self::take_history).
    ///
    /// At most [`HISTORY_LIMIT`] are held; a long-lived owner must drain
    /// them periodically or the oldest are dropped.
    pub fn history(&self) -> &[WorkoutSession] {
        &self.history
    }

    /// Hand finished sessions over to persistence.
    pub fn take_history(&mut self) -> Vec<WorkoutSession> {
        std::mem::take(&mut self.history)
    }

    /// Events raised while applying another command, oldest first. A rest
    /// that ran out before a toggle or pause ends there and is reported here.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.side_events)
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase(),
            elapsed_secs: self.elapsed_seconds(),
            rest: self.rest(),
            session: self.state.session.clone().map(Box::new),
            at: self.time.now(),
        }
    }

    pub fn tick_event(&self) -> Event {
        Event::Tick {
            elapsed_secs: self.elapsed_seconds(),
            rest: self.rest(),
            at: self.time.now(),
        }
    }

    /// What the mirror surface should show right now.
    pub fn sync_snapshot(&self) -> Option<SyncSnapshot> {
        let session = self.state.session.as_ref()?;
        let exercises = session.exercises();
        let current = session.current_exercise_index();
        let name_at = |i: usize| exercises.get(i).map(|e| e.name.clone());
        Some(SyncSnapshot {
            workout_name: session.workout_name.clone(),
            set_grid: session.ledger.status_grid(),
            progress_pct: session.completion_pct(),
            elapsed_display: format_clock(self.elapsed_seconds()),
            current_exercise: current.and_then(name_at).unwrap_or_default(),
            next_exercise: current.and_then(|i| name_at(i + 1)),
            rest_display: format_clock(u64::from(self.state.rest.remaining_secs())),
            is_resting: self.state.rest.is_resting(),
            is_paused: self.state.clock.is_paused(),
            updated_at: self.time.now(),
        })
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Materialize a session from `plan` and start the clock.
    ///
    /// # Errors
    /// [`SessionError::SessionAlreadyActive`] while another session runs, or
    /// a validation error for an unusable plan.
    pub fn start(&mut self, plan: &WorkoutPlan) -> Result<Event> {
        if let Some(active) = &self.state.session {
            return Err(SessionError::SessionAlreadyActive {
                workout_name: active.workout_name.clone(),
            }
            .into());
        }
        plan.validate()?;

        let now = self.time.now();
        let session = WorkoutSession::from_plan(plan, &self.defaults, now);
        let event = Event::SessionStarted {
            session_id: session.id.clone(),
            workout_name: session.workout_name.clone(),
            total_sets: session.ledger.total_sets(),
            at: now,
        };
        tracing::info!(workout = %session.workout_name, session_id = %session.id, "workout session started");

        self.state = ControllerState::default();
        self.state.clock.start(now);
        self.state.session = Some(session);
        self.publish();
        Ok(event)
    }

    /// Flip a set and start a rest if the exercise's trigger fires.
    ///
    /// Out-of-range coordinates are logged and ignored (`Ok(None)`).
    ///
    /// # Errors
    /// [`SessionError::NoActiveSession`] when idle.
    pub fn toggle_set(&mut self, exercise_index: usize, set_index: usize) -> Result<Option<Event>> {
        let now = self.time.now();
        let session = self.state.session.as_mut().ok_or(SessionError::NoActiveSession)?;

        let toggle = match session.ledger.toggle(exercise_index, set_index, now) {
            Ok(toggle) => toggle,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring toggle of unknown set");
                return Ok(None);
            }
        };
        let Some(exercise) = session.ledger.exercise(exercise_index) else {
            return Ok(None);
        };
        let exercise_name = exercise.name.clone();
        let (rest_seconds, trigger) = (exercise.rest_seconds, exercise.rest_trigger);
        let completion_pct = session.completion_pct();

        let mut rest_started_secs = None;
        if toggle.completed && trigger.fires(toggle.set_number, toggle.total_sets) {
            self.settle_rest(now);
            if self.state.rest.begin(rest_seconds, exercise_index) {
                rest_started_secs = Some(rest_seconds);
                self.state.rest_anchor = (!self.state.clock.is_paused()).then_some(now);
            }
        }

        tracing::debug!(
            exercise = %exercise_name,
            set = toggle.set_number,
            completed = toggle.completed,
            completion_pct,
            rest = ?rest_started_secs,
            "set toggled"
        );
        self.publish();
        Ok(Some(Event::SetToggled {
            exercise_index,
            exercise_name,
            set_number: toggle.set_number,
            completed: toggle.completed,
            duration_secs: toggle.duration_secs,
            completion_pct,
            rest_started_secs,
            at: now,
        }))
    }

    /// Cancel the running rest. A no-op (`Ok(None)`) when not resting.
    ///
    /// # Errors
    /// [`SessionError::NoActiveSession`] when idle.
    pub fn skip_rest(&mut self) -> Result<Option<Event>> {
        self.require_session()?;
        let exercise_index = self.state.rest.state().exercise_index;
        if !self.state.rest.skip() {
            return Ok(None);
        }
        self.state.rest_anchor = None;
        self.publish();
        Ok(Some(Event::RestEnded {
            exercise_index,
            skipped: true,
            at: self.time.now(),
        }))
    }

    /// Freeze the elapsed clock and any rest countdown.
    ///
    /// # Errors
    /// [`SessionError::NoActiveSession`] when idle.
    pub fn pause(&mut self) -> Result<Option<Event>> {
        self.require_session()?;
        let now = self.time.now();
        self.settle_rest(now);
        if !self.state.clock.pause(now) {
            return Ok(None);
        }
        self.state.rest_anchor = None;
        self.publish();
        Ok(Some(Event::SessionPaused {
            elapsed_secs: self.state.clock.elapsed_seconds(now),
            rest_remaining_secs: self.state.rest.remaining_secs(),
            at: now,
        }))
    }

    /// Unfreeze, returning to whichever of Active/Resting was paused.
    ///
    /// # Errors
    /// [`SessionError::NoActiveSession`] when idle.
    pub fn resume(&mut self) -> Result<Option<Event>> {
        self.require_session()?;
        let now = self.time.now();
        if !self.state.clock.resume(now) {
            return Ok(None);
        }
        if self.state.rest.is_resting() {
            self.state.rest_anchor = Some(now);
        }
        self.publish();
        Ok(Some(Event::SessionResumed {
            elapsed_secs: self.state.clock.elapsed_seconds(now),
            rest_remaining_secs: self.state.rest.remaining_secs(),
            at: now,
        }))
    }

    /// Apply the seconds elapsed since the last tick to the rest countdown
    /// and refresh the mirror. Returns `RestEnded` when the rest runs out.
    pub fn tick(&mut self) -> Option<Event> {
        match self.phase() {
            SessionPhase::Idle | SessionPhase::Paused => None,
            SessionPhase::Active | SessionPhase::Resting => {
                let now = self.time.now();
                let exercise_index = self.state.rest.state().exercise_index;
                let ended = self.flush_rest(now);
                self.publish();
                ended.then(|| Event::RestEnded {
                    exercise_index,
                    skipped: false,
                    at: now,
                })
            }
        }
    }

    /// Apply a remote event exactly like its local counterpart.
    ///
    /// `MARK_NEXT_SET` completes the first incomplete set of the first
    /// exercise that still has one, not necessarily the set on screen.
    pub fn handle_remote(&mut self, event: RemoteEvent) -> Result<Option<Event>> {
        if self.state.session.is_none() {
            tracing::debug!(%event, "remote event without an active session");
            return Ok(None);
        }
        match event {
            RemoteEvent::MarkNextSet => {
                let next = self.state.session.as_ref().and_then(|s| s.ledger.first_incomplete());
                match next {
                    Some((exercise_index, set_index)) => self.toggle_set(exercise_index, set_index),
                    None => {
                        tracing::debug!("remote mark-next-set with every set complete");
                        Ok(None)
                    }
                }
            }
            RemoteEvent::SkipRest => self.skip_rest(),
        }
    }

    /// Pull queued remote events from the boundary and apply them in order.
    /// Side events are returned in place, ahead of the event that caused them.
    pub fn drain_remote(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        for remote in self.sync.poll_remote() {
            let result = self.handle_remote(remote);
            events.append(&mut self.side_events);
            match result {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => tracing::warn!(%remote, error = %e, "remote event rejected"),
            }
        }
        events
    }

    /// Complete the session, tear down both timers, move it to history and
    /// clear the mirror. The controller is Idle afterwards. See
    /// [`history`](Self::history) for how long finished sessions are kept.
    ///
    /// # Errors
    /// [`SessionError::NoActiveSession`] when idle.
    pub fn finish(&mut self) -> Result<Event> {
        let now = self.time.now();
        let mut state = std::mem::take(&mut self.state);
        let Some(mut session) = state.session.take() else {
            return Err(SessionError::NoActiveSession.into());
        };

        state.rest.skip();
        state.clock.stop(now);
        let elapsed_secs = state.clock.elapsed_seconds(now);

        session.completed = true;
        session.finished_at = Some(now);
        session.active_secs = Some(elapsed_secs);

        let event = Event::SessionFinished {
            session_id: session.id.clone(),
            workout_name: session.workout_name.clone(),
            completion_pct: session.completion_pct(),
            completed_sets: session.ledger.completed_sets(),
            total_sets: session.ledger.total_sets(),
            elapsed_secs,
            at: now,
        };
        tracing::info!(
            workout = %session.workout_name,
            completion_pct = session.completion_pct(),
            elapsed_secs,
            "workout session finished"
        );

        if self.history.len() >= HISTORY_LIMIT {
            let dropped = self.history.remove(0);
            tracing::warn!(
                session_id = %dropped.id,
                limit = HISTORY_LIMIT,
                "finished sessions were never taken; dropping the oldest"
            );
        }
        self.history.push(session);
        self.sync.clear();
        Ok(event)
    }

    /// Release the sync surface.
    pub fn shutdown(mut self) -> ControllerState {
        self.sync.teardown();
        self.state
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn require_session(&self) -> Result<(), SessionError> {
        if self.state.session.is_none() {
            return Err(SessionError::NoActiveSession);
        }
        Ok(())
    }

    /// Bring the countdown up to `now` before a command changes the rest,
    /// queueing `RestEnded` if it ran out in the meantime.
    fn settle_rest(&mut self, now: DateTime<Utc>) {
        let exercise_index = self.state.rest.state().exercise_index;
        if self.flush_rest(now) {
            self.side_events.push(Event::RestEnded {
                exercise_index,
                skipped: false,
                at: now,
            });
        }
    }

    /// Apply whole elapsed seconds to the rest countdown. Returns `true`
    /// when the countdown reached zero.
    fn flush_rest(&mut self, now: DateTime<Utc>) -> bool {
        let Some(anchor) = self.state.rest_anchor else {
            return false;
        };
        if !self.state.rest.is_resting() {
            self.state.rest_anchor = None;
            return false;
        }
        let secs = (now - anchor).num_seconds();
        if secs <= 0 {
            return false;
        }
        self.state.rest_anchor = Some(anchor + Duration::seconds(secs));
        let ended = self.state.rest.advance(secs as u64);
        if ended {
            self.state.rest_anchor = None;
        }
        ended
    }

    fn publish(&mut self) {
        if let Some(snapshot) = self.sync_snapshot() {
            self.sync.publish(&snapshot);
        }
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("phase", &self.phase())
            .field("state", &self.state)
            .field("sync", &self.sync)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::sync::MemoryBoundary;
    use crate::timer::ManualTimeSource;
    use crate::workout::{ExerciseTemplate, RestTrigger};

    fn rig() -> (SessionController, Arc<ManualTimeSource>, MemoryBoundary) {
        let time = Arc::new(ManualTimeSource::default());
        let surface = MemoryBoundary::new();
        let controller = SessionController::new(time.clone(), SyncPublisher::new(surface.clone()));
        (controller, time, surface)
    }

    fn plan(trigger: RestTrigger) -> WorkoutPlan {
        WorkoutPlan::new(
            "Test",
            vec![ExerciseTemplate::new("Press", 3, "10").with_rest(60, trigger)],
        )
    }

    #[test]
    fn idle_commands_fail_or_noop() {
        let (mut c, _, _) = rig();
        assert_eq!(c.phase(), SessionPhase::Idle);
        assert!(matches!(
            c.toggle_set(0, 0),
            Err(CoreError::Session(SessionError::NoActiveSession))
        ));
        assert!(c.finish().is_err());
        assert!(c.tick().is_none());
        assert_eq!(c.handle_remote(RemoteEvent::MarkNextSet).unwrap(), None);
    }

    #[test]
    fn second_start_is_rejected() {
        let (mut c, _, _) = rig();
        c.start(&plan(RestTrigger::AfterSet)).unwrap();
        let err = c.start(&plan(RestTrigger::AfterSet)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Session(SessionError::SessionAlreadyActive { .. })
        ));
        assert_eq!(c.phase(), SessionPhase::Active);
    }

    #[test]
    fn invalid_plan_is_rejected() {
        let (mut c, _, _) = rig();
        assert!(matches!(
            c.start(&WorkoutPlan::new("Empty", vec![])),
            Err(CoreError::Validation(_))
        ));
        assert_eq!(c.phase(), SessionPhase::Idle);
    }

    #[test]
    fn out_of_range_toggle_is_a_logged_noop() {
        let (mut c, _, surface) = rig();
        c.start(&plan(RestTrigger::AfterSet)).unwrap();
        let published = surface.publish_count();
        assert_eq!(c.toggle_set(0, 9).unwrap(), None);
        assert_eq!(c.toggle_set(4, 0).unwrap(), None);
        assert_eq!(c.completion_pct(), 0);
        assert_eq!(surface.publish_count(), published);
    }

    #[test]
    fn unmarking_does_not_start_rest() {
        let (mut c, _, _) = rig();
        c.start(&plan(RestTrigger::AfterSet)).unwrap();
        c.toggle_set(0, 0).unwrap();
        c.skip_rest().unwrap();
        let event = c.toggle_set(0, 0).unwrap().unwrap();
        assert!(matches!(event, Event::SetToggled { completed: false, rest_started_secs: None, .. }));
        assert_eq!(c.phase(), SessionPhase::Active);
    }

    #[test]
    fn rest_counts_down_with_ticks() {
        let (mut c, time, _) = rig();
        c.start(&plan(RestTrigger::AfterSet)).unwrap();
        c.toggle_set(0, 0).unwrap();
        assert_eq!(c.phase(), SessionPhase::Resting);

        time.advance_secs(1);
        assert!(c.tick().is_none());
        assert_eq!(c.rest().remaining_secs, 59);

        time.advance_secs(59);
        assert!(matches!(c.tick(), Some(Event::RestEnded { skipped: false, .. })));
        assert_eq!(c.phase(), SessionPhase::Active);
        assert_eq!(c.rest(), RestState::default());
    }

    #[test]
    fn sub_second_ticks_carry_over() {
        let (mut c, time, _) = rig();
        c.start(&plan(RestTrigger::AfterSet)).unwrap();
        c.toggle_set(0, 0).unwrap();
        for _ in 0..4 {
            time.advance(Duration::milliseconds(500));
            c.tick();
        }
        assert_eq!(c.rest().remaining_secs, 58);
    }

    #[test]
    fn resume_restores_previous_sub_state() {
        let (mut c, time, _) = rig();
        c.start(&plan(RestTrigger::AfterSet)).unwrap();
        c.pause().unwrap();
        assert_eq!(c.phase(), SessionPhase::Paused);
        assert_eq!(c.pause().unwrap(), None);
        c.resume().unwrap();
        assert_eq!(c.phase(), SessionPhase::Active);

        c.toggle_set(0, 0).unwrap();
        c.pause().unwrap();
        time.advance_secs(120);
        assert!(c.tick().is_none());
        c.resume().unwrap();
        assert_eq!(c.phase(), SessionPhase::Resting);
        assert_eq!(c.rest().remaining_secs, 60);
        assert_eq!(c.resume().unwrap(), None);
    }

    #[test]
    fn toggle_while_paused_starts_a_frozen_rest() {
        let (mut c, time, _) = rig();
        c.start(&plan(RestTrigger::AfterSet)).unwrap();
        c.pause().unwrap();
        c.toggle_set(0, 0).unwrap();
        time.advance_secs(30);
        c.tick();
        assert_eq!(c.phase(), SessionPhase::Paused);
        assert_eq!(c.rest().remaining_secs, 60);
        c.resume().unwrap();
        time.advance_secs(10);
        c.tick();
        assert_eq!(c.rest().remaining_secs, 50);
    }

    #[test]
    fn new_trigger_restarts_rest() {
        let (mut c, time, _) = rig();
        c.start(&plan(RestTrigger::AfterSet)).unwrap();
        c.toggle_set(0, 0).unwrap();
        time.advance_secs(50);
        c.toggle_set(0, 1).unwrap();
        assert_eq!(c.rest().remaining_secs, 60);
        time.advance_secs(5);
        c.tick();
        assert_eq!(c.rest().remaining_secs, 55);
    }

    #[test]
    fn remote_mark_next_targets_first_incomplete() {
        let (mut c, _, surface) = rig();
        let plan = WorkoutPlan::new(
            "Two",
            vec![
                ExerciseTemplate::new("A", 2, "5").with_rest(0, RestTrigger::AfterSet),
                ExerciseTemplate::new("B", 1, "5"),
            ],
        );
        c.start(&plan).unwrap();
        c.toggle_set(1, 0).unwrap();
        c.skip_rest().unwrap();

        surface.push_remote(RemoteEvent::MarkNextSet);
        surface.push_remote(RemoteEvent::MarkNextSet);
        let events = c.drain_remote();
        assert_eq!(events.len(), 2);
        assert_eq!(c.session().unwrap().ledger.first_incomplete(), None);
        assert_eq!(c.handle_remote(RemoteEvent::MarkNextSet).unwrap(), None);
    }

    #[test]
    fn sync_snapshot_reflects_session() {
        let (mut c, time, surface) = rig();
        let plan = WorkoutPlan::new(
            "Upper",
            vec![
                ExerciseTemplate::new("Bench", 1, "5"),
                ExerciseTemplate::new("Row", 1, "5"),
            ],
        );
        c.start(&plan).unwrap();
        time.advance_secs(65);
        c.toggle_set(0, 0).unwrap();

        let snap = surface.last_published().unwrap();
        assert_eq!(snap.workout_name, "Upper");
        assert_eq!(snap.set_grid, vec![vec![true], vec![false]]);
        assert_eq!(snap.progress_pct, 50);
        assert_eq!(snap.elapsed_display, "01:05");
        assert_eq!(snap.current_exercise, "Row");
        assert_eq!(snap.next_exercise, None);
        assert_eq!(snap.rest_display, "01:30");
        assert!(snap.is_resting);
    }

    #[test]
    fn sync_failure_never_rolls_back() {
        let (mut c, _, surface) = rig();
        surface.set_unavailable(true);
        c.start(&plan(RestTrigger::AfterSet)).unwrap();
        c.toggle_set(0, 0).unwrap();
        assert_eq!(c.completion_pct(), 33);
        assert!(c.rest().is_resting);
        c.finish().unwrap();
        assert_eq!(c.history().len(), 1);
    }

    #[test]
    fn finish_tears_down_and_archives() {
        let (mut c, time, surface) = rig();
        c.start(&plan(RestTrigger::AfterSet)).unwrap();
        time.advance_secs(10);
        c.toggle_set(0, 0).unwrap();
        time.advance_secs(5);
        let event = c.finish().unwrap();
        assert!(matches!(
            event,
            Event::SessionFinished { elapsed_secs: 15, completed_sets: 1, total_sets: 3, .. }
        ));
        assert_eq!(c.phase(), SessionPhase::Idle);
        assert_eq!(c.rest(), RestState::default());
        assert_eq!(surface.clear_count(), 1);

        let finished = c.take_history();
        assert_eq!(finished.len(), 1);
        assert!(finished[0].completed);
        assert_eq!(finished[0].active_secs, Some(15));
        assert!(c.history().is_empty());

        c.start(&plan(RestTrigger::AfterSet)).unwrap();
    }

    #[test]
    fn toggle_reports_a_rest_that_ran_out_between_ticks() {
        let (mut c, time, _) = rig();
        c.start(&plan(RestTrigger::AfterSet)).unwrap();
        c.toggle_set(0, 0).unwrap();
        assert!(c.take_events().is_empty());

        time.advance_secs(70);
        let toggled = c.toggle_set(0, 1).unwrap().unwrap();
        assert!(matches!(toggled, Event::SetToggled { rest_started_secs: Some(60), .. }));
        let side = c.take_events();
        assert_eq!(side.len(), 1);
        assert!(matches!(
            side[0],
            Event::RestEnded { exercise_index: Some(0), skipped: false, .. }
        ));
        assert!(c.take_events().is_empty());
    }

    #[test]
    fn pause_reports_a_rest_that_ran_out_between_ticks() {
        let (mut c, time, _) = rig();
        c.start(&plan(RestTrigger::AfterSet)).unwrap();
        c.toggle_set(0, 0).unwrap();
        time.advance_secs(61);
        assert!(matches!(c.pause().unwrap(), Some(Event::SessionPaused { rest_remaining_secs: 0, .. })));
        assert!(matches!(c.take_events().as_slice(), [Event::RestEnded { skipped: false, .. }]));

        // Pausing mid-rest ends nothing.
        c.resume().unwrap();
        c.toggle_set(0, 1).unwrap();
        time.advance_secs(30);
        c.pause().unwrap();
        assert!(c.take_events().is_empty());
        assert_eq!(c.rest().remaining_secs, 30);
    }

    #[test]
    fn remote_drain_interleaves_side_events() {
        let (mut c, time, surface) = rig();
        c.start(&plan(RestTrigger::AfterSet)).unwrap();
        c.toggle_set(0, 0).unwrap();
        time.advance_secs(90);
        surface.push_remote(RemoteEvent::MarkNextSet);

        let events = c.drain_remote();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::RestEnded { skipped: false, .. }));
        assert!(matches!(events[1], Event::SetToggled { set_number: 2, .. }));
        assert!(c.take_events().is_empty());
    }

    #[test]
    fn history_keeps_the_newest_sessions() {
        let (mut c, _, _) = rig();
        let mut first_id = None;
        for _ in 0..=HISTORY_LIMIT {
            c.start(&plan(RestTrigger::AfterSet)).unwrap();
            if let Event::SessionFinished { session_id, .. } = c.finish().unwrap() {
                first_id.get_or_insert(session_id);
            }
        }
        assert_eq!(c.history().len(), HISTORY_LIMIT);
        assert!(c.history().iter().all(|s| Some(&s.id) != first_id.as_ref()));

        assert_eq!(c.take_history().len(), HISTORY_LIMIT);
        c.start(&plan(RestTrigger::AfterSet)).unwrap();
        c.finish().unwrap();
        assert_eq!(c.history().len(), 1);
    }

    #[test]
    fn state_survives_serialization() {
        let (mut c, time, _) = rig();
        c.start(&plan(RestTrigger::AfterSet)).unwrap();
        c.toggle_set(0, 0).unwrap();
        let json = serde_json::to_string(c.state()).unwrap();

        let restored: ControllerState = serde_json::from_str(&json).unwrap();
        let mut c2 = SessionController::restore(restored, time.clone(), SyncPublisher::disabled());
        time.advance_secs(20);
        c2.tick();
        assert_eq!(c2.phase(), SessionPhase::Resting);
        assert_eq!(c2.rest().remaining_secs, 40);
        assert_eq!(c2.completion_pct(), 33);
    }
}
