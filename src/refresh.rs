//! Refresh lifecycle: one park selection, a periodic timer, and the
//! fetches they trigger.
//!
//! All state transitions go through [`reduce`], a synchronous
//! reducer over [`RefreshSession`] that returns effects for the async
//! driver to execute. Fetch results are fenced by a request generation:
//! only the most recently issued fetch may update the display, so a late
//! response for a superseded request (or the previous park) is dropped.
//! There is no guarantee the underlying transport request is aborted,
//! only that its result is ignored.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use crate::fetch::{self, FetchError};
use crate::model::ride::Area;
use crate::pipeline;
use crate::state::{AppState, DisplaySnapshot, Phase};

// ── Session state ───────────────────────────────────────────────────

/// Process-wide refresh state for the selected park.
#[derive(Debug, Clone)]
pub struct RefreshSession {
    pub park_id: u32,
    pub phase: Phase,
    pub visible: bool,
    pub timer_running: bool,
    /// Latest successfully displayed areas. Cleared on failure — the
    /// renderer shows an explicit error view, not stale data.
    pub areas: Vec<Area>,
    pub last_success: Option<DateTime<Utc>>,
    pub error_detail: Option<String>,
    next_generation: u64,
    in_flight: Option<InFlightFetch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlightFetch {
    generation: u64,
    park_id: u32,
}

impl RefreshSession {
    pub fn new(park_id: u32) -> Self {
        Self {
            park_id,
            phase: Phase::Idle,
            visible: true,
            timer_running: false,
            areas: Vec::new(),
            last_success: None,
            error_detail: None,
            next_generation: 0,
            in_flight: None,
        }
    }

    /// Valid response with zero rides: a distinct "no data" display
    /// condition, never a failure.
    pub fn is_empty_data(&self) -> bool {
        self.phase == Phase::Success && self.areas.is_empty()
    }

    /// Issue a new fetch for the current park, superseding any in-flight
    /// request (its generation no longer matches, so its result is
    /// dropped on arrival).
    fn begin_fetch(&mut self) -> Effect {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.in_flight = Some(InFlightFetch {
            generation,
            park_id: self.park_id,
        });
        self.phase = Phase::Loading;
        Effect::BeginFetch {
            park_id: self.park_id,
            generation,
        }
    }
}

// ── Events and effects ──────────────────────────────────────────────

/// Everything that can drive the refresh state machine.
#[derive(Debug)]
pub enum RefreshEvent {
    Startup,
    ParkSwitched(u32),
    ManualRefresh,
    TimerFired,
    VisibilityChanged(bool),
    FetchFinished {
        generation: u64,
        result: Result<Vec<Area>, FetchError>,
    },
}

/// Side effects the reducer asks the driver to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    BeginFetch { park_id: u32, generation: u64 },
    StartTimer,
    StopTimer,
}

// ── Reducer ─────────────────────────────────────────────────────────

/// Apply one event to the session, returning effects for the driver.
/// Pure in everything except the `last_success` timestamp.
pub fn reduce(session: &mut RefreshSession, event: RefreshEvent) -> Vec<Effect> {
    match event {
        RefreshEvent::Startup => {
            session.visible = true;
            session.timer_running = true;
            vec![session.begin_fetch(), Effect::StartTimer]
        }
        RefreshEvent::ParkSwitched(park_id) => {
            if park_id == session.park_id {
                return Vec::new();
            }
            // Supersedes any in-flight fetch for the previous park.
            session.park_id = park_id;
            vec![session.begin_fetch()]
        }
        RefreshEvent::ManualRefresh => {
            // Manual requests bypass the in-flight guard: the user asked
            // for a retry, so the new fetch supersedes the old one.
            vec![session.begin_fetch()]
        }
        RefreshEvent::TimerFired => {
            if !session.visible || session.in_flight.is_some() {
                return Vec::new();
            }
            vec![session.begin_fetch()]
        }
        RefreshEvent::VisibilityChanged(visible) => {
            if visible == session.visible {
                return Vec::new();
            }
            session.visible = visible;
            if visible {
                session.timer_running = true;
                vec![session.begin_fetch(), Effect::StartTimer]
            } else {
                // Hidden: stop the timer and discard any in-flight
                // request so a late response cannot land.
                session.timer_running = false;
                session.in_flight = None;
                if session.phase == Phase::Loading {
                    session.phase = Phase::Idle;
                }
                vec![Effect::StopTimer]
            }
        }
        RefreshEvent::FetchFinished { generation, result } => {
            let current = match session.in_flight {
                Some(in_flight) if in_flight.generation == generation => in_flight,
                // Superseded or cancelled: result is ignored.
                _ => return Vec::new(),
            };
            debug_assert_eq!(current.park_id, session.park_id);
            session.in_flight = None;
            match result {
                Ok(areas) => {
                    session.areas = areas;
                    session.phase = Phase::Success;
                    session.last_success = Some(Utc::now());
                    session.error_detail = None;
                }
                Err(e) => {
                    session.areas.clear();
                    session.phase = Phase::Failed;
                    session.error_detail = Some(e.to_string());
                }
            }
            Vec::new()
        }
    }
}

// ── Driver ──────────────────────────────────────────────────────────

/// Drive the state machine: owns the interval timer, executes effects,
/// and pushes a [`DisplaySnapshot`] to the renderer after every event.
///
/// Runs until the inbound event channel closes or the renderer stops
/// listening.
pub async fn run_driver(
    state: Arc<AppState>,
    mut events: mpsc::Receiver<RefreshEvent>,
    snapshots: mpsc::Sender<DisplaySnapshot>,
) {
    let (finished_tx, mut finished_rx) = mpsc::channel::<RefreshEvent>(16);
    let mut ticker = new_ticker(&state);

    loop {
        let timer_running = state.with_session(|s| s.timer_running);
        let event = tokio::select! {
            _ = ticker.tick(), if timer_running => RefreshEvent::TimerFired,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
            event = finished_rx.recv() => match event {
                Some(event) => event,
                // finished_tx lives in this scope; the channel cannot close
                None => break,
            },
        };

        let effects = state.with_session_mut(|session| reduce(session, event));
        for effect in effects {
            match effect {
                Effect::BeginFetch { park_id, generation } => {
                    spawn_fetch(&state, &finished_tx, park_id, generation);
                }
                Effect::StartTimer => ticker = new_ticker(&state),
                // The select guard already skips tick polling.
                Effect::StopTimer => {}
            }
        }

        let snapshot = state.with_session(DisplaySnapshot::from_session);
        if snapshots.send(snapshot).await.is_err() {
            break;
        }
    }
}

/// Interval whose first tick is one full period away (startup and
/// visibility changes issue their own immediate fetch).
fn new_ticker(state: &AppState) -> time::Interval {
    let period = Duration::from_secs(state.with_settings(|s| s.refresh_interval_secs).max(1));
    let mut ticker = time::interval_at(time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Fetch + pipeline on a background task, reporting back as an event.
fn spawn_fetch(
    state: &Arc<AppState>,
    finished: &mpsc::Sender<RefreshEvent>,
    park_id: u32,
    generation: u64,
) {
    let state = Arc::clone(state);
    let finished = finished.clone();
    tokio::spawn(async move {
        let settings = state.with_settings(Clone::clone);
        let result = fetch::fetch_payload(&state.client, &settings, park_id)
            .await
            .map(|payload| pipeline::run(&payload, &settings.overrides_for(park_id)));
        if let Err(e) = &result {
            eprintln!("[ParkPulse] fetch for park {park_id} failed: {e}");
        }
        let _ = finished
            .send(RefreshEvent::FetchFinished { generation, result })
            .await;
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::model::ride::Ride;

    fn area(name: &str) -> Area {
        Area {
            name: name.to_string(),
            color: None,
            rides: vec![Ride {
                id: "1".to_string(),
                name: "X".to_string(),
                wait_minutes: Some(5),
                is_open: true,
                single_rider: false,
                area_name: name.to_string(),
                area_color: None,
                last_updated: None,
            }],
        }
    }

    /// Extract the generation of the single BeginFetch effect.
    fn fetch_generation(effects: &[Effect]) -> u64 {
        match effects
            .iter()
            .find(|e| matches!(e, Effect::BeginFetch { .. }))
            .expect("expected a BeginFetch effect")
        {
            Effect::BeginFetch { generation, .. } => *generation,
            _ => unreachable!(),
        }
    }

    #[test]
    fn startup_fetches_and_starts_the_timer() {
        let mut session = RefreshSession::new(334);
        let effects = reduce(&mut session, RefreshEvent::Startup);
        assert!(matches!(effects[0], Effect::BeginFetch { park_id: 334, .. }));
        assert_eq!(effects[1], Effect::StartTimer);
        assert_eq!(session.phase, Phase::Loading);
        assert!(session.timer_running);
    }

    #[test]
    fn timer_tick_is_dropped_while_loading() {
        let mut session = RefreshSession::new(334);
        reduce(&mut session, RefreshEvent::Startup);
        assert!(reduce(&mut session, RefreshEvent::TimerFired).is_empty());
    }

    #[test]
    fn manual_refresh_bypasses_the_in_flight_guard() {
        let mut session = RefreshSession::new(334);
        let first = fetch_generation(&reduce(&mut session, RefreshEvent::Startup));
        let second = fetch_generation(&reduce(&mut session, RefreshEvent::ManualRefresh));
        assert!(second > first);

        // The superseded fetch's result no longer lands.
        reduce(
            &mut session,
            RefreshEvent::FetchFinished {
                generation: first,
                result: Ok(vec![area("Stale")]),
            },
        );
        assert_eq!(session.phase, Phase::Loading);
        assert!(session.areas.is_empty());
    }

    #[test]
    fn success_stores_areas_and_stamps_last_success() {
        let mut session = RefreshSession::new(334);
        let generation = fetch_generation(&reduce(&mut session, RefreshEvent::Startup));
        reduce(
            &mut session,
            RefreshEvent::FetchFinished {
                generation,
                result: Ok(vec![area("Land A")]),
            },
        );
        assert_eq!(session.phase, Phase::Success);
        assert_eq!(session.areas.len(), 1);
        assert!(session.last_success.is_some());
        assert!(session.error_detail.is_none());
        assert!(!session.is_empty_data());
    }

    #[test]
    fn failure_clears_the_display_and_records_detail() {
        let mut session = RefreshSession::new(334);
        let generation = fetch_generation(&reduce(&mut session, RefreshEvent::Startup));
        reduce(
            &mut session,
            RefreshEvent::FetchFinished {
                generation,
                result: Ok(vec![area("Land A")]),
            },
        );
        let generation = fetch_generation(&reduce(&mut session, RefreshEvent::ManualRefresh));
        reduce(
            &mut session,
            RefreshEvent::FetchFinished {
                generation,
                result: Err(FetchError::Http { status: 500, message: None }),
            },
        );
        assert_eq!(session.phase, Phase::Failed);
        assert!(session.areas.is_empty());
        assert!(session.error_detail.as_deref().unwrap().contains("500"));
    }

    #[test]
    fn empty_success_is_no_data_not_failure() {
        let mut session = RefreshSession::new(334);
        let generation = fetch_generation(&reduce(&mut session, RefreshEvent::Startup));
        reduce(
            &mut session,
            RefreshEvent::FetchFinished {
                generation,
                result: Ok(Vec::new()),
            },
        );
        assert_eq!(session.phase, Phase::Success);
        assert!(session.is_empty_data());
    }

    #[test]
    fn park_switch_supersedes_even_out_of_order_arrival() {
        let mut session = RefreshSession::new(334);
        let old_generation = fetch_generation(&reduce(&mut session, RefreshEvent::Startup));
        let new_generation =
            fetch_generation(&reduce(&mut session, RefreshEvent::ParkSwitched(65)));
        assert_eq!(session.park_id, 65);

        // Later park's response arrives first...
        reduce(
            &mut session,
            RefreshEvent::FetchFinished {
                generation: new_generation,
                result: Ok(vec![area("New Park Land")]),
            },
        );
        // ...then the old park's response straggles in and must not land.
        reduce(
            &mut session,
            RefreshEvent::FetchFinished {
                generation: old_generation,
                result: Ok(vec![area("Old Park Land")]),
            },
        );
        assert_eq!(session.phase, Phase::Success);
        assert_eq!(session.areas[0].name, "New Park Land");
    }

    #[test]
    fn switching_to_the_same_park_is_a_no_op() {
        let mut session = RefreshSession::new(334);
        reduce(&mut session, RefreshEvent::Startup);
        assert!(reduce(&mut session, RefreshEvent::ParkSwitched(334)).is_empty());
    }

    #[test]
    fn hiding_stops_the_timer_and_discards_in_flight() {
        let mut session = RefreshSession::new(334);
        let generation = fetch_generation(&reduce(&mut session, RefreshEvent::Startup));
        let effects = reduce(&mut session, RefreshEvent::VisibilityChanged(false));
        assert_eq!(effects, vec![Effect::StopTimer]);
        assert!(!session.timer_running);
        assert_eq!(session.phase, Phase::Idle);

        // The discarded fetch's result is ignored.
        reduce(
            &mut session,
            RefreshEvent::FetchFinished {
                generation,
                result: Ok(vec![area("Late")]),
            },
        );
        assert!(session.areas.is_empty());
        assert_eq!(session.phase, Phase::Idle);
    }

    #[test]
    fn becoming_visible_resumes_and_fetches_immediately() {
        let mut session = RefreshSession::new(334);
        reduce(&mut session, RefreshEvent::Startup);
        reduce(&mut session, RefreshEvent::VisibilityChanged(false));
        let effects = reduce(&mut session, RefreshEvent::VisibilityChanged(true));
        assert!(matches!(effects[0], Effect::BeginFetch { .. }));
        assert_eq!(effects[1], Effect::StartTimer);
        assert!(session.timer_running);
        assert_eq!(session.phase, Phase::Loading);
    }

    #[test]
    fn redundant_visibility_events_are_ignored() {
        let mut session = RefreshSession::new(334);
        reduce(&mut session, RefreshEvent::Startup);
        assert!(reduce(&mut session, RefreshEvent::VisibilityChanged(true)).is_empty());
    }
}
