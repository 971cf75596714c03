use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex, Notify};
use tokio::time::Instant;

use tidyup_core::{Assignment, Config};
use tidyup_sync::{PullOutcome, Session};

use crate::error::{io_err, DaemonError};
use crate::paths::{is_state_file, watch_dir, DEBOUNCE_WINDOW};
use crate::scheduler::schedule;

pub type SharedSession = Arc<Mutex<Session>>;

/// Tunables for [`run`].
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub poll_interval: Duration,
    pub reminder_lead: chrono::Duration,
    /// Observe `~/.tidyup/state.json` for writes by other processes.
    pub watch_cache: bool,
}

impl WatchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            reminder_lead: config.reminder_lead(),
            watch_cache: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshSource {
    Remote,
    LocalCache,
}

/// Something the caller should surface to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WatchEvent {
    /// The in-memory snapshot was replaced.
    Refreshed { source: RefreshSource },
    /// The week ends soon.
    Reminder {
        boundary: DateTime<Utc>,
        assignments: Vec<Assignment>,
    },
    /// A new rotation week started.
    Rollover {
        week_index: i64,
        assignments: Vec<Assignment>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeKind {
    Reminder,
    Rollover,
}

/// Next instant the boundary loop should wake, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wake {
    pub at: DateTime<Utc>,
    pub kind: WakeKind,
}

/// Pick the next wake-up for `boundary`.
///
/// The reminder is skipped when the lead is zero, once it has fired for this
/// boundary, or when its time has passed.
pub fn plan_next_wake(
    now: DateTime<Utc>,
    boundary: DateTime<Utc>,
    lead: chrono::Duration,
    reminded: bool,
) -> Wake {
    let reminder_at = boundary - lead;
    if !reminded && lead > chrono::Duration::zero() && reminder_at > now {
        Wake {
            at: reminder_at,
            kind: WakeKind::Reminder,
        }
    } else {
        Wake {
            at: boundary,
            kind: WakeKind::Rollover,
        }
    }
}

/// Build a multi-threaded runtime and drive `future` to completion on it.
pub fn block_on<F: Future>(future: F) -> Result<F::Output, DaemonError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    Ok(runtime.block_on(future))
}

/// Watch until Ctrl-C, then flush pending pushes.
pub async fn run(
    session: Session,
    options: WatchOptions,
    events: mpsc::UnboundedSender<WatchEvent>,
) -> Result<(), DaemonError> {
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, stopping watch");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Runtime(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let result = run_until(session, options, events, shutdown_tx.clone()).await;
    let _ = shutdown_tx.send(());
    handle_join("signal_handler", signal_handle.await)?;
    result
}

/// Run the poll, boundary and cache-watch tasks until `shutdown` fires or
/// one of them fails.
pub async fn run_until(
    session: Session,
    options: WatchOptions,
    events: mpsc::UnboundedSender<WatchEvent>,
    shutdown_tx: broadcast::Sender<()>,
) -> Result<(), DaemonError> {
    let home = session.home().to_path_buf();
    let polling = !session.coordinator().is_inert();
    let session: SharedSession = Arc::new(Mutex::new(session));
    let changed = Arc::new(Notify::new());

    let poll_handle = {
        let shutdown = shutdown_tx.clone();
        let session = session.clone();
        let changed = changed.clone();
        let events = events.clone();
        let interval = options.poll_interval;
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            let result = if polling {
                poll_task(session, interval, changed, events, shutdown_rx).await
            } else {
                tracing::info!("offline: remote polling disabled");
                Ok(())
            };
            if result.is_err() {
                let _ = shutdown.send(());
            }
            result
        })
    };

    let boundary_handle = {
        let shutdown = shutdown_tx.clone();
        let session = session.clone();
        let changed = changed.clone();
        let events = events.clone();
        let lead = options.reminder_lead;
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            let result = boundary_task(session, lead, changed, events, shutdown_rx).await;
            let _ = shutdown.send(());
            result
        })
    };

    let watcher_handle = {
        let shutdown = shutdown_tx.clone();
        let session = session.clone();
        let changed = changed.clone();
        let events = events.clone();
        let enabled = options.watch_cache;
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            let result = if enabled {
                cache_watcher_task(home, session, changed, events, shutdown_rx).await
            } else {
                Ok(())
            };
            if result.is_err() {
                let _ = shutdown.send(());
            }
            result
        })
    };

    let (poll_result, boundary_result, watcher_result) =
        tokio::join!(poll_handle, boundary_handle, watcher_handle);

    session.lock().await.flush().await;

    handle_join("poll", poll_result)?;
    handle_join("boundary", boundary_result)?;
    handle_join("cache_watcher", watcher_result)?;
    Ok(())
}

async fn poll_task(
    session: SharedSession,
    interval: Duration,
    changed: Arc<Notify>,
    events: mpsc::UnboundedSender<WatchEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {
                // Fetch without holding the lock so local reads stay responsive.
                let coordinator = session.lock().await.coordinator().clone();
                let fetched = match coordinator.fetch().await {
                    Ok(Some(state)) => state,
                    Ok(None) => {
                        tracing::debug!("remote household not found");
                        continue;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "poll failed");
                        continue;
                    }
                };
                let outcome = session.lock().await.apply_remote(fetched);
                match outcome {
                    Ok(PullOutcome::Refreshed) => {
                        changed.notify_one();
                        emit(&events, WatchEvent::Refreshed { source: RefreshSource::Remote })?;
                    }
                    Ok(PullOutcome::Unchanged) => {}
                    Err(err) => tracing::warn!(error = %err, "failed to persist pulled snapshot"),
                }
            }
        }
    }

    Ok(())
}

async fn boundary_task(
    session: SharedSession,
    lead: chrono::Duration,
    changed: Arc<Notify>,
    events: mpsc::UnboundedSender<WatchEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut reminded_for: Option<DateTime<Utc>> = None;
    let mut seen_week: Option<i64> = None;

    loop {
        let (now, boundary, week_index) = {
            let session = session.lock().await;
            (session.clock().now(), session.next_boundary(), session.week_index())
        };
        let seen = *seen_week.get_or_insert(week_index);
        let wake = plan_next_wake(now, boundary, lead, reminded_for == Some(boundary));
        let delay = (wake.at - now).to_std().unwrap_or(Duration::ZERO);

        let (fired_tx, fired_rx) = oneshot::channel::<()>();
        let task = schedule(delay, async move {
            let _ = fired_tx.send(());
        });

        tokio::select! {
            _ = shutdown_rx.recv() => {
                task.cancel();
                break;
            }
            _ = changed.notified() => {
                task.cancel();
                seen_week = None;
                tracing::debug!("snapshot changed; rescheduling boundary timer");
            }
            fired = fired_rx => {
                if fired.is_err() {
                    continue;
                }
                let session = session.lock().await;
                match wake.kind {
                    WakeKind::Reminder => {
                        reminded_for = Some(boundary);
                        emit(&events, WatchEvent::Reminder {
                            boundary,
                            assignments: session.assignments(),
                        })?;
                    }
                    WakeKind::Rollover => {
                        // Woken before the clock reached the boundary: replan.
                        let current = session.week_index();
                        if current > seen {
                            seen_week = Some(current);
                            tracing::info!(week_index = current, "rotation week rolled over");
                            emit(&events, WatchEvent::Rollover {
                                week_index: current,
                                assignments: session.assignments(),
                            })?;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

async fn cache_watcher_task(
    home: PathBuf,
    session: SharedSession,
    changed: Arc<Notify>,
    events: mpsc::UnboundedSender<WatchEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let dir = watch_dir(&home);
    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut watcher: RecommendedWatcher = recommended_watcher(move |event| {
        let _ = event_tx.send(event);
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    let mut quiet = QuietPeriod::new(DEBOUNCE_WINDOW);

    loop {
        let deadline = quiet.deadline();
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if !quiet.take_if_due(Instant::now()) {
                    continue;
                }
                let outcome = session.lock().await.reload_local();
                if outcome == PullOutcome::Refreshed {
                    tracing::info!("picked up local cache change");
                    changed.notify_one();
                    emit(&events, WatchEvent::Refreshed { source: RefreshSource::LocalCache })?;
                }
            }
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                let event = match event {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::warn!(error = %err, "watcher event error");
                        continue;
                    }
                };
                if is_relevant_event_kind(&event.kind) && event.paths.iter().any(|p| is_state_file(p)) {
                    quiet.touch(Instant::now());
                }
            }
        }
    }

    Ok(())
}

fn emit(events: &mpsc::UnboundedSender<WatchEvent>, event: WatchEvent) -> Result<(), DaemonError> {
    events
        .send(event)
        .map_err(|_| DaemonError::ChannelClosed("watch events"))
}

fn is_relevant_event_kind(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

/// Trailing-edge debounce: due once no event has arrived for `window`.
/// Every write in a burst pushes the deadline back, so the last one is
/// always read.
#[derive(Debug)]
struct QuietPeriod {
    window: Duration,
    deadline: Option<Instant>,
}

impl QuietPeriod {
    fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn take_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Runtime(format!("{task} task join failure: {err}"))),
    }
}
