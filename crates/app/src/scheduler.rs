//! Scheduler — the single event loop driving detection and injection.
//!
//! [`Scheduler::run`] owns the [`AutomationState`], the detection engine and
//! the injection manager, and multiplexes every event source with
//! `tokio::select!`:
//!
//! - the poll tick, which runs one detection scan
//! - the injection retry tick, until the control is first placed
//! - host events (mutation batches and activations)
//! - the re-injection debounce deadline
//! - commands sent through a [`SchedulerHandle`]
//!
//! Only one event is processed at a time, so the state needs no lock.
//! Branches are polled in the order above: timers and host events are
//! drained before a queued command is answered.

use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};

use autoresume_domain::error::AutoResumeError;
use autoresume_domain::layout::HostLayout;
use autoresume_domain::settings::AutomationSettings;
use autoresume_domain::state::{AutomationState, SessionPhase};
use autoresume_domain::time::Timestamp;

use crate::detection::DetectionEngine;
use crate::injection::InjectionManager;
use crate::observation::{Debouncer, ObservationLayer};
use crate::ports::{Clock, Document, HostEvent};

const COMMAND_BUFFER: usize = 16;

/// Point-in-time view of the automation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub phase: SessionPhase,
    pub active: bool,
    pub last_action: Option<Timestamp>,
    pub session_start: Timestamp,
    pub elapsed_ms: u64,
    /// Successful clicks since startup.
    pub clicks: u64,
    pub control_present: bool,
}

enum Command {
    ResetSession(oneshot::Sender<bool>),
    Toggle(oneshot::Sender<bool>),
    SetActive {
        active: bool,
        reply: oneshot::Sender<()>,
    },
    Status(oneshot::Sender<StatusSnapshot>),
    Shutdown,
}

/// Cloneable handle talking to a running [`Scheduler`].
///
/// Every method fails with [`AutoResumeError::Stopped`] once the loop is gone.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    commands: mpsc::Sender<Command>,
}

impl SchedulerHandle {
    /// Restart the session timer. Resolves to `false` when the session
    /// already expired and the reset was ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AutoResumeError::Stopped`] if the scheduler is not running.
    pub async fn reset_session(&self) -> Result<bool, AutoResumeError> {
        self.request(Command::ResetSession).await
    }

    /// Flip the active flag and return the new value.
    ///
    /// # Errors
    ///
    /// Returns [`AutoResumeError::Stopped`] if the scheduler is not running.
    pub async fn toggle(&self) -> Result<bool, AutoResumeError> {
        self.request(Command::Toggle).await
    }

    /// # Errors
    ///
    /// Returns [`AutoResumeError::Stopped`] if the scheduler is not running.
    pub async fn set_active(&self, active: bool) -> Result<(), AutoResumeError> {
        self.request(|reply| Command::SetActive { active, reply }).await
    }

    /// # Errors
    ///
    /// Returns [`AutoResumeError::Stopped`] if the scheduler is not running.
    pub async fn status(&self) -> Result<StatusSnapshot, AutoResumeError> {
        self.request(Command::Status).await
    }

    /// Ask the loop to stop. It removes its control before returning.
    ///
    /// # Errors
    ///
    /// Returns [`AutoResumeError::Stopped`] if the scheduler already stopped.
    pub async fn shutdown(&self) -> Result<(), AutoResumeError> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| AutoResumeError::Stopped)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, AutoResumeError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| AutoResumeError::Stopped)?;
        response.await.map_err(|_| AutoResumeError::Stopped)
    }
}

/// Everything the loop mutates, kept apart from the command receiver so
/// `select!` branches can borrow both.
struct Core<D: Document, C> {
    document: D,
    clock: C,
    settings: AutomationSettings,
    state: AutomationState,
    engine: DetectionEngine,
    injection: InjectionManager<D::Node>,
    observation: ObservationLayer,
    debouncer: Debouncer,
    clicks: u64,
    expiry_logged: bool,
}

impl<D: Document, C: Clock> Core<D, C> {
    /// One poll cycle. Returns `false` once the session expired.
    fn tick(&mut self) -> bool {
        let now = self.clock.now();
        if self.state.check_expiry(now) {
            if !self.expiry_logged {
                self.expiry_logged = true;
                tracing::info!(
                    elapsed_ms = duration_ms(self.state.elapsed(now)),
                    "session expired, automation stopped"
                );
            }
            return false;
        }
        if self.engine.scan(&self.document, &mut self.state, now).is_some() {
            self.clicks += 1;
        }
        true
    }

    fn inject(&mut self) -> bool {
        self.injection
            .ensure_injected(&self.document, self.state.is_active())
    }

    fn on_host_event(&mut self, event: HostEvent<D::Node>) {
        match event {
            HostEvent::Mutations(batch) => {
                if self.observation.needs_reinjection(&self.document, &batch) {
                    self.debouncer.arm(Instant::now());
                }
            }
            HostEvent::Activated(node) => {
                if self.injection.owns(&self.document, &node) {
                    self.toggle();
                }
            }
        }
    }

    fn toggle(&mut self) -> bool {
        let active = self.state.toggle();
        self.injection.refresh(&self.document, active);
        tracing::info!(active, "auto-resume toggled");
        active
    }

    fn set_active(&mut self, active: bool) {
        self.state.set_active(active);
        self.injection.refresh(&self.document, active);
        tracing::info!(active, "auto-resume set");
    }

    fn reset_session(&mut self) -> bool {
        let applied = self.state.reset_session(self.clock.now());
        if applied {
            tracing::info!("session timer reset");
        } else {
            tracing::info!("session already expired, reset ignored");
        }
        applied
    }

    /// Snapshot at the current time. A bound that passed since the last
    /// tick is latched first, so the reported phase is never stale.
    fn status(&mut self) -> StatusSnapshot {
        let now = self.clock.now();
        self.state.check_expiry(now);
        StatusSnapshot {
            phase: self.state.phase(),
            active: self.state.is_active(),
            last_action: self.state.last_action(),
            session_start: self.state.session_start(),
            elapsed_ms: duration_ms(self.state.elapsed(now)),
            clicks: self.clicks,
            control_present: self.injection.is_present(&self.document),
        }
    }

    /// Apply a command. Returns `false` when the loop must stop.
    fn handle(&mut self, command: Command) -> bool {
        // a dropped reply receiver only means the caller gave up waiting
        match command {
            Command::ResetSession(reply) => {
                let _ = reply.send(self.reset_session());
            }
            Command::Toggle(reply) => {
                let _ = reply.send(self.toggle());
            }
            Command::SetActive { active, reply } => {
                self.set_active(active);
                let _ = reply.send(());
            }
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
            Command::Shutdown => return false,
        }
        true
    }
}

fn duration_ms(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Drives detection and injection against one host document.
pub struct Scheduler<D: Document, C> {
    core: Core<D, C>,
    commands: mpsc::Receiver<Command>,
}

impl<D: Document, C: Clock> Scheduler<D, C> {
    /// Create a scheduler and the handle controlling it.
    ///
    /// The session starts now; nothing runs until [`run`](Self::run) is awaited.
    ///
    /// # Errors
    ///
    /// Returns [`AutoResumeError::Validation`] if `settings` are invalid.
    pub fn new(
        document: D,
        clock: C,
        settings: AutomationSettings,
        layout: HostLayout,
    ) -> Result<(Self, SchedulerHandle), AutoResumeError> {
        settings.validate()?;

        let state = AutomationState::new(
            settings.start_active,
            settings.max_duration(),
            clock.now(),
        );
        let engine = DetectionEngine::new(
            settings.scenarios.clone(),
            layout.clone(),
            settings.cooldown(),
        );
        let debouncer = Debouncer::new(settings.reinject_debounce());
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);

        let scheduler = Self {
            core: Core {
                document,
                clock,
                state,
                engine,
                injection: InjectionManager::new(layout.clone()),
                observation: ObservationLayer::new(layout),
                debouncer,
                settings,
                clicks: 0,
                expiry_logged: false,
            },
            commands: rx,
        };
        Ok((scheduler, SchedulerHandle { commands: tx }))
    }

    /// Run one detection cycle outside the loop. Returns `false` once expired.
    pub fn tick(&mut self) -> bool {
        self.core.tick()
    }

    pub fn status(&mut self) -> StatusSnapshot {
        self.core.status()
    }

    /// Restart the session timer; no effect once expired.
    pub fn reset_session(&mut self) -> bool {
        self.core.reset_session()
    }

    /// Run until shutdown is requested, every handle is dropped or the
    /// host document goes away. The control is removed on the way out.
    pub async fn run(self) {
        let Self {
            mut core,
            mut commands,
        } = self;

        let mut events = core.document.subscribe();
        let mut poll = tokio::time::interval(core.settings.poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut retry = tokio::time::interval(core.settings.injection_retry());
        retry.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut ticking = true;
        let mut injected = false;

        tracing::info!(
            phase = %core.state.phase(),
            scenarios = core.engine.scenarios().len(),
            poll_interval_ms = core.settings.poll_interval_ms,
            cooldown_ms = core.settings.cooldown_ms,
            max_duration_ms = core.state.max_duration().map(duration_ms),
            "scheduler started"
        );

        loop {
            let deadline = core.debouncer.deadline();
            let wake = deadline.unwrap_or_else(Instant::now);
            tokio::select! {
                biased;

                _ = poll.tick(), if ticking => {
                    ticking = core.tick();
                }
                _ = retry.tick(), if !injected => {
                    injected = core.inject();
                    if !injected {
                        tracing::debug!("control not injected yet, retrying");
                    }
                }
                event = events.recv() => match event {
                    Ok(event) => core.on_host_event(event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "host events lagged");
                        core.debouncer.arm(Instant::now());
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("host document closed");
                        break;
                    }
                },
                () = tokio::time::sleep_until(wake), if deadline.is_some() => {
                    if core.debouncer.fire(Instant::now()) && core.inject() {
                        injected = true;
                    }
                }
                command = commands.recv() => match command {
                    Some(command) => {
                        if !core.handle(command) {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }

        core.injection.remove(&core.document);
        tracing::info!(clicks = core.clicks, "scheduler stopped");
    }
}
