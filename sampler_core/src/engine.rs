//! The acquisition engine.
//!
//! `Engine` owns the device link, the session store, the axis limits and the
//! orchestrator state. Operator actions (`select_mode`, `run_sweep`, ...) and
//! timer ticks (`tick`) are its only entry points; both run on the caller's
//! thread, so a tick never overlaps an action or another tick.
//!
//! Every action probes the link first. A failed probe disables further
//! actions until a later probe succeeds and writes `Connection error` to the
//! transcript.

use sampler_traits::{Channel, Device, TranscriptSink, Visualizer, cmd};
use tracing::{debug, info, warn};

use crate::axis::{AxisLimits, ValueBounds};
use crate::builder::EngineBuilder;
use crate::config::EngineCfg;
use crate::error::{ConfigError, Report, Result, SamplerError};
use crate::hw_error::map_device_error;
use crate::protocol::{self, Sample};
use crate::session::SessionStore;
use crate::state::{MAX_THROTTLE, OrchestratorState, SamplingMode, StepPlan, Timer, TimerKind};
use crate::status::TickStatus;

pub struct Engine<D: Device> {
    pub(crate) device: D,
    pub(crate) transcript: Box<dyn TranscriptSink>,
    pub(crate) visualizer: Box<dyn Visualizer>,
    pub(crate) cfg: EngineCfg,
    pub(crate) sessions: SessionStore,
    pub(crate) limits: AxisLimits,
    pub(crate) state: OrchestratorState,
    pub(crate) mode: Option<SamplingMode>,
    pub(crate) plan: Option<StepPlan>,
    pub(crate) throttle: f64,
    pub(crate) exporting: bool,
    pub(crate) actions_enabled: bool,
}

impl<D: Device> std::fmt::Debug for Engine<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state.name())
            .field("mode", &self.mode)
            .field("throttle", &self.throttle)
            .field("exporting", &self.exporting)
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

impl<D: Device> Engine<D> {
    /// Start building an engine.
    pub fn builder() -> EngineBuilder<D> {
        EngineBuilder::default()
    }

    pub(crate) fn from_parts(
        device: D,
        transcript: Box<dyn TranscriptSink>,
        visualizer: Box<dyn Visualizer>,
        cfg: EngineCfg,
    ) -> Self {
        Self {
            device,
            transcript,
            visualizer,
            limits: cfg.axes.defaults,
            cfg,
            sessions: SessionStore::new(),
            state: OrchestratorState::Idle,
            mode: None,
            plan: None,
            throttle: 0.0,
            exporting: false,
            actions_enabled: true,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    pub fn mode(&self) -> Option<SamplingMode> {
        self.mode
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn axis_limits(&self) -> &AxisLimits {
        &self.limits
    }

    /// Last throttle level written to the device.
    pub fn throttle(&self) -> f64 {
        self.throttle
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// False after a failed link probe until the next successful one.
    pub fn actions_enabled(&self) -> bool {
        self.actions_enabled
    }

    pub fn config(&self) -> &EngineCfg {
        &self.cfg
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// The timer the current state arms, if any.
    pub fn armed_timer(&self) -> Option<Timer> {
        let kind = self.state.timer_kind()?;
        let interval = match kind {
            TimerKind::Sweep => self.cfg.timing.sweep_interval(),
            TimerKind::Countdown => self.cfg.timing.countdown_interval(),
            TimerKind::Period => self.cfg.timing.period_interval(),
        };
        Some(Timer { kind, interval })
    }

    // ── Operator actions ─────────────────────────────────────────────────────

    /// Probe the link without doing anything else.
    pub fn check_link(&mut self) -> Result<()> {
        self.link_check()
    }

    /// Choose how the bench is driven and put the device into read mode.
    ///
    /// Refused while a sweep or sequence runs. A paused sweep is closed.
    pub fn select_mode(&mut self, mode: SamplingMode) -> Result<()> {
        if matches!(
            self.state,
            OrchestratorState::ManualRunning
                | OrchestratorState::AutoCountdown { .. }
                | OrchestratorState::AutoStepping { .. }
        ) {
            return Err(Report::new(SamplerError::Busy(
                "cannot change mode while sampling",
            )));
        }
        self.link_check()?;
        self.send(cmd::READ_MODE)?;
        if matches!(self.state, OrchestratorState::ManualPaused) {
            self.state = OrchestratorState::Idle;
        }
        self.mode = Some(mode);
        info!(mode = mode.label(), "sampling mode selected");
        Ok(())
    }

    /// Start a manual sweep, or resume a paused one. No-op while running.
    pub fn run_sweep(&mut self) -> Result<()> {
        self.require_mode(SamplingMode::Manual, "sweep")?;
        match self.state {
            OrchestratorState::ManualRunning => return Ok(()),
            OrchestratorState::Idle | OrchestratorState::ManualPaused => {}
            _ => return Err(Report::new(SamplerError::Busy("a sequence is running"))),
        }
        self.link_check()?;
        let resuming = matches!(self.state, OrchestratorState::ManualPaused);
        self.send(cmd::RESUME_EXPORT)?;
        self.exporting = true;
        if resuming {
            info!("sweep resumed");
        } else {
            let index = self.sessions.begin();
            info!(session = index, "sweep started");
        }
        self.state = OrchestratorState::ManualRunning;
        Ok(())
    }

    /// Pause a running sweep. The timer is disarmed even when the device
    /// cannot be told to pause.
    pub fn stop_sweep(&mut self) -> Result<()> {
        if !matches!(self.state, OrchestratorState::ManualRunning) {
            return Ok(());
        }
        self.state = OrchestratorState::ManualPaused;
        self.link_check()?;
        self.send(cmd::PAUSE_EXPORT)?;
        self.exporting = false;
        info!("sweep paused");
        Ok(())
    }

    /// Start an automatic sequence of `steps` levels, `period_ms` apart.
    pub fn run_period(&mut self, period_ms: i64, steps: i64) -> Result<()> {
        self.start_sequence(|| StepPlan::new(period_ms, steps))
    }

    /// [`Engine::run_period`] with operator-entered text.
    pub fn run_period_text(&mut self, period_ms: &str, steps: &str) -> Result<()> {
        self.start_sequence(|| StepPlan::parse(period_ms, steps))
    }

    /// Set the throttle by hand. Refused while a sequence drives it.
    pub fn set_throttle(&mut self, level: f64) -> Result<()> {
        if !(0.0..=MAX_THROTTLE).contains(&level) {
            return Err(Report::new(SamplerError::Config(
                ConfigError::ThrottleOutOfRange(level),
            )));
        }
        if self.state.is_auto() {
            return Err(Report::new(SamplerError::Busy(
                "throttle is driven by the running sequence",
            )));
        }
        self.link_check()?;
        self.apply_throttle(level, self.exporting)?;
        info!(level, "throttle set");
        Ok(())
    }

    /// Drop every session, restore default axes and clear the transcript,
    /// then stop the device and restart its timestamps.
    ///
    /// Local state is reset even when the device cannot be reached.
    pub fn reset(&mut self) -> Result<()> {
        let was_exporting = self.exporting;
        let throttle = self.throttle;

        self.state = OrchestratorState::Idle;
        self.plan = None;
        self.exporting = false;
        self.sessions.clear();
        self.limits = self.cfg.axes.defaults;
        self.transcript.clear();
        self.visualizer.clear();
        self.visualizer.rescale_time(self.limits.time_limit_ms);
        for channel in Channel::ALL {
            let b = ValueBounds::for_limit(channel, self.limits.value_limit(channel));
            self.visualizer.rescale_value(channel, b.lower, b.upper);
        }
        self.visualizer.redraw();
        info!("engine reset");

        self.reset_device(was_exporting, throttle)
    }

    /// Best-effort stop on exit: throttle to zero, pause export, disarm.
    pub fn shutdown(&mut self) {
        if self.throttle != 0.0
            && let Err(e) = self.apply_throttle(0.0, false)
        {
            warn!(error = %e, "could not zero throttle on shutdown");
        }
        if self.exporting
            && let Err(e) = self.send(cmd::PAUSE_EXPORT)
        {
            warn!(error = %e, "could not pause export on shutdown");
        }
        self.exporting = false;
        self.plan = None;
        self.state = match self.state {
            OrchestratorState::ManualRunning => OrchestratorState::ManualPaused,
            OrchestratorState::ManualPaused => OrchestratorState::ManualPaused,
            _ => OrchestratorState::Idle,
        };
        debug!("engine shut down");
    }

    // ── Timer ticks ──────────────────────────────────────────────────────────

    /// Run the handler of the armed timer once.
    pub fn tick(&mut self) -> Result<TickStatus> {
        match self.state {
            OrchestratorState::Idle | OrchestratorState::ManualPaused => Ok(TickStatus::Inactive),
            OrchestratorState::ManualRunning => Ok(self.tick_sweep()),
            OrchestratorState::AutoCountdown { remaining } => Ok(self.tick_countdown(remaining)),
            OrchestratorState::AutoStepping { .. } => Ok(self.tick_stepping()),
        }
    }

    fn tick_sweep(&mut self) -> TickStatus {
        match self.poll_once() {
            Ok(sample) => TickStatus::Polled { sample },
            Err(_) => self.degrade(),
        }
    }

    fn tick_countdown(&mut self, remaining: u32) -> TickStatus {
        if remaining > 0 {
            // keep the input drained while counting down
            if self.read_text().is_err() {
                return self.degrade();
            }
            let remaining = remaining - 1;
            self.state = OrchestratorState::AutoCountdown { remaining };
            self.note(&format!("Countdown: {remaining} seconds"));
            return TickStatus::Countdown { remaining };
        }

        let Some(plan) = self.plan else {
            self.state = OrchestratorState::Idle;
            return TickStatus::Inactive;
        };
        let throttle_levels = plan.throttle_levels();
        let level = throttle_levels.first().unwrap_or(0.0);
        self.note(&format!("Sampling by step begin. Throttle at: {level}"));
        info!(period_ms = plan.period_ms, steps = plan.steps, "stepping started");
        self.state = OrchestratorState::AutoStepping {
            step_index: 0,
            remaining_period_ms: plan.period_ms,
            remaining_steps: plan.steps,
            throttle_levels,
        };
        TickStatus::SteppingStarted { level }
    }

    fn tick_stepping(&mut self) -> TickStatus {
        let sample = match self.poll_once() {
            Ok(s) => s,
            Err(_) => return self.degrade(),
        };
        let Some(plan) = self.plan else {
            self.state = OrchestratorState::Idle;
            return TickStatus::Inactive;
        };
        let interval = i64::try_from(self.cfg.timing.period_interval_ms).unwrap_or(i64::MAX);

        let OrchestratorState::AutoStepping {
            step_index,
            remaining_period_ms,
            remaining_steps,
            throttle_levels,
        } = &mut self.state
        else {
            return TickStatus::Polled { sample };
        };

        *remaining_period_ms = remaining_period_ms.saturating_sub(interval);
        if *remaining_period_ms > 0 {
            return TickStatus::Polled { sample };
        }
        *remaining_period_ms = plan.period_ms;
        *remaining_steps -= 1;
        let next = if *remaining_steps < 0 {
            None
        } else {
            let level = throttle_levels.get(*step_index);
            *step_index += 1;
            level
        };

        let Some(level) = next else {
            return self.finish_sequence();
        };
        if self.apply_throttle(level, true).is_err() {
            return self.degrade();
        }
        self.note(&format!("Step change. Throttle at: {level}"));
        info!(level, "step change");
        TickStatus::StepChanged { level }
    }

    fn finish_sequence(&mut self) -> TickStatus {
        self.state = OrchestratorState::Idle;
        self.plan = None;
        let stopped = self
            .apply_throttle(0.0, false)
            .and_then(|()| self.send(cmd::PAUSE_EXPORT));
        self.exporting = false;
        self.note("Sampling by step done");
        info!("sequence complete");
        match stopped {
            Ok(()) => TickStatus::SequenceComplete,
            Err(_) => TickStatus::LinkLost,
        }
    }

    /// Disarm after the link failed mid-tick.
    fn degrade(&mut self) -> TickStatus {
        self.state = match self.state {
            OrchestratorState::ManualRunning | OrchestratorState::ManualPaused => {
                OrchestratorState::ManualPaused
            }
            _ => OrchestratorState::Idle,
        };
        self.plan = None;
        self.exporting = false;
        warn!(state = self.state.name(), "sampling stopped after device failure");
        TickStatus::LinkLost
    }

    // ── Polling ──────────────────────────────────────────────────────────────

    /// Read one reading's worth of lines, decode and store it.
    fn poll_once(&mut self) -> Result<Option<Sample>> {
        let Some(first) = self.read_text()? else {
            return Ok(None);
        };
        self.transcript.append_line(&first);
        let mut lines = vec![first];
        if protocol::lines_needed(&lines[0]) == 2
            && let Some(second) = self.read_text()?
        {
            self.transcript.append_line(&second);
            lines.push(second);
        }

        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        match protocol::decode(&refs) {
            Ok(Some(sample)) => Ok(Some(self.ingest(sample))),
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(error = %e, "skipping malformed reading");
                self.note(&format!("Skipped malformed line: {e}"));
                Ok(None)
            }
        }
    }

    /// Filter, store, rescale and plot one sample. Returns what was stored.
    fn ingest(&mut self, sample: Sample) -> Sample {
        let channel = sample.channel;
        let Some(index) = self.sessions.active_index() else {
            return sample;
        };
        let Some(entry) = self.sessions.active_mut() else {
            return sample;
        };
        let buffer = entry.channel_mut(channel);
        let value = self
            .cfg
            .noise
            .apply(channel, sample.value, buffer.last_value());
        if value != sample.value {
            debug!(%channel, raw = sample.value, kept = value, "reading rejected as noise");
        }
        buffer.append(sample.timestamp_ms, value);
        let extreme = buffer.running_max_abs();

        let rescale = self.cfg.axes.policy.check_and_rescale(
            channel,
            sample.timestamp_ms,
            extreme,
            &self.limits,
        );
        self.limits = rescale.limits;
        if let Some(t) = rescale.time {
            debug!(limit_ms = t, "time axis widened");
            self.visualizer.rescale_time(t);
        }
        if let Some(b) = rescale.value {
            debug!(%channel, upper = b.upper, "value axis widened");
            self.visualizer.rescale_value(channel, b.lower, b.upper);
        }
        let buffer = entry.channel(channel);
        self.visualizer
            .update_series(channel, buffer.timestamps(), buffer.values(), index);
        self.visualizer.redraw();

        Sample::new(channel, sample.timestamp_ms, value)
    }

    // ── Device plumbing ──────────────────────────────────────────────────────

    fn start_sequence<F>(&mut self, make_plan: F) -> Result<()>
    where
        F: FnOnce() -> std::result::Result<StepPlan, ConfigError>,
    {
        self.require_mode(SamplingMode::AutoPeriod, "step sequence")?;
        if !matches!(self.state, OrchestratorState::Idle) {
            return Err(Report::new(SamplerError::Busy(
                "a sequence is already running",
            )));
        }
        self.link_check()?;
        let plan = match make_plan() {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "step sequence rejected");
                self.note("Invalid values entered for step configuration");
                return Err(Report::new(SamplerError::Config(e)));
            }
        };

        let first = plan.throttle_levels().first().unwrap_or(0.0);
        self.apply_throttle(first, false)?;
        self.send(cmd::RESUME_EXPORT)?;
        self.exporting = true;
        let index = self.sessions.begin();
        self.plan = Some(plan);
        let countdown = self.cfg.timing.countdown;
        self.state = OrchestratorState::AutoCountdown {
            remaining: countdown,
        };
        info!(
            session = index,
            period_ms = plan.period_ms,
            steps = plan.steps,
            countdown,
            "step sequence armed"
        );
        self.note(&format!("Countdown begin at: {countdown} seconds"));
        Ok(())
    }

    fn reset_device(&mut self, was_exporting: bool, throttle: f64) -> Result<()> {
        self.link_check()?;
        if was_exporting {
            self.send(cmd::PAUSE_EXPORT)?;
        }
        if throttle != 0.0 {
            self.apply_throttle(0.0, false)?;
        }
        self.send(cmd::RESET_TIMESTAMPS)?;
        self.device
            .reset_input_buffer()
            .map_err(|e| self.link_failure(&*e))
    }

    fn require_mode(&self, wanted: SamplingMode, action: &'static str) -> Result<()> {
        match self.mode {
            None => Err(Report::new(SamplerError::NoMode)),
            Some(m) if m == wanted => Ok(()),
            Some(m) => Err(Report::new(SamplerError::WrongMode {
                action,
                mode: m.label(),
            })),
        }
    }

    /// Write `'n'` plus the level bytes, then `'r'` when `resume` is set.
    fn apply_throttle(&mut self, level: f64, resume: bool) -> Result<()> {
        self.send(cmd::SET_THROTTLE)?;
        // levels are whole numbers on the wire
        let raw = level as u32;
        self.device
            .write_throttle(raw)
            .map_err(|e| self.link_failure(&*e))?;
        self.throttle = level;
        if resume {
            self.send(cmd::RESUME_EXPORT)?;
        }
        Ok(())
    }

    fn send(&mut self, command: u8) -> Result<()> {
        self.device
            .write_command(command)
            .map_err(|e| self.link_failure(&*e))
    }

    /// One raw line as text; `None` when nothing arrived or it was blank.
    fn read_text(&mut self) -> Result<Option<String>> {
        let raw = self
            .device
            .read_line()
            .map_err(|e| self.link_failure(&*e))?;
        let text = protocol::line_text(&raw);
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(text.into_owned()))
    }

    fn link_check(&mut self) -> Result<()> {
        match self.device.probe() {
            Ok(()) => {
                if !self.actions_enabled {
                    info!("device link restored");
                }
                self.actions_enabled = true;
                Ok(())
            }
            Err(e) => Err(self.link_failure(&*e)),
        }
    }

    fn link_failure(&mut self, e: &(dyn std::error::Error + 'static)) -> Report {
        let mapped = map_device_error(e);
        match &mapped {
            SamplerError::Connectivity(msg) => {
                warn!(error = %msg, "device link lost");
                self.actions_enabled = false;
                self.transcript.append_line("Connection error");
            }
            other => {
                warn!(error = %other, "device rejected request");
                self.note(&format!("Device error: {other}"));
            }
        }
        Report::new(mapped)
    }

    fn note(&mut self, message: &str) {
        debug!(message, "transcript");
        self.transcript.append_line(message);
    }
}
