//! Session/level state machine
//!
//! Owns the idle/running lifecycle: waiting for a player in attract mode,
//! advancing through levels 1..=3, resetting to idle when the player
//! leaves. Level changes are only evaluated between level-runs, never
//! mid-run; the runner is called synchronously for the whole level.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::Config;
use crate::skew::SkewSummary;

/// Depth reading substituted when a window sample saw no blob, so the
/// stillness statistics still cover the full window
const ABSENT_SAMPLE: f32 = -0.5;

/// Shared control signal between the supervisor and the session loop.
/// A single slot, not a queue: the supervisor writes terminate-requested,
/// the session writes idle back once shutdown completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Idle,
    Active,
    TerminateRequested,
}

pub struct ControlSlot(AtomicU8);

impl ControlSlot {
    pub fn new() -> Self {
        Self(AtomicU8::new(ControlState::Idle as u8))
    }

    pub fn set(&self, state: ControlState) {
        self.0.store(state as u8, Ordering::Release);
    }

    pub fn get(&self) -> ControlState {
        match self.0.load(Ordering::Acquire) {
            0 => ControlState::Idle,
            1 => ControlState::Active,
            _ => ControlState::TerminateRequested,
        }
    }

    /// Supervisor side: ask the session to shut down
    pub fn request_terminate(&self) {
        self.set(ControlState::TerminateRequested);
    }

    /// Session side: move idle -> active. Fails (and leaves the slot
    /// untouched) when termination was already requested, so a pending
    /// request is never lost.
    pub fn activate(&self) -> bool {
        self.0
            .compare_exchange(
                ControlState::Idle as u8,
                ControlState::Active as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn terminate_requested(&self) -> bool {
        self.get() == ControlState::TerminateRequested
    }
}

impl Default for ControlSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// External presence signal, sampled by polling. A timeout inside the
/// sensor is reported as absence, never as a fault.
pub trait PresenceSensor {
    /// Latest depth reading of the player blob; `None` when no blob is
    /// visible
    fn sample(&mut self) -> Option<f32>;
}

/// Sensor for installations without a depth camera: never sees anyone.
/// Only meaningful alongside `use_presence = false`.
pub struct NoSensor;

impl PresenceSensor for NoSensor {
    fn sample(&mut self) -> Option<f32> {
        None
    }
}

/// What one level-run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// (left, right) final score
    pub score: (u32, u32),
    pub skew_left: Option<SkewSummary>,
    pub skew_right: Option<SkewSummary>,
    /// The run ended because termination was requested, not because the
    /// win condition was reached
    pub terminated: bool,
}

/// Runs one level to completion and publishes level announcements.
/// Implemented by the orchestrator; tests substitute a recorder.
pub trait LevelRunner {
    /// Publish the new level to all consumers
    fn announce_level(&mut self, level: u8);
    /// Play one full level-run; blocks until win condition or termination
    fn run(&mut self, level: u8) -> RunOutcome;
    /// Orderly shutdown: disconnect the transport, drop further inbound
    fn shutdown(&mut self);
}

/// The idle/running lifecycle driver
pub struct SessionStateMachine {
    config: Config,
    control: Arc<ControlSlot>,
    level: u8,
}

impl SessionStateMachine {
    pub fn new(config: Config, control: Arc<ControlSlot>) -> Self {
        Self {
            config,
            control,
            level: 0,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Play the exhibit on loop until termination is requested, then shut
    /// the runner down and report idle back through the control slot.
    pub fn run(&mut self, sensor: &mut dyn PresenceSensor, runner: &mut dyn LevelRunner) {
        if self.control.activate() {
            runner.announce_level(self.level);
            while !self.control.terminate_requested() {
                self.step(sensor, runner);
            }
        }
        info!("terminate requested, shutting down session");
        runner.shutdown();
        self.control.set(ControlState::Idle);
    }

    /// Evaluate one transition from the current level. Public so the
    /// lifecycle is testable one edge at a time.
    pub fn step(&mut self, sensor: &mut dyn PresenceSensor, runner: &mut dyn LevelRunner) {
        match self.level {
            0 => self.step_idle(sensor, runner),
            1 | 2 => self.step_advance(sensor, runner),
            _ => {
                // Game over: back to attract mode, brief pause so the next
                // player can step in
                self.level = 0;
                info!("game reset to level 0");
                runner.announce_level(0);
                self.sleep_checked(Duration::from_millis(self.config.cooldown_ms));
            }
        }
    }

    /// IDLE -> RUNNING(1): requires a present-and-still player across the
    /// whole sampling window (unless presence gating is disabled)
    fn step_idle(&mut self, sensor: &mut dyn PresenceSensor, runner: &mut dyn LevelRunner) {
        if self.config.use_presence {
            debug!("waiting for player interaction");
            loop {
                if self.control.terminate_requested() {
                    return;
                }
                if sensor.sample().is_some() {
                    break;
                }
                thread::sleep(Duration::from_millis(self.config.presence_poll_ms));
            }

            debug!("player detected, checking stillness");
            let mut samples = Vec::with_capacity(self.config.presence_window);
            let mut saw_absence = false;
            for _ in 0..self.config.presence_window {
                match sensor.sample() {
                    Some(depth) => samples.push(depth),
                    None => {
                        saw_absence = true;
                        samples.push(ABSENT_SAMPLE);
                    }
                }
            }
            if saw_absence || population_stdev(&samples) > self.config.stillness_stdev_max {
                debug!("no still player, staying idle");
                return;
            }
        }

        self.level = 1;
        info!("still player detected, beginning level 1");
        runner.announce_level(1);
        // Settle delay between the announcement and the level actually
        // starting, so the visualization can play its intro
        self.sleep_checked(Duration::from_millis(self.config.settle_delay_ms));
        if self.control.terminate_requested() {
            return;
        }
        self.run_level(runner, 1);
    }

    /// RUNNING(L) -> RUNNING(L+1) while the player stays, RUNNING -> IDLE
    /// when the bounded presence poll times out
    fn step_advance(&mut self, sensor: &mut dyn PresenceSensor, runner: &mut dyn LevelRunner) {
        if self.config.use_presence {
            let mut present = false;
            for _ in 0..self.config.presence_poll_max {
                if self.control.terminate_requested() {
                    return;
                }
                if sensor.sample().is_some() {
                    present = true;
                    break;
                }
                thread::sleep(Duration::from_millis(self.config.presence_poll_ms));
            }
            if !present {
                info!("no player detected, resetting to level 0");
                self.level = 0;
                runner.announce_level(0);
                return;
            }
        }

        let next = self.level + 1;
        self.level = next;
        info!("player present, beginning level {next}");
        runner.announce_level(next);
        self.run_level(runner, next);
    }

    fn run_level(&mut self, runner: &mut dyn LevelRunner, level: u8) {
        let outcome = runner.run(level);
        info!(
            "level {level} finished {} - {}{}",
            outcome.score.0,
            outcome.score.1,
            if outcome.terminated {
                " (terminated)"
            } else {
                ""
            }
        );
    }

    /// Sleep that wakes early when termination is requested
    fn sleep_checked(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            if self.control.terminate_requested() {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            thread::sleep((deadline - now).min(Duration::from_millis(50)));
        }
    }
}

fn population_stdev(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let n = samples.len() as f32;
    let mean = samples.iter().sum::<f32>() / n;
    let variance = samples.iter().map(|s| (s - mean) * (s - mean)).sum::<f32>() / n;
    variance.sqrt()
}
