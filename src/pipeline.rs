// THEORY:
// The `pipeline` module is the top-level API: the control loop that turns frames
// into wheel commands. It wires the stateless stages (centroid extraction, fuzzy
// inference) around the one stateful stage (error tracking) and talks to the
// outside world only through two traits:
//
// - `FrameSource` yields a frame, "nothing yet", or "finished".
// - `ActuatorSink` accepts a pair of wheel speeds.
//
// The loop is a two-state machine. In `AwaitingFrame` it asks the source for a
// frame; in `Computing` it runs one tick to completion and emits one command.
// A stop flag is checked only between ticks, so a command is never half-sent.
// Nothing here is asynchronous: a slow source simply slows the loop.

use crate::core_modules::centroid_extractor::{Extraction, ExtractorConfig, LineStatus, centroid_extractor};
use crate::core_modules::contour::Point;
use crate::core_modules::error_tracker::{ControlState, ErrorSample};
use crate::core_modules::frame::Frame;
use crate::core_modules::inference::InferenceEngine;
use crate::core_modules::rule_base::OutputChannel;
use crate::error::ControlError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Configuration for the ControlLoop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub extractor: ExtractorConfig,
    /// Upper bound on either wheel command.
    pub max_speed: f64,
}

impl ControllerConfig {
    /// Rejects values that would make clamping meaningless.
    pub fn validate(&self) -> Result<(), ControlError> {
        if !self.max_speed.is_finite() || self.max_speed < 0.0 {
            return Err(ControlError::InvalidMaxSpeed(self.max_speed));
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            max_speed: 6.28,
        }
    }
}

/// What a frame source produced.
#[derive(Debug, Clone)]
pub enum FrameEvent {
    Frame(Frame),
    /// Nothing available right now; ask again.
    Pending,
    /// The source is exhausted; the loop ends normally.
    Finished,
}

/// Supplies one frame per tick, blocking as long as it needs to.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<FrameEvent, ControlError>;
}

/// Receives wheel commands.
pub trait ActuatorSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn apply(&mut self, command: MotorCommand) -> Result<(), Self::Error>;
}

/// Left and right wheel speeds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MotorCommand {
    pub left: f64,
    pub right: f64,
}

impl MotorCommand {
    pub fn clamped(left: f64, right: f64, max_speed: f64) -> Self {
        Self {
            left: left.clamp(0.0, max_speed),
            right: right.clamp(0.0, max_speed),
        }
    }
}

/// Diagnostic record of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub center_point: i32,
    pub centroid: Point,
    pub error: i32,
    pub delta_error: i32,
    pub command: MotorCommand,
    pub line: LineStatus,
    /// A wheel fell back to the midpoint because nothing fired.
    pub aggregation_underflow: bool,
}

/// Everything one tick produced.
#[derive(Debug, Clone)]
pub struct Tick {
    pub report: TickReport,
    pub extraction: Extraction,
}

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopSummary {
    pub ticks: u64,
    pub frames_without_line: u64,
    pub stopped: bool,
}

enum LoopState {
    AwaitingFrame,
    Computing(Frame),
}

/// Owns the carried state and runs ticks.
pub struct ControlLoop {
    config: ControllerConfig,
    engine: InferenceEngine,
    state: ControlState,
    tick: u64,
}

impl ControlLoop {
    pub fn new(config: ControllerConfig, engine: InferenceEngine) -> Result<Self, ControlError> {
        config.validate()?;
        Ok(Self {
            config,
            engine,
            state: ControlState::new(),
            tick: 0,
        })
    }

    /// Standard fuzzy model and rule table.
    pub fn with_config(config: ControllerConfig) -> Result<Self, ControlError> {
        Self::new(config, InferenceEngine::standard()?)
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Runs extraction, error tracking and both inferences for one frame.
    pub fn tick(&mut self, frame: &Frame) -> Tick {
        self.tick += 1;
        let extraction = centroid_extractor::extract(frame, &self.config.extractor);
        match extraction.status {
            LineStatus::Detected => {}
            LineStatus::NoLineDetected => warn!(tick = self.tick, "no line detected"),
            LineStatus::DegenerateContour => warn!(tick = self.tick, "selected contour has no mass"),
        }

        let ErrorSample {
            center_point,
            error,
            delta_error,
        } = self.state.track(extraction.centroid.x, frame.width());

        let inputs = self.engine.fuzzify(error as f64, delta_error as f64);
        let left = self.engine.evaluate(&inputs, OutputChannel::Left);
        let right = self.engine.evaluate(&inputs, OutputChannel::Right);
        let aggregation_underflow = left.underflow || right.underflow;
        if aggregation_underflow {
            warn!(tick = self.tick, error, delta_error, "no rule fired, holding midpoint speed");
        }
        let command = MotorCommand::clamped(left.value, right.value, self.config.max_speed);

        debug!(
            tick = self.tick,
            center_point,
            cx = extraction.centroid.x,
            cy = extraction.centroid.y,
            error,
            delta_error,
            left_speed = command.left,
            right_speed = command.right,
            "tick"
        );

        Tick {
            report: TickReport {
                tick: self.tick,
                center_point,
                centroid: extraction.centroid,
                error,
                delta_error,
                command,
                line: extraction.status,
                aggregation_underflow,
            },
            extraction,
        }
    }

    /// Runs until the source finishes or `stop` is set.
    pub fn run<S, A>(&mut self, source: &mut S, sink: &mut A, stop: &AtomicBool) -> Result<LoopSummary, ControlError>
    where
        S: FrameSource + ?Sized,
        A: ActuatorSink + ?Sized,
    {
        self.run_observed(source, sink, stop, |_, _| {})
    }

    /// Like `run`, calling `observe` after each command has been applied.
    pub fn run_observed<S, A, F>(
        &mut self,
        source: &mut S,
        sink: &mut A,
        stop: &AtomicBool,
        mut observe: F,
    ) -> Result<LoopSummary, ControlError>
    where
        S: FrameSource + ?Sized,
        A: ActuatorSink + ?Sized,
        F: FnMut(&Frame, &Tick),
    {
        info!(max_speed = self.config.max_speed, "control loop started");
        let mut summary = LoopSummary::default();
        let mut state = LoopState::AwaitingFrame;

        loop {
            state = match state {
                LoopState::AwaitingFrame => {
                    if stop.load(Ordering::SeqCst) {
                        summary.stopped = true;
                        break;
                    }
                    match source.next_frame()? {
                        FrameEvent::Frame(frame) => LoopState::Computing(frame),
                        FrameEvent::Pending => LoopState::AwaitingFrame,
                        FrameEvent::Finished => break,
                    }
                }
                LoopState::Computing(frame) => {
                    let tick = self.tick(&frame);
                    sink.apply(tick.report.command)
                        .map_err(|e| ControlError::Actuator(Box::new(e)))?;
                    summary.ticks += 1;
                    if tick.report.line != LineStatus::Detected {
                        summary.frames_without_line += 1;
                    }
                    observe(&frame, &tick);
                    LoopState::AwaitingFrame
                }
            };
        }

        info!(
            ticks = summary.ticks,
            frames_without_line = summary.frames_without_line,
            stopped = summary.stopped,
            "control loop finished"
        );
        Ok(summary)
    }
}
