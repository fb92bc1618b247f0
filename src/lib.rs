// THEORY:
// This file is the entry point for the `fuzzy_line_follower` library crate.
// It exposes the perception-to-actuation core of a camera-guided line follower:
// a frame goes in, a pair of wheel speeds comes out.
//
// The public surface is deliberately small. `pipeline` holds the `ControlLoop`
// and the collaborator traits (`FrameSource`, `ActuatorSink`) a host program
// implements. Everything underneath (thresholding, contour tracing, the fuzzy
// variable model, the rule table, the inference engine) lives in
// `core_modules` and can be used piecemeal for testing or offline analysis.

pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use error::{ControlError, FrameError, FuzzyError};
pub use pipeline::{
    ActuatorSink, ControlLoop, ControllerConfig, FrameEvent, FrameSource, LoopSummary,
    MotorCommand, Tick, TickReport,
};
