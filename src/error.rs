use thiserror::Error;

/// Construction-time problems with a fuzzy variable definition.
#[derive(Debug, Error, PartialEq)]
pub enum FuzzyError {
    #[error("breakpoints of `{variable}.{label}` must be finite, got [{left}, {peak}, {right}]")]
    NonFiniteBreakpoints {
        variable: &'static str,
        label: &'static str,
        left: f64,
        peak: f64,
        right: f64,
    },
    #[error("breakpoints of `{variable}.{label}` must satisfy left <= peak <= right, got [{left}, {peak}, {right}]")]
    UnorderedBreakpoints {
        variable: &'static str,
        label: &'static str,
        left: f64,
        peak: f64,
        right: f64,
    },
    #[error("`{variable}.{label}` reaches outside the universe [{min}, {max}]")]
    OutsideUniverse {
        variable: &'static str,
        label: &'static str,
        min: f64,
        max: f64,
    },
    #[error("universe of `{variable}` is empty: [{min}, {max}] with step {step}")]
    EmptyUniverse {
        variable: &'static str,
        min: f64,
        max: f64,
        step: f64,
    },
}

/// Problems turning a raw buffer or file into a `Frame`.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame dimensions must be non-zero, got {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },
    #[error("expected {expected} bytes for a {width}x{height} frame with {channels} channels, got {actual}")]
    BufferSize {
        width: u32,
        height: u32,
        channels: usize,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Failures that stop the control loop. Numeric conditions such as a missing line
/// never end up here; they are reported on the tick instead.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Fuzzy(#[from] FuzzyError),
    #[error("max_speed must be finite and non-negative, got {0}")]
    InvalidMaxSpeed(f64),
    #[error("actuator rejected command: {0}")]
    Actuator(#[source] Box<dyn std::error::Error + Send + Sync>),
}
