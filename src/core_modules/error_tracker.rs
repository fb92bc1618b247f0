// THEORY:
// The `error_tracker` module holds the controller's only memory. The lateral error
// is how far the line's centroid sits from the frame's vertical center line; the
// delta error is how much that changed since the previous tick. `ControlState`
// carries the previous error between ticks and is owned by whoever runs the loop,
// so there is no hidden global.
//
// On the first tick the previous error is 0, so the delta error equals the error.

/// State carried from one tick to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlState {
    pub previous_error: i32,
}

/// Error terms derived for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorSample {
    pub center_point: i32,
    pub error: i32,
    pub delta_error: i32,
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes this tick's error terms and remembers the error for the next one.
    pub fn track(&mut self, centroid_x: u32, frame_width: u32) -> ErrorSample {
        let center_point = (frame_width / 2) as i32;
        let error = centroid_x as i32 - center_point;
        let delta_error = error - self.previous_error;
        self.previous_error = error;
        ErrorSample {
            center_point,
            error,
            delta_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_delta_equals_error() {
        let mut state = ControlState::new();
        let sample = state.track(260, 420);
        assert_eq!(sample.center_point, 210);
        assert_eq!(sample.error, 50);
        assert_eq!(sample.delta_error, 50);
        assert_eq!(state.previous_error, 50);
    }

    #[test]
    fn delta_is_relative_to_previous_tick() {
        let mut state = ControlState::new();
        state.track(260, 420);
        let sample = state.track(200, 420);
        assert_eq!(sample.error, -10);
        assert_eq!(sample.delta_error, -60);
    }

    #[test]
    fn missing_line_reads_as_far_left() {
        let mut state = ControlState::new();
        let sample = state.track(0, 421);
        assert_eq!(sample.center_point, 210);
        assert_eq!(sample.error, -210);
    }
}
