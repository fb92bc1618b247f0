// A differential-drive robot above an infinitely long straight line. The camera
// looks ahead of the robot; its frames come out already rotated and mirrored,
// so the line to the robot's left shows up right of the frame's center.

use fuzzy_line_follower::core_modules::frame::Frame;
use fuzzy_line_follower::{ActuatorSink, ControlError, FrameEvent, FrameSource, MotorCommand};
use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};

pub const FRAME_WIDTH: u32 = 420;
pub const FRAME_HEIGHT: u32 = 140;

const TIMESTEP_S: f64 = 0.032;
const WHEEL_RADIUS_M: f64 = 0.0205;
const AXLE_LENGTH_M: f64 = 0.052;
const NEAREST_ROW_M: f64 = 0.03;
const METERS_PER_ROW: f64 = 0.001;
const PIXELS_PER_METER: f64 = 2100.0;
const LINE_HALF_WIDTH_M: f64 = 0.0025;
const MAX_HEADING_RAD: f64 = 1.4;

const FLOOR_BGRA: [u8; 4] = [225, 230, 235, 255];
const LINE_BGRA: [u8; 4] = [30, 25, 20, 255];

/// Robot pose relative to the line along the world x axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackWorld {
    /// Lateral distance from the line in meters, left positive.
    pub offset: f64,
    /// Heading relative to the line in radians, counter-clockwise positive.
    pub heading: f64,
    pub distance_travelled: f64,
}

impl TrackWorld {
    pub fn new(offset: f64) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    /// Integrates wheel speeds (rad/s) over one timestep.
    pub fn step(&mut self, command: MotorCommand) {
        let v = WHEEL_RADIUS_M * (command.left + command.right) / 2.0;
        let omega = WHEEL_RADIUS_M * (command.right - command.left) / AXLE_LENGTH_M;
        self.offset += v * self.heading.sin() * TIMESTEP_S;
        self.distance_travelled += v * TIMESTEP_S;
        self.heading = (self.heading + omega * TIMESTEP_S).clamp(-MAX_HEADING_RAD, MAX_HEADING_RAD);
    }

    /// Lateral position of the line, in the robot frame, `ahead` meters forward.
    fn line_lateral_at(&self, ahead: f64) -> f64 {
        let (sin, cos) = self.heading.sin_cos();
        let along = (ahead + self.offset * sin) / cos;
        -along * sin - self.offset * cos
    }

    /// Renders the camera's BGRA buffer.
    pub fn render_bgra(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity((FRAME_WIDTH * FRAME_HEIGHT * 4) as usize);
        let center = FRAME_WIDTH as f64 / 2.0;
        let half_width_px = LINE_HALF_WIDTH_M * PIXELS_PER_METER;
        for row in 0..FRAME_HEIGHT {
            let ahead = NEAREST_ROW_M + (FRAME_HEIGHT - 1 - row) as f64 * METERS_PER_ROW;
            let line_px = center + self.line_lateral_at(ahead) * PIXELS_PER_METER;
            for col in 0..FRAME_WIDTH {
                let on_line = (col as f64 + 0.5 - line_px).abs() <= half_width_px;
                buffer.extend_from_slice(if on_line { &LINE_BGRA } else { &FLOOR_BGRA });
            }
        }
        buffer
    }
}

fn lock(world: &Mutex<TrackWorld>) -> std::sync::MutexGuard<'_, TrackWorld> {
    world.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The robot's camera over the simulated track.
pub struct SimulatedCamera {
    world: Arc<Mutex<TrackWorld>>,
    remaining: u64,
}

impl SimulatedCamera {
    pub fn new(world: Arc<Mutex<TrackWorld>>, ticks: u64) -> Self {
        Self {
            world,
            remaining: ticks,
        }
    }
}

impl FrameSource for SimulatedCamera {
    fn next_frame(&mut self) -> Result<FrameEvent, ControlError> {
        if self.remaining == 0 {
            return Ok(FrameEvent::Finished);
        }
        self.remaining -= 1;
        let buffer = lock(&self.world).render_bgra();
        Ok(FrameEvent::Frame(Frame::from_bgra(FRAME_WIDTH, FRAME_HEIGHT, &buffer)?))
    }
}

/// The robot's wheels: every command advances the world by one timestep.
pub struct SimulatedDrive {
    world: Arc<Mutex<TrackWorld>>,
}

impl SimulatedDrive {
    pub fn new(world: Arc<Mutex<TrackWorld>>) -> Self {
        Self { world }
    }
}

impl ActuatorSink for SimulatedDrive {
    type Error = Infallible;

    fn apply(&mut self, command: MotorCommand) -> Result<(), Infallible> {
        lock(&self.world).step(command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuzzy_line_follower::{ControlLoop, ControllerConfig};
    use std::sync::atomic::AtomicBool;

    #[test]
    fn centered_robot_sees_the_line_in_the_middle() {
        let world = TrackWorld::new(0.0);
        let frame = Frame::from_bgra(FRAME_WIDTH, FRAME_HEIGHT, &world.render_bgra()).unwrap();
        let mut cl = ControlLoop::with_config(ControllerConfig::default()).unwrap();
        let report = cl.tick(&frame).report;
        assert!(report.error.abs() <= 1, "error {}", report.error);
    }

    #[test]
    fn robot_left_of_the_line_steers_right() {
        let world = TrackWorld::new(0.02);
        let frame = Frame::from_bgra(FRAME_WIDTH, FRAME_HEIGHT, &world.render_bgra()).unwrap();
        let mut cl = ControlLoop::with_config(ControllerConfig::default()).unwrap();
        let report = cl.tick(&frame).report;
        assert!(report.error < 0);
        assert!(report.command.left > report.command.right, "{:?}", report.command);
    }

    #[test]
    fn equal_wheel_speeds_drive_straight() {
        let mut world = TrackWorld::new(0.01);
        world.step(MotorCommand { left: 3.0, right: 3.0 });
        assert_eq!(world.heading, 0.0);
        assert_eq!(world.offset, 0.01);
        assert!(world.distance_travelled > 0.0);
    }

    #[test]
    fn closed_loop_run_stays_bounded() {
        let world = Arc::new(Mutex::new(TrackWorld::new(0.02)));
        let mut camera = SimulatedCamera::new(world.clone(), 150);
        let mut drive = SimulatedDrive::new(world.clone());
        let stop = AtomicBool::new(false);
        let mut cl = ControlLoop::with_config(ControllerConfig::default()).unwrap();
        let summary = cl
            .run_observed(&mut camera, &mut drive, &stop, |_, tick| {
                let c = tick.report.command;
                assert!((0.0..=6.28).contains(&c.left) && (0.0..=6.28).contains(&c.right));
            })
            .unwrap();
        assert_eq!(summary.ticks, 150);
        let end = *lock(&world);
        assert!(end.offset.is_finite() && end.heading.is_finite());
        assert!(end.distance_travelled > 0.0);
    }
}
