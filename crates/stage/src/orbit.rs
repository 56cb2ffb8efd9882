use glam::Vec3;
use mirrorlight_scene::PerspectiveCamera;

const ORBIT_DISTANCE: f64 = 100.0;
const ORBIT_STEP: f64 = 0.01;

/// Circular camera motion around the origin in the XZ plane.
///
/// Height is left alone. The tick counter is unbounded; the angle is
/// computed in double precision so large tick counts stay on the circle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraOrbit {
    ticks: u64,
}

impl CameraOrbit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Position of the camera for tick `t` at height `y`.
    pub fn position_at(ticks: u64, y: f32) -> Vec3 {
        let angle = ticks as f64 * ORBIT_STEP;
        Vec3::new(
            (angle.sin() * ORBIT_DISTANCE) as f32,
            y,
            (angle.cos() * ORBIT_DISTANCE) as f32,
        )
    }

    /// Place `camera` for the current tick and aim it at the origin.
    pub fn apply(&self, camera: &mut PerspectiveCamera) {
        camera.position = Self::position_at(self.ticks, camera.position.y);
        camera.look_at(Vec3::ZERO);
    }

    /// Move to the next tick and apply it.
    pub fn advance(&mut self, camera: &mut PerspectiveCamera) {
        self.ticks += 1;
        self.apply(camera);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        let mut cam = PerspectiveCamera::new(40.0, 1.0, 1.0, 20000.0);
        cam.position = Vec3::new(0.0, 100.0, -1000.0);
        cam
    }

    #[test]
    fn tick_zero_sits_on_positive_z() {
        let mut cam = camera();
        CameraOrbit::new().apply(&mut cam);
        assert!(cam.position.abs_diff_eq(Vec3::new(0.0, 100.0, 100.0), 1e-5));
    }

    #[test]
    fn advance_follows_the_circle() {
        let mut cam = camera();
        let mut orbit = CameraOrbit::new();
        orbit.apply(&mut cam);
        for n in 1..=500u64 {
            orbit.advance(&mut cam);
            let a = n as f32 * 0.01;
            let expected = Vec3::new(100.0 * a.sin(), 100.0, 100.0 * a.cos());
            let actual = cam.position;
            assert!(actual.abs_diff_eq(expected, 1e-3), "tick {n}: {actual:?}");
        }
        assert_eq!(orbit.ticks(), 500);
    }

    #[test]
    fn camera_keeps_looking_at_origin() {
        let mut cam = camera();
        let mut orbit = CameraOrbit::new();
        for _ in 0..37 {
            orbit.advance(&mut cam);
        }
        let expected = (-cam.position).normalize();
        assert!(cam.forward().abs_diff_eq(expected, 1e-5));
        assert_eq!(cam.target(), Vec3::ZERO);
    }

    #[test]
    fn large_tick_counts_stay_on_the_circle() {
        let p = CameraOrbit::position_at(u64::from(u32::MAX), 100.0);
        let radius = (p.x * p.x + p.z * p.z).sqrt();
        assert!((radius - 100.0).abs() < 1e-3);
    }
}
