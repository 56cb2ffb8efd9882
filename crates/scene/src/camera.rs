use glam::{Mat3, Mat4, Quat, Vec3};

/// Orientation whose -Z axis points from `eye` toward `target`.
///
/// When `up` is parallel to the viewing direction the direction is nudged
/// slightly so the basis stays well defined, the same way WebGL scene
/// graphs handle a camera looking straight up or down.
pub fn look_rotation(eye: Vec3, target: Vec3, up: Vec3) -> Mat3 {
    let mut z = eye - target;
    if z.length_squared() == 0.0 {
        z.z = 1.0;
    }
    z = z.normalize();

    let mut x = up.cross(z);
    if x.length_squared() == 0.0 {
        if up.z.abs() == 1.0 {
            z.x += 0.0001;
        } else {
            z.z += 0.0001;
        }
        z = z.normalize();
        x = up.cross(z);
    }
    x = x.normalize();
    let y = z.cross(x);
    Mat3::from_cols(x, y, z)
}

/// Perspective camera with a cached projection matrix.
///
/// Changing `fov`, `aspect`, `near` or `far` has no effect on
/// [`projection_matrix`](Self::projection_matrix) until
/// [`update_projection_matrix`](Self::update_projection_matrix) is called.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub up: Vec3,
    target: Vec3,
    rotation: Mat3,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            up: Vec3::Y,
            target: Vec3::NEG_Z,
            rotation: Mat3::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Point the camera at `target` from its current position.
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
        self.rotation = look_rotation(self.position, target, self.up);
    }

    /// Last point passed to [`look_at`](Self::look_at).
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vec3 {
        -self.rotation.z_axis
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(
            self.fov.to_radians(),
            self.aspect,
            self.near,
            self.far,
        );
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Camera-to-world transform.
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(Quat::from_mat3(&self.rotation), self.position)
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_origin_faces_origin() {
        let mut cam = PerspectiveCamera::new(40.0, 4.0 / 3.0, 1.0, 20000.0);
        cam.position = Vec3::new(0.0, 100.0, -1000.0);
        cam.look_at(Vec3::ZERO);
        let expected = (Vec3::ZERO - cam.position).normalize();
        assert!(cam.forward().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn view_matrix_maps_target_onto_negative_z() {
        let mut cam = PerspectiveCamera::new(45.0, 1.0, 0.1, 100.0);
        cam.position = Vec3::new(3.0, 4.0, 5.0);
        cam.look_at(Vec3::ZERO);
        let p = cam.view_matrix().transform_point3(Vec3::ZERO);
        assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4);
        assert!((p.z + Vec3::new(3.0, 4.0, 5.0).length()).abs() < 1e-3);
    }

    #[test]
    fn looking_straight_up_stays_finite() {
        let mut cam = PerspectiveCamera::new(45.0, 1.0, 0.1, 20000.0);
        cam.position = Vec3::new(0.0, -117.0, 0.0);
        cam.look_at(Vec3::new(0.0, 1.0, 0.0));
        let vp = cam.view_projection();
        assert!(!vp.is_nan());
        assert!(cam.forward().y > 0.999);
    }

    #[test]
    fn projection_is_cached_until_updated() {
        let mut cam = PerspectiveCamera::new(45.0, 1.0, 0.1, 100.0);
        let before = cam.projection_matrix();
        cam.aspect = 2.0;
        assert_eq!(cam.projection_matrix(), before);
        cam.update_projection_matrix();
        assert_ne!(cam.projection_matrix(), before);
    }

    #[test]
    fn degenerate_eye_equals_target() {
        let m = look_rotation(Vec3::ONE, Vec3::ONE, Vec3::Y);
        assert!(!m.is_nan());
        assert!(m.z_axis.abs_diff_eq(Vec3::Z, 1e-6));
    }
}
