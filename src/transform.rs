use glam::{vec3, Mat4};

pub const DEGREES_PER_SECOND: f32 = 90.0;
pub const FIELD_OF_VIEW_DEGREES: f32 = 65.0;
pub const Z_NEAR: f32 = 4.0;
pub const Z_FAR: f32 = 10.0;
pub const CAMERA_DISTANCE: f32 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// `|width / height|`, or `None` when either side is empty.
    pub fn aspect_ratio(&self) -> Option<f32> {
        if self.width == 0.0 || self.height == 0.0 {
            return None;
        }
        Some((self.width / self.height).abs())
    }
}

/// Spin state of the quad. The rotation is never wrapped, so it only grows.
#[derive(Clone, Debug)]
pub struct Transform {
    rotation: f32,
    aspect: f32,
    projection: Mat4,
    model_view: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        let mut transform = Self {
            rotation: 0.0,
            aspect: 1.0,
            projection: Mat4::IDENTITY,
            model_view: Mat4::IDENTITY,
        };
        transform.projection = transform.perspective();
        transform.model_view = transform.spin();
        transform
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, dt: f32, viewport: Viewport) {
        self.rotation += DEGREES_PER_SECOND * dt.max(0.0);

        if let Some(aspect) = viewport.aspect_ratio() {
            self.aspect = aspect;
            self.projection = self.perspective();
        }
        self.model_view = self.spin();
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    #[cfg(test)]
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn model_view(&self) -> Mat4 {
        self.model_view
    }

    fn perspective(&self) -> Mat4 {
        Mat4::perspective_rh_gl(FIELD_OF_VIEW_DEGREES.to_radians(), self.aspect, Z_NEAR, Z_FAR)
    }

    fn spin(&self) -> Mat4 {
        Mat4::from_translation(vec3(0.0, 0.0, -CAMERA_DISTANCE))
            * Mat4::from_rotation_z(self.rotation.to_radians())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{vec4, Vec4};

    const EPS: f32 = 1e-4;

    #[test]
    fn rotation_accumulates_without_wrapping() {
        let mut transform = Transform::new();
        let viewport = Viewport::new(640.0, 480.0);
        let steps = [0.5, 1.0, 0.25, 2.0, 0.0, 1.5];

        let mut last = transform.rotation();
        for dt in steps {
            transform.advance(dt, viewport);
            assert!(transform.rotation() >= last);
            last = transform.rotation();
        }

        let expected: f32 = steps.iter().sum::<f32>() * DEGREES_PER_SECOND;
        assert!((transform.rotation() - expected).abs() < EPS);
        assert!(transform.rotation() > 360.0);
    }

    #[test]
    fn negative_elapsed_time_does_not_rewind() {
        let mut transform = Transform::new();
        transform.advance(1.0, Viewport::new(100.0, 100.0));
        transform.advance(-0.5, Viewport::new(100.0, 100.0));
        assert!((transform.rotation() - 90.0).abs() < EPS);
    }

    #[test]
    fn zero_elapsed_time_does_not_drift() {
        let mut transform = Transform::new();
        let viewport = Viewport::new(800.0, 600.0);
        transform.advance(0.3, viewport);
        let model_view = transform.model_view();

        for _ in 0..100 {
            transform.advance(0.0, viewport);
            assert_eq!(transform.model_view(), model_view);
        }
    }

    #[test]
    fn aspect_follows_viewport() {
        let mut transform = Transform::new();
        transform.advance(0.0, Viewport::new(800.0, 600.0));
        assert!((transform.aspect() - 800.0 / 600.0).abs() < 1e-6);

        transform.advance(0.0, Viewport::new(-400.0, 200.0));
        assert!((transform.aspect() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn empty_viewport_keeps_previous_projection() {
        let mut transform = Transform::new();
        transform.advance(0.0, Viewport::new(800.0, 600.0));
        let projection = transform.projection();

        transform.advance(0.1, Viewport::new(800.0, 0.0));
        assert_eq!(transform.projection(), projection);
        assert!((transform.aspect() - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn model_view_places_quad_in_front_of_camera() {
        let mut transform = Transform::new();
        transform.advance(1.0, Viewport::new(400.0, 400.0));

        // a quarter turn maps +x onto +y, then pushes it 6 units away
        let p = transform.model_view() * vec4(1.0, 0.0, 0.0, 1.0);
        assert!((p - vec4(0.0, 1.0, -6.0, 1.0)).abs().max_element() < EPS);
    }

    #[test]
    fn projected_center_lands_inside_clip_volume() {
        let mut transform = Transform::new();
        transform.advance(0.0, Viewport::new(400.0, 400.0));

        let clip: Vec4 = transform.projection() * transform.model_view() * vec4(0.0, 0.0, 0.0, 1.0);
        let ndc_z = clip.z / clip.w;
        assert!(clip.w > 0.0);
        assert!(ndc_z > -1.0 && ndc_z < 1.0);
    }
}
