use glam::Mat4;

use crate::device::RenderDevice;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformUniforms {
    pub projection: Mat4,
    pub model_view: Mat4,
}

impl Default for TransformUniforms {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            model_view: Mat4::IDENTITY,
        }
    }
}

/// Shading state for the quad. Holds the transform for the next frame and
/// hands it to the device; the program itself is owned by the device.
#[derive(Debug, Default)]
pub struct BaseEffect {
    uniforms: TransformUniforms,
}

impl BaseEffect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_transform(&mut self, projection: Mat4, model_view: Mat4) {
        self.uniforms = TransformUniforms {
            projection,
            model_view,
        };
    }

    #[cfg(test)]
    pub fn uniforms(&self) -> &TransformUniforms {
        &self.uniforms
    }

    pub fn prepare_frame<D: RenderDevice>(&self, device: &mut D) {
        device.apply_transform(&self.uniforms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Call, RecordingDevice};
    use glam::vec3;

    #[test]
    fn starts_with_identity() {
        let effect = BaseEffect::new();
        assert_eq!(effect.uniforms().projection, Mat4::IDENTITY);
        assert_eq!(effect.uniforms().model_view, Mat4::IDENTITY);
    }

    #[test]
    fn prepare_frame_uploads_latest_transform() {
        let mut effect = BaseEffect::new();
        let model_view = Mat4::from_translation(vec3(0.0, 0.0, -6.0));
        effect.set_transform(Mat4::IDENTITY, model_view);

        let mut device = RecordingDevice::new();
        effect.prepare_frame(&mut device);

        assert_eq!(
            device.calls,
            vec![Call::ApplyTransform(TransformUniforms {
                projection: Mat4::IDENTITY,
                model_view,
            })]
        );
    }
}
