use miniquad::*;

pub const VERTEX: &str = r#"#version 100
  attribute vec3 position;
  attribute vec4 color;

  varying lowp vec4 v_color;

  uniform mat4 projection;
  uniform mat4 model_view;

  void main() {
      gl_Position = projection * model_view * vec4(position, 1.0);
      v_color = color;
  }
  "#;

pub const FRAGMENT: &str = r#"#version 100
  varying lowp vec4 v_color;

  void main() {
      gl_FragColor = v_color;
  }
  "#;

/// Uniform order must match `effect::TransformUniforms`.
pub fn meta() -> ShaderMeta {
    ShaderMeta {
        images: vec![],
        uniforms: UniformBlockLayout {
            uniforms: vec![
                UniformDesc::new("projection", UniformType::Mat4),
                UniformDesc::new("model_view", UniformType::Mat4),
            ],
        },
    }
}
