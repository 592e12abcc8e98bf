//! Point lights and their uniform layout.

use cgmath::Vector3;

/// An omnidirectional light.
///
/// The Phong shader treats `position` as eye-space coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vector3<f32>,
    pub color: Vector3<f32>,
    pub intensity: f32,
}

impl PointLight {
    pub fn new<V: Into<Vector3<f32>>>(position: V, color: V, intensity: f32) -> Self {
        Self {
            position: position.into(),
            color: color.into(),
            intensity,
        }
    }

    /// A black light used when a scene has no light nodes.
    pub fn off() -> Self {
        Self::new([0.0; 3], [0.0; 3], 0.0)
    }

    /// `[position.xyz, 0, color.xyz, 0, intensity, 0, 0, 0]`
    pub fn to_array(&self) -> [f32; 12] {
        bytemuck::cast(self.to_raw())
    }

    pub fn to_raw(&self) -> LightUniform {
        LightUniform {
            position: self.position.into(),
            _padding: 0.0,
            color: self.color.into(),
            _padding2: 0.0,
            intensity: self.intensity,
            _padding3: [0.0; 3],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    position: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: f32,
    color: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding2: f32,
    intensity: f32,
    _padding3: [f32; 3],
}
