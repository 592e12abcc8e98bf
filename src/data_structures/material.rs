//! Surface shading parameters.
//!
//! Materials are immutable and shared between nodes through `Arc<Material>`.
//! Their GPU form is a 48-byte uniform block laid out in three 16-byte rows.

use cgmath::Vector3;

use crate::pipelines::Shader;

/// Shading models a material can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShadingModel {
    Phong,
    Unlit,
}

impl ShadingModel {
    pub fn name(&self) -> &'static str {
        match self {
            ShadingModel::Phong => "phong",
            ShadingModel::Unlit => "unlit",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Material {
    Phong(PhongMaterial),
    Unlit(UnlitMaterial),
}

impl Material {
    pub fn shading(&self) -> ShadingModel {
        match self {
            Material::Phong(_) => ShadingModel::Phong,
            Material::Unlit(_) => ShadingModel::Unlit,
        }
    }

    pub fn shader(&self) -> &Shader {
        match self {
            Material::Phong(m) => &m.shader,
            Material::Unlit(m) => &m.shader,
        }
    }

    pub fn as_phong(&self) -> Option<&PhongMaterial> {
        match self {
            Material::Phong(m) => Some(m),
            Material::Unlit(_) => None,
        }
    }

    pub fn to_array(&self) -> [f32; 12] {
        match self {
            Material::Phong(m) => m.to_array(),
            Material::Unlit(m) => m.to_array(),
        }
    }
}

impl From<PhongMaterial> for Material {
    fn from(material: PhongMaterial) -> Self {
        Material::Phong(material)
    }
}

impl From<UnlitMaterial> for Material {
    fn from(material: UnlitMaterial) -> Self {
        Material::Unlit(material)
    }
}

/// Classic Phong parameters: diffuse and specular colour plus a shininess
/// exponent.
#[derive(Clone, Debug, PartialEq)]
pub struct PhongMaterial {
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub shininess: f32,
    pub shader: Shader,
}

impl PhongMaterial {
    /// Uses the built-in Phong shader.
    pub fn new<V: Into<Vector3<f32>>>(diffuse: V, specular: V, shininess: f32) -> Self {
        Self {
            diffuse: diffuse.into(),
            specular: specular.into(),
            shininess,
            shader: Shader::phong(),
        }
    }

    pub fn with_shader(mut self, shader: Shader) -> Self {
        self.shader = shader;
        self
    }

    /// `[diffuse.xyz, 0, specular.xyz, 0, shininess, 0, 0, 0]`
    pub fn to_array(&self) -> [f32; 12] {
        bytemuck::cast(self.to_raw())
    }

    pub fn to_raw(&self) -> MaterialUniform {
        MaterialUniform {
            diffuse: self.diffuse.into(),
            _padding: 0.0,
            specular: self.specular.into(),
            _padding2: 0.0,
            shininess: self.shininess,
            _padding3: [0.0; 3],
        }
    }
}

/// A flat colour without lighting.
#[derive(Clone, Debug, PartialEq)]
pub struct UnlitMaterial {
    pub color: Vector3<f32>,
    pub shader: Shader,
}

impl UnlitMaterial {
    pub fn new<V: Into<Vector3<f32>>>(color: V, shader: Shader) -> Self {
        Self {
            color: color.into(),
            shader,
        }
    }

    /// `[color.xyz, 0, 0, 0, 0, 0, 0, 0, 0, 0]`
    pub fn to_array(&self) -> [f32; 12] {
        let mut out = [0.0; 12];
        let color: [f32; 3] = self.color.into();
        out[..3].copy_from_slice(&color);
        out
    }
}

/// GPU layout of a Phong material.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    diffuse: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: f32,
    specular: [f32; 3],
    _padding2: f32,
    shininess: f32,
    _padding3: [f32; 3],
}
