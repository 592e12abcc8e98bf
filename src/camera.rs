//! Perspective projection for camera nodes.
//!
//! cgmath builds OpenGL-style projections with clip depth in -1..1 while wgpu
//! expects 0..1, hence the correction matrix applied in
//! [`Projection::calc_matrix`].

use cgmath::{Matrix4, Rad, perspective};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Frustum parameters of a perspective camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(aspect: f32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Builds a projection whose aspect ratio matches a `width` × `height` target.
    pub fn from_size<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self::new(aspect_of(width, height), fovy, znear, zfar)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect_of(width, height);
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fovy(&self) -> Rad<f32> {
        self.fovy
    }

    pub fn znear(&self) -> f32 {
        self.znear
    }

    pub fn zfar(&self) -> f32 {
        self.zfar
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

fn aspect_of(width: u32, height: u32) -> f32 {
    // a minimised window reports a zero height
    width as f32 / height.max(1) as f32
}
