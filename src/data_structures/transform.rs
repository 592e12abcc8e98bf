//! Spatial transforms with eagerly derived world and local matrices.
//!
//! A [`Transform`] keeps position, rotation and scale together with the
//! matrices derived from them. Every setter recomputes both matrices right
//! away, so readers never observe a stale world or local matrix.

use cgmath::{EuclideanSpace, Matrix, Matrix3, Matrix4, One, Point3, Quaternion, SquareMatrix, Vector3};

/// Position, rotation (as quaternion) and scale of a scene node.
///
/// `world_matrix` maps object space into world space. `local_matrix` is its
/// inverse, which for camera nodes is the view matrix.
///
/// Scale components must be non-zero. A singular world matrix leaves the
/// local matrix filled with NaN; the renderer rejects such nodes when it
/// first sees them.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    position: Vector3<f32>,
    rotation: Quaternion<f32>,
    scale: Vector3<f32>,
    world_matrix: Matrix4<f32>,
    local_matrix: Matrix4<f32>,
}

impl Transform {
    pub fn new(position: Vector3<f32>, rotation: Quaternion<f32>, scale: Vector3<f32>) -> Self {
        let mut transform = Self {
            position,
            rotation,
            scale,
            world_matrix: Matrix4::identity(),
            local_matrix: Matrix4::identity(),
        };
        transform.recompute();
        transform
    }

    /// No translation, rotation or scale.
    pub fn identity() -> Self {
        Self::new(
            Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            Quaternion::one(),
            Vector3::new(1.0, 1.0, 1.0),
        )
    }

    /// Pure translation with unit rotation and scale.
    pub fn translate(position: Vector3<f32>) -> Self {
        let mut transform = Self::identity();
        transform.set_position(position);
        transform
    }

    /// Camera-style transform.
    ///
    /// The right-handed view matrix looking from `eye` at `target` becomes the
    /// local matrix and its inverse (the camera pose) the world matrix. The
    /// rotation is read back from the basis of the world matrix.
    ///
    /// `eye == target` or an `up` parallel to the viewing direction produce
    /// NaN matrices.
    pub fn look_at(eye: Vector3<f32>, target: Vector3<f32>, up: Vector3<f32>) -> Self {
        let mut transform = Self::identity();
        transform.set_position(eye);
        transform.local_matrix =
            Matrix4::look_at_rh(Point3::from_vec(eye), Point3::from_vec(target), up);
        transform.world_matrix = invert_or_nan(&transform.local_matrix);
        let w = &transform.world_matrix;
        let basis = Matrix3::from_cols(w.x.truncate(), w.y.truncate(), w.z.truncate());
        transform.rotation = Quaternion::from(basis);
        transform
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn rotation(&self) -> Quaternion<f32> {
        self.rotation
    }

    pub fn scale(&self) -> Vector3<f32> {
        self.scale
    }

    pub fn world_matrix(&self) -> &Matrix4<f32> {
        &self.world_matrix
    }

    pub fn local_matrix(&self) -> &Matrix4<f32> {
        &self.local_matrix
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
        self.recompute();
    }

    /// The quaternion is stored as given. Callers normalize it.
    pub fn set_rotation(&mut self, rotation: Quaternion<f32>) {
        self.rotation = rotation;
        self.recompute();
    }

    pub fn set_scale(&mut self, scale: Vector3<f32>) {
        self.scale = scale;
        self.recompute();
    }

    /// Second column of the world matrix.
    pub fn up(&self) -> Vector3<f32> {
        self.world_matrix.y.truncate()
    }

    /// First column of the world matrix.
    pub fn right(&self) -> Vector3<f32> {
        self.world_matrix.x.truncate()
    }

    /// Third column of the world matrix.
    pub fn forward(&self) -> Vector3<f32> {
        self.world_matrix.z.truncate()
    }

    /// True when both derived matrices contain only finite values.
    pub fn is_finite(&self) -> bool {
        is_finite(&self.world_matrix) && is_finite(&self.local_matrix)
    }

    fn recompute(&mut self) {
        self.world_matrix = Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
        self.local_matrix = invert_or_nan(&self.world_matrix);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Vector3<f32>> for Transform {
    fn from(position: Vector3<f32>) -> Self {
        Self::translate(position)
    }
}

/// `transpose(inverse(model_view))`, the matrix that keeps normals
/// perpendicular to surfaces under non-uniform scale.
pub fn normal_matrix(model_view: &Matrix4<f32>) -> Matrix4<f32> {
    invert_or_nan(model_view).transpose()
}

pub(crate) fn invert_or_nan(matrix: &Matrix4<f32>) -> Matrix4<f32> {
    matrix
        .invert()
        .unwrap_or_else(|| Matrix4::from([[f32::NAN; 4]; 4]))
}

pub(crate) fn is_finite(matrix: &Matrix4<f32>) -> bool {
    let cols: &[[f32; 4]; 4] = matrix.as_ref();
    cols.iter().flatten().all(|v| v.is_finite())
}

