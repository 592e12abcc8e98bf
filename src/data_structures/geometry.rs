//! Immutable vertex and index data for drawable shapes.
//!
//! Geometry is validated once at construction and shared read-only between
//! scene nodes through `Arc<Geometry>`.

use crate::error::GeometryError;

/// Triangle-list geometry: three position floats per vertex, u16 indices and
/// optional per-vertex normals and texture coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    positions: Vec<f32>,
    indices: Vec<u16>,
    normals: Option<Vec<f32>>,
    tex_coords: Option<Vec<f32>>,
}

impl Geometry {
    pub fn new(
        positions: Vec<f32>,
        indices: Vec<u16>,
        normals: Option<Vec<f32>>,
        tex_coords: Option<Vec<f32>>,
    ) -> Result<Self, GeometryError> {
        if positions.len() % 3 != 0 {
            return Err(GeometryError::PositionsNotVec3(positions.len()));
        }
        if indices.len() % 3 != 0 {
            return Err(GeometryError::IndicesNotTriangles(indices.len()));
        }
        let vertices = positions.len() / 3;
        check_attribute("normal", normals.as_deref(), 3, vertices)?;
        check_attribute("tex coord", tex_coords.as_deref(), 2, vertices)?;
        if let Some((at, &index)) = indices
            .iter()
            .enumerate()
            .find(|(_, i)| **i as usize >= vertices)
        {
            return Err(GeometryError::IndexOutOfRange {
                at,
                index,
                vertices,
            });
        }
        Ok(Self {
            positions,
            indices,
            normals,
            tex_coords,
        })
    }

    /// Axis-aligned cube centred on the origin with edge length `size`.
    ///
    /// Every face has its own four vertices so normals and texture
    /// coordinates stay flat per face.
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        #[rustfmt::skip]
        let positions = vec![
            // front
            -h, -h,  h,   h, -h,  h,   h,  h,  h,  -h,  h,  h,
            // right
             h, -h,  h,   h, -h, -h,   h,  h, -h,   h,  h,  h,
            // back
            -h, -h, -h,  -h,  h, -h,   h,  h, -h,   h, -h, -h,
            // left
            -h, -h,  h,  -h,  h,  h,  -h,  h, -h,  -h, -h, -h,
            // bottom
            -h, -h,  h,  -h, -h, -h,   h, -h, -h,   h, -h,  h,
            // top
            -h,  h,  h,   h,  h,  h,   h,  h, -h,  -h,  h, -h,
        ];
        let face_normals: [[f32; 3]; 6] = [
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0],
            [0.0, 0.0, -1.0],
            [-1.0, 0.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let normals = face_normals
            .iter()
            .flat_map(|n| std::iter::repeat_n(*n, 4))
            .flatten()
            .collect();
        let tex_coords = (0..6)
            .flat_map(|_| [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0])
            .collect();
        let indices = (0..6u16)
            .flat_map(|face| {
                let o = face * 4;
                [o, o + 1, o + 2, o, o + 2, o + 3]
            })
            .collect();

        Self {
            positions,
            indices,
            normals: Some(normals),
            tex_coords: Some(tex_coords),
        }
    }

    /// Square in the XZ plane spanning `-size..size`, facing +Y.
    pub fn plane(size: f32) -> Self {
        #[rustfmt::skip]
        let positions = vec![
            -size, 0.0, -size,
            -size, 0.0,  size,
             size, 0.0,  size,
             size, 0.0, -size,
        ];
        let normals = [0.0, 1.0, 0.0].repeat(4);
        let tex_coords = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0];

        Self {
            positions,
            indices: vec![0, 1, 2, 0, 2, 3],
            normals: Some(normals),
            tex_coords: Some(tex_coords),
        }
    }

    /// Concatenates several geometries into one, offsetting each part's
    /// indices by the number of vertices before it.
    ///
    /// Parts without normals or texture coordinates contribute zeros so the
    /// attribute streams stay aligned with the positions.
    pub fn bundle(parts: &[&Geometry]) -> Result<Self, GeometryError> {
        let vertices: usize = parts.iter().map(|g| g.vertex_count()).sum();
        if vertices > u16::MAX as usize + 1 {
            return Err(GeometryError::TooManyVertices(vertices));
        }

        let mut positions = Vec::with_capacity(vertices * 3);
        let mut normals = Vec::with_capacity(vertices * 3);
        let mut tex_coords = Vec::with_capacity(vertices * 2);
        let mut indices = Vec::new();
        let mut offset = 0u16;
        for part in parts {
            positions.extend_from_slice(&part.positions);
            normals.extend(part.normals_or_zeroed());
            tex_coords.extend(part.tex_coords_or_zeroed());
            indices.extend(part.indices.iter().map(|i| i + offset));
            // the last part may end exactly at 65536 vertices
            offset = offset.wrapping_add(part.vertex_count() as u16);
        }

        Ok(Self {
            positions,
            indices,
            normals: Some(normals),
            tex_coords: Some(tex_coords),
        })
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn normals(&self) -> Option<&[f32]> {
        self.normals.as_deref()
    }

    pub fn tex_coords(&self) -> Option<&[f32]> {
        self.tex_coords.as_deref()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Normals, or one zero vector per vertex when the geometry has none.
    pub fn normals_or_zeroed(&self) -> Vec<f32> {
        self.normals
            .clone()
            .unwrap_or_else(|| vec![0.0; self.vertex_count() * 3])
    }

    /// Texture coordinates, or `(0, 0)` per vertex when the geometry has none.
    pub fn tex_coords_or_zeroed(&self) -> Vec<f32> {
        self.tex_coords
            .clone()
            .unwrap_or_else(|| vec![0.0; self.vertex_count() * 2])
    }
}

fn check_attribute(
    attribute: &'static str,
    data: Option<&[f32]>,
    components: usize,
    vertices: usize,
) -> Result<(), GeometryError> {
    match data {
        Some(data) if data.len() != vertices * components => Err(GeometryError::AttributeLength {
            attribute,
            vertices,
            expected: vertices * components,
            actual: data.len(),
        }),
        _ => Ok(()),
    }
}
