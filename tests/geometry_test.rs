use phong_ngin::{data_structures::geometry::Geometry, error::GeometryError};

#[test]
fn cube_has_flat_shaded_faces() {
    let cube = Geometry::cube(1.0);

    assert_eq!(cube.vertex_count(), 24);
    assert_eq!(cube.index_count(), 36);
    assert!(cube.indices().iter().all(|&i| i < 24));
    assert!(cube.positions().iter().all(|p| p.abs() == 0.5));
    assert_eq!(cube.normals().map(<[f32]>::len), Some(72));
    assert_eq!(cube.tex_coords().map(<[f32]>::len), Some(48));

    // every normal is an axis-aligned unit vector
    for n in cube.normals().unwrap().chunks_exact(3) {
        let length = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        approx::assert_abs_diff_eq!(length, 1.0);
    }
}

#[test]
fn cube_scales_with_size() {
    let cube = Geometry::cube(3.0);
    assert!(cube.positions().iter().all(|p| p.abs() == 1.5));
}

#[test]
fn plane_faces_up() {
    let plane = Geometry::plane(2.0);

    assert_eq!(plane.vertex_count(), 4);
    assert_eq!(plane.indices(), &[0, 1, 2, 0, 2, 3]);
    assert!(plane.positions().chunks_exact(3).all(|p| p[1] == 0.0));
    assert_eq!(plane.normals().unwrap(), [0.0f32, 1.0, 0.0].repeat(4).as_slice());
}

#[test]
fn new_validates_shapes() {
    assert_eq!(
        Geometry::new(vec![0.0; 4], vec![], None, None),
        Err(GeometryError::PositionsNotVec3(4))
    );
    assert_eq!(
        Geometry::new(vec![0.0; 9], vec![0, 1], None, None),
        Err(GeometryError::IndicesNotTriangles(2))
    );
    assert_eq!(
        Geometry::new(vec![0.0; 9], vec![0, 1, 2], Some(vec![0.0; 6]), None),
        Err(GeometryError::AttributeLength {
            attribute: "normal",
            vertices: 3,
            expected: 9,
            actual: 6,
        })
    );
    assert_eq!(
        Geometry::new(vec![0.0; 9], vec![0, 1, 2], None, Some(vec![0.0; 5])),
        Err(GeometryError::AttributeLength {
            attribute: "tex coord",
            vertices: 3,
            expected: 6,
            actual: 5,
        })
    );
    assert_eq!(
        Geometry::new(vec![0.0; 9], vec![0, 1, 3], None, None),
        Err(GeometryError::IndexOutOfRange {
            at: 2,
            index: 3,
            vertices: 3,
        })
    );
}

#[test]
fn missing_attributes_are_zero_filled() {
    let triangle = Geometry::new(vec![0.0; 9], vec![0, 1, 2], None, None).unwrap();
    assert_eq!(triangle.normals(), None);
    assert_eq!(triangle.normals_or_zeroed(), vec![0.0; 9]);
    assert_eq!(triangle.tex_coords_or_zeroed(), vec![0.0; 6]);
}

#[test]
fn bundle_offsets_indices_of_later_parts() {
    let triangle = Geometry::new(
        vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        vec![0, 1, 2],
        None,
        None,
    )
    .unwrap();
    let plane = Geometry::plane(1.0);

    let bundled = Geometry::bundle(&[&triangle, &plane]).unwrap();

    assert_eq!(bundled.vertex_count(), 7);
    assert_eq!(bundled.indices(), &[0, 1, 2, 3, 4, 5, 3, 5, 6]);
    let normals = bundled.normals().unwrap();
    assert_eq!(&normals[..9], &[0.0; 9]);
    assert_eq!(&normals[9..12], &[0.0, 1.0, 0.0]);
    assert_eq!(bundled.tex_coords().unwrap().len(), 14);
}

#[test]
fn bundle_rejects_more_vertices_than_u16_indices_reach() {
    let cube = Geometry::cube(1.0);
    // 2731 cubes of 24 vertices each
    let parts = vec![&cube; 2731];
    assert_eq!(
        Geometry::bundle(&parts),
        Err(GeometryError::TooManyVertices(65544))
    );

    let parts = vec![&cube; 2730];
    assert!(Geometry::bundle(&parts).is_ok());
}
