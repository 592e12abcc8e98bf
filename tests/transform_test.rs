use approx::assert_abs_diff_eq;
use cgmath::{Deg, InnerSpace, Matrix4, Quaternion, Rotation3, SquareMatrix, Vector3, Vector4};
use phong_ngin::{
    data_structures::transform::{Transform, normal_matrix},
    render::TransformUniform,
};

use crate::common::test_utils::assert_matrix_eq;

mod common;

fn assert_local_is_inverse(transform: &Transform) {
    let product = transform.world_matrix() * transform.local_matrix();
    assert_matrix_eq(&product, &Matrix4::identity(), 1e-5);
}

#[test]
fn identity_has_identity_matrices() {
    let transform = Transform::identity();
    assert_matrix_eq(transform.world_matrix(), &Matrix4::identity(), 0.0);
    assert_matrix_eq(transform.local_matrix(), &Matrix4::identity(), 0.0);
}

#[test]
fn local_stays_inverse_of_world_after_every_setter() {
    let mut transform = Transform::identity();

    transform.set_position(Vector3::new(1.0, -2.0, 3.5));
    assert_local_is_inverse(&transform);

    transform.set_rotation(Quaternion::from_axis_angle(
        Vector3::new(1.0, 1.0, 0.0).normalize(),
        Deg(37.0),
    ));
    assert_local_is_inverse(&transform);

    transform.set_scale(Vector3::new(2.0, 0.5, 4.0));
    assert_local_is_inverse(&transform);
}

#[test]
fn world_composes_translation_rotation_scale() {
    let rotation = Quaternion::from_angle_y(Deg(90.0));
    let transform = Transform::new(
        Vector3::new(10.0, 0.0, 0.0),
        rotation,
        Vector3::new(2.0, 2.0, 2.0),
    );
    // scale, then rotate +X onto -Z, then translate
    let p = transform.world_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
    assert_abs_diff_eq!(p.x, 10.0, epsilon = 1e-5);
    assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(p.z, -2.0, epsilon = 1e-5);
}

#[test]
fn translate_only_moves() {
    let transform = Transform::translate(Vector3::new(1.0, 2.0, 3.0));
    assert_eq!(transform.scale(), Vector3::new(1.0, 1.0, 1.0));
    assert_matrix_eq(
        transform.world_matrix(),
        &Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0)),
        0.0,
    );
    assert_matrix_eq(
        transform.local_matrix(),
        &Matrix4::from_translation(Vector3::new(-1.0, -2.0, -3.0)),
        1e-6,
    );
}

#[test]
fn basis_vectors_are_world_columns() {
    let transform = Transform::new(
        Vector3::new(0.0, 0.0, 0.0),
        Quaternion::from_angle_z(Deg(90.0)),
        Vector3::new(1.0, 1.0, 1.0),
    );
    let right = transform.right();
    let up = transform.up();
    let forward = transform.forward();

    assert_abs_diff_eq!(right.y, 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(up.x, -1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(forward.z, 1.0, epsilon = 1e-6);
}

#[test]
fn look_at_stores_view_as_local() {
    let eye = Vector3::new(0.0, 3.0, 4.0);
    let transform = Transform::look_at(eye, Vector3::new(0.0, 0.0, 0.0), Vector3::unit_y());

    assert_eq!(transform.position(), eye);
    assert_local_is_inverse(&transform);
    // the camera sits at `eye` in world space
    let origin = transform.world_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
    assert_abs_diff_eq!(origin.y, 3.0, epsilon = 1e-5);
    assert_abs_diff_eq!(origin.z, 4.0, epsilon = 1e-5);
    // the target ends up straight ahead (-Z) in view space
    let target = transform.local_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
    assert_abs_diff_eq!(target.x, 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(target.y, 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(target.z, -5.0, epsilon = 1e-5);
    // the derived rotation reproduces the world basis
    let rotated = transform.rotation() * Vector3::unit_z();
    let forward = transform.forward();
    assert_abs_diff_eq!((rotated - forward).magnitude(), 0.0, epsilon = 1e-5);
}

#[test]
fn degenerate_inputs_produce_nan_instead_of_panicking() {
    let mut flat = Transform::identity();
    flat.set_scale(Vector3::new(1.0, 0.0, 1.0));
    assert!(!flat.is_finite());

    let same_point = Transform::look_at(
        Vector3::new(1.0, 1.0, 1.0),
        Vector3::new(1.0, 1.0, 1.0),
        Vector3::unit_y(),
    );
    assert!(!same_point.is_finite());
}

#[test]
fn normal_matrix_keeps_normals_perpendicular_under_non_uniform_scale() {
    // a plane tilted by 45 degrees, seen through a view that squashes the axes
    let world = *Transform::new(
        Vector3::new(0.0, 0.0, 0.0),
        Quaternion::from_angle_z(Deg(45.0)),
        Vector3::new(1.0, 1.0, 1.0),
    )
    .world_matrix();
    let view = Matrix4::from_nonuniform_scale(3.0, 1.0, 0.5);
    let uniform = TransformUniform::new(&view, &world);

    let tangent = (uniform.model_view() * Vector4::new(1.0, 0.0, 0.0, 0.0)).truncate();
    let normal = (uniform.normal() * Vector4::new(0.0, 1.0, 0.0, 0.0)).truncate();
    assert_abs_diff_eq!(tangent.dot(normal), 0.0, epsilon = 1e-5);

    // the model-view matrix alone would skew the normal
    let naive = (uniform.model_view() * Vector4::new(0.0, 1.0, 0.0, 0.0)).truncate();
    assert!(tangent.dot(naive).abs() > 0.1);

    assert_matrix_eq(&uniform.normal(), &normal_matrix(&(view * world)), 1e-6);
}
