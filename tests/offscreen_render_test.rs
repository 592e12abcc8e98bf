//! Renders into an off-screen texture on a real adapter. Needs a GPU or a
//! software adapter, so it only runs with `--features integration-tests`.
#![cfg(feature = "integration-tests")]

use std::sync::Arc;

use cgmath::{Deg, Vector3};
use phong_ngin::{
    context::Context,
    data_structures::{
        geometry::Geometry,
        light::PointLight,
        material::PhongMaterial,
        scene_graph::{CameraNode, LightNode, MeshNode, Scene},
    },
    render::{Renderer, RendererConfig, UploadPolicy},
};

const SIZE: u32 = 64;

fn red_cube_scene() -> Scene {
    let camera = CameraNode::new(
        Vector3::new(0.0, 0.0, 3.0),
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::unit_y(),
        1.0,
        Deg(45.0),
        0.1,
        100.0,
    );
    let mut scene = Scene::with_camera(camera);
    // eye space: the light sits on the camera
    scene.add_node(LightNode::new(PointLight::new(
        [0.0, 0.0, 0.0],
        [1.0, 1.0, 1.0],
        1.0,
    )));
    let material = PhongMaterial::new([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], 1.0);
    scene.add_node(MeshNode::new(
        Arc::new(Geometry::cube(1.0)),
        Arc::new(material.into()),
    ));
    scene
}

fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
    let at = ((y * SIZE + x) * 4) as usize;
    [pixels[at], pixels[at + 1], pixels[at + 2], pixels[at + 3]]
}

fn render_offscreen(policy: UploadPolicy) -> Vec<u8> {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let ctx = runtime.block_on(Context::headless(SIZE, SIZE)).unwrap();
    let mut renderer = Renderer::with_config(
        ctx,
        RendererConfig {
            clear_color: wgpu::Color::BLUE,
            upload_policy: policy,
            ..Default::default()
        },
    );
    let mut scene = red_cube_scene();
    renderer.render(&mut scene).unwrap();
    renderer.render(&mut scene).unwrap();
    renderer.device().read_pixels().unwrap()
}

#[test]
fn should_clear_background_and_light_the_front_face() {
    let pixels = render_offscreen(UploadPolicy::PerFrame);
    assert_eq!(pixels.len(), (SIZE * SIZE * 4) as usize);

    assert_eq!(pixel(&pixels, 0, 0), [0, 0, 255, 255]);
    assert_eq!(pixel(&pixels, SIZE - 1, SIZE - 1), [0, 0, 255, 255]);

    let centre = pixel(&pixels, SIZE / 2, SIZE / 2);
    assert!(centre[0] > 100, "centre should be lit red, got {centre:?}");
    assert_eq!(centre[2], 0);
}

#[test]
fn retained_uploads_render_the_same_image() {
    assert_eq!(
        render_offscreen(UploadPolicy::PerFrame),
        render_offscreen(UploadPolicy::Retained)
    );
}
