use std::{sync::Arc, time::Duration};

use phong_ngin::{
    Deg, InnerSpace, Quaternion, Rad, Rotation3, Vector3, WindowEvent,
    context::Context,
    data_structures::{
        geometry::Geometry,
        light::PointLight,
        material::PhongMaterial,
        scene_graph::{CameraNode, InstancedMeshNode, LightNode, NodeId, Scene, SceneNode},
        transform::Transform,
    },
    flow::{GraphicsFlow, run},
    render::{RendererConfig, UploadPolicy},
};
use winit::{
    event::{ElementState, KeyEvent},
    keyboard::{KeyCode, PhysicalKey},
};

const GRID: usize = 10;
const SPACING: f32 = 2.0;
const ORBIT_RADIUS: f32 = 30.0;

struct InstancedCubes {
    cubes: Option<NodeId>,
    angle: Rad<f32>,
    paused: bool,
}

impl InstancedCubes {
    fn new() -> Self {
        Self {
            cubes: None,
            angle: Rad(0.0),
            paused: false,
        }
    }

    fn eye(&self) -> Vector3<f32> {
        Vector3::new(
            ORBIT_RADIUS * self.angle.0.cos(),
            ORBIT_RADIUS * 0.5,
            ORBIT_RADIUS * self.angle.0.sin(),
        )
    }
}

fn grid() -> Vec<Transform> {
    let offset = (GRID - 1) as f32 * SPACING / 2.0;
    (0..GRID * GRID)
        .map(|i| {
            let x = (i % GRID) as f32 * SPACING - offset;
            let z = (i / GRID) as f32 * SPACING - offset;
            Transform::translate(Vector3::new(x, 0.0, z))
        })
        .collect()
}

impl GraphicsFlow for InstancedCubes {
    fn on_init(&mut self, ctx: &Context) -> anyhow::Result<Scene> {
        let (width, height) = ctx.size();
        let camera = CameraNode::new(
            self.eye(),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
            width as f32 / height.max(1) as f32,
            Deg(45.0),
            0.1,
            200.0,
        );
        let mut scene = Scene::with_camera(camera);
        // eye space, slightly above the camera
        scene.add_node(LightNode::new(PointLight::new(
            [0.0, 5.0, 0.0],
            [1.0, 1.0, 1.0],
            1.0,
        )));

        let material = PhongMaterial::new([0.8, 0.3, 0.2], [0.6, 0.6, 0.6], 32.0);
        let cubes = InstancedMeshNode::from_instances(
            Arc::new(Geometry::cube(1.0)),
            Arc::new(material.into()),
            grid(),
        );
        self.cubes = Some(scene.add_node(cubes));
        log::info!("spawned {} cubes", GRID * GRID);
        Ok(scene)
    }

    fn on_update(&mut self, scene: &mut Scene, dt: Duration) {
        if self.paused {
            return;
        }
        self.angle += Rad(dt.as_secs_f32() * 0.3);
        let eye = self.eye();
        if let Some(camera) = scene.camera_mut() {
            camera.look_at(eye, Vector3::new(0.0, 0.0, 0.0), Vector3::unit_y());
        }

        let axis = Vector3::new(1.0, 1.0, 0.0).normalize();
        let spin = Quaternion::from_axis_angle(axis, self.angle * 2.0);
        let cubes = self
            .cubes
            .and_then(|id| scene.node_mut(id))
            .and_then(SceneNode::as_instanced_mesh_mut);
        if let Some(cubes) = cubes {
            for transform in cubes.instance_transforms_mut() {
                transform.set_rotation(spin);
            }
        }
    }

    fn on_window_events(&mut self, _scene: &mut Scene, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(KeyCode::Space),
                    state: ElementState::Pressed,
                    repeat: false,
                    ..
                },
            ..
        } = event
        {
            self.paused = !self.paused;
        }
    }

    fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            upload_policy: UploadPolicy::Retained,
            clear_color: phong_ngin::Color {
                r: 0.02,
                g: 0.02,
                b: 0.05,
                a: 1.0,
            },
            ..Default::default()
        }
    }

    fn title(&self) -> &str {
        "Instanced cubes"
    }
}

fn main() -> anyhow::Result<()> {
    run(InstancedCubes::new())
}
