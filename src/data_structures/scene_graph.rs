//! Scene graph: the node types and the scene that owns them.
//!
//! [`SceneNode`] is a closed set of variants. Every variant carries a
//! [`Transform`], a child list and a dirty flag through the [`Node`] trait.
//! The renderer matches on the variant instead of dispatching dynamically.
//!
//! Child lists exist so applications can group nodes, but the renderer only
//! visits the top level of a [`Scene`].

use std::{fmt, sync::Arc};

use cgmath::{Matrix4, Rad, Vector3};

use crate::{
    camera::Projection,
    data_structures::{
        geometry::Geometry, light::PointLight, material::Material, transform::Transform,
    },
    error::RenderError,
};

/// Position of a node in its scene's node list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Mesh,
    InstancedMesh,
    Light,
    Camera,
}

/// State shared by all node variants.
#[derive(Clone, Debug)]
pub struct NodeBase {
    transform: Transform,
    children: Vec<SceneNode>,
    dirty: bool,
}

impl NodeBase {
    fn new(transform: Transform) -> Self {
        Self {
            transform,
            children: Vec::new(),
            dirty: true,
        }
    }
}

/// Common accessors of every scene node.
///
/// All `_mut` accessors mark the node dirty so the renderer re-uploads its
/// uniforms on the next frame.
pub trait Node {
    fn base(&self) -> &NodeBase;
    fn base_mut(&mut self) -> &mut NodeBase;
    fn kind(&self) -> NodeKind;

    fn transform(&self) -> &Transform {
        &self.base().transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        let base = self.base_mut();
        base.dirty = true;
        &mut base.transform
    }

    fn children(&self) -> &[SceneNode] {
        &self.base().children
    }

    fn add_child(&mut self, child: SceneNode) {
        self.base_mut().children.push(child);
    }

    fn is_dirty(&self) -> bool {
        self.base().dirty
    }

    fn mark_dirty(&mut self) {
        self.base_mut().dirty = true;
    }
}

macro_rules! impl_node {
    ($ty:ty, $kind:expr) => {
        impl Node for $ty {
            fn base(&self) -> &NodeBase {
                &self.base
            }

            fn base_mut(&mut self) -> &mut NodeBase {
                &mut self.base
            }

            fn kind(&self) -> NodeKind {
                $kind
            }
        }
    };
}

/// One geometry drawn once with one material.
#[derive(Clone, Debug)]
pub struct MeshNode {
    base: NodeBase,
    geometry: Arc<Geometry>,
    material: Arc<Material>,
}

impl MeshNode {
    pub fn new(geometry: Arc<Geometry>, material: Arc<Material>) -> Self {
        Self {
            base: NodeBase::new(Transform::identity()),
            geometry,
            material,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.base.transform = transform;
        self
    }

    pub fn geometry(&self) -> &Arc<Geometry> {
        &self.geometry
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    pub fn set_geometry(&mut self, geometry: Arc<Geometry>) {
        self.geometry = geometry;
        self.base.dirty = true;
    }

    pub fn set_material(&mut self, material: Arc<Material>) {
        self.material = material;
        self.base.dirty = true;
    }
}

impl_node!(MeshNode, NodeKind::Mesh);

/// One geometry drawn `instance_count` times, once per instance transform.
///
/// The node's own transform is not applied to the instances.
#[derive(Clone, Debug)]
pub struct InstancedMeshNode {
    base: NodeBase,
    geometry: Arc<Geometry>,
    material: Arc<Material>,
    instance_count: u32,
    instances: Vec<Transform>,
}

impl InstancedMeshNode {
    /// Declares `instance_count` instances. Their transforms are pushed
    /// afterwards with [`push_instance`](Self::push_instance).
    pub fn new(geometry: Arc<Geometry>, material: Arc<Material>, instance_count: u32) -> Self {
        Self {
            base: NodeBase::new(Transform::identity()),
            geometry,
            material,
            instance_count,
            instances: Vec::with_capacity(instance_count as usize),
        }
    }

    /// Declares one instance per transform.
    pub fn from_instances(
        geometry: Arc<Geometry>,
        material: Arc<Material>,
        instances: Vec<Transform>,
    ) -> Self {
        Self {
            base: NodeBase::new(Transform::identity()),
            geometry,
            material,
            instance_count: instances.len() as u32,
            instances,
        }
    }

    pub fn geometry(&self) -> &Arc<Geometry> {
        &self.geometry
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    pub fn set_material(&mut self, material: Arc<Material>) {
        self.material = material;
        self.base.dirty = true;
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    pub fn set_instance_count(&mut self, instance_count: u32) {
        self.instance_count = instance_count;
        self.base.dirty = true;
    }

    /// Appends a transform without touching the declared instance count.
    pub fn push_instance(&mut self, transform: Transform) {
        self.instances.push(transform);
        self.base.dirty = true;
    }

    pub fn instance_transforms(&self) -> &[Transform] {
        &self.instances
    }

    pub fn instance_transforms_mut(&mut self) -> &mut [Transform] {
        self.base.dirty = true;
        &mut self.instances
    }

    /// Checks that one transform exists per declared instance.
    pub fn validate(&self, id: NodeId) -> Result<(), RenderError> {
        if self.instances.len() != self.instance_count as usize {
            return Err(RenderError::InstanceCountMismatch {
                node: id,
                declared: self.instance_count,
                actual: self.instances.len(),
            });
        }
        Ok(())
    }
}

impl_node!(InstancedMeshNode, NodeKind::InstancedMesh);

#[derive(Clone, Debug)]
pub struct LightNode {
    base: NodeBase,
    light: PointLight,
}

impl LightNode {
    /// The node transform starts at the light position. Later changes to
    /// either are not synchronised.
    pub fn new(light: PointLight) -> Self {
        Self {
            base: NodeBase::new(Transform::translate(light.position)),
            light,
        }
    }

    pub fn light(&self) -> &PointLight {
        &self.light
    }

    pub fn light_mut(&mut self) -> &mut PointLight {
        self.base.dirty = true;
        &mut self.light
    }
}

impl_node!(LightNode, NodeKind::Light);

/// A perspective camera. Its transform is a look-at transform, so the local
/// matrix is the view matrix.
#[derive(Clone, Debug)]
pub struct CameraNode {
    base: NodeBase,
    projection: Projection,
    projection_matrix: Matrix4<f32>,
}

impl CameraNode {
    pub fn new<F: Into<Rad<f32>>>(
        eye: Vector3<f32>,
        target: Vector3<f32>,
        up: Vector3<f32>,
        aspect_ratio: f32,
        fovy: F,
        znear: f32,
        zfar: f32,
    ) -> Self {
        let projection = Projection::new(aspect_ratio, fovy, znear, zfar);
        Self {
            base: NodeBase::new(Transform::look_at(eye, target, up)),
            projection_matrix: projection.calc_matrix(),
            projection,
        }
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn projection_matrix(&self) -> &Matrix4<f32> {
        &self.projection_matrix
    }

    pub fn view_matrix(&self) -> &Matrix4<f32> {
        self.base.transform.local_matrix()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.projection.aspect()
    }

    /// Recomputes the projection matrix. The view transform is untouched.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.projection.set_aspect(aspect_ratio);
        self.projection_matrix = self.projection.calc_matrix();
        self.base.dirty = true;
    }

    /// Matches the aspect ratio to a `width` × `height` render target.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
        self.projection_matrix = self.projection.calc_matrix();
        self.base.dirty = true;
    }

    /// Re-aims the camera. The projection is untouched.
    pub fn look_at(&mut self, eye: Vector3<f32>, target: Vector3<f32>, up: Vector3<f32>) {
        self.base.transform = Transform::look_at(eye, target, up);
        self.base.dirty = true;
    }
}

impl_node!(CameraNode, NodeKind::Camera);

#[derive(Clone, Debug)]
pub enum SceneNode {
    Mesh(MeshNode),
    InstancedMesh(InstancedMeshNode),
    Light(LightNode),
    Camera(CameraNode),
}

impl SceneNode {
    fn as_node(&self) -> &dyn Node {
        match self {
            SceneNode::Mesh(n) => n,
            SceneNode::InstancedMesh(n) => n,
            SceneNode::Light(n) => n,
            SceneNode::Camera(n) => n,
        }
    }

    fn as_node_mut(&mut self) -> &mut dyn Node {
        match self {
            SceneNode::Mesh(n) => n,
            SceneNode::InstancedMesh(n) => n,
            SceneNode::Light(n) => n,
            SceneNode::Camera(n) => n,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut MeshNode> {
        match self {
            SceneNode::Mesh(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_instanced_mesh_mut(&mut self) -> Option<&mut InstancedMeshNode> {
        match self {
            SceneNode::InstancedMesh(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_light(&self) -> Option<&LightNode> {
        match self {
            SceneNode::Light(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_light_mut(&mut self) -> Option<&mut LightNode> {
        match self {
            SceneNode::Light(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_drawable(&self) -> Option<Drawable<'_>> {
        match self {
            SceneNode::Mesh(n) => Some(Drawable::Mesh(n)),
            SceneNode::InstancedMesh(n) => Some(Drawable::InstancedMesh(n)),
            _ => None,
        }
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.base_mut().dirty = false;
    }
}

impl Node for SceneNode {
    fn base(&self) -> &NodeBase {
        self.as_node().base()
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        self.as_node_mut().base_mut()
    }

    fn kind(&self) -> NodeKind {
        self.as_node().kind()
    }
}

impl From<MeshNode> for SceneNode {
    fn from(node: MeshNode) -> Self {
        SceneNode::Mesh(node)
    }
}

impl From<InstancedMeshNode> for SceneNode {
    fn from(node: InstancedMeshNode) -> Self {
        SceneNode::InstancedMesh(node)
    }
}

impl From<LightNode> for SceneNode {
    fn from(node: LightNode) -> Self {
        SceneNode::Light(node)
    }
}

impl From<CameraNode> for SceneNode {
    fn from(node: CameraNode) -> Self {
        SceneNode::Camera(node)
    }
}

/// A borrowed node that produces draw calls.
#[derive(Clone, Copy, Debug)]
pub enum Drawable<'a> {
    Mesh(&'a MeshNode),
    InstancedMesh(&'a InstancedMeshNode),
}

impl<'a> Drawable<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Drawable::Mesh(_) => NodeKind::Mesh,
            Drawable::InstancedMesh(_) => NodeKind::InstancedMesh,
        }
    }

    pub fn geometry(&self) -> &'a Arc<Geometry> {
        match self {
            Drawable::Mesh(n) => &n.geometry,
            Drawable::InstancedMesh(n) => &n.geometry,
        }
    }

    pub fn material(&self) -> &'a Arc<Material> {
        match self {
            Drawable::Mesh(n) => &n.material,
            Drawable::InstancedMesh(n) => &n.material,
        }
    }

    pub fn is_dirty(&self) -> bool {
        match self {
            Drawable::Mesh(n) => n.is_dirty(),
            Drawable::InstancedMesh(n) => n.is_dirty(),
        }
    }

    pub fn instance_count(&self) -> u32 {
        match self {
            Drawable::Mesh(_) => 1,
            Drawable::InstancedMesh(n) => n.instance_count,
        }
    }

    /// The transforms whose world matrices place each instance.
    pub fn instance_transforms(&self) -> &'a [Transform] {
        match self {
            Drawable::Mesh(n) => std::slice::from_ref(&n.base.transform),
            Drawable::InstancedMesh(n) => &n.instances,
        }
    }
}

/// The active camera plus an ordered list of nodes.
///
/// The active camera is owned here and is never part of the node list.
/// Camera nodes added through [`add_node`](Self::add_node) are kept but never
/// drawn, lit or used for viewing.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    camera: Option<CameraNode>,
    nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(camera: CameraNode) -> Self {
        Self {
            camera: Some(camera),
            nodes: Vec::new(),
        }
    }

    pub fn camera(&self) -> Option<&CameraNode> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut CameraNode> {
        self.camera.as_mut()
    }

    /// Replaces the active camera and returns the previous one.
    pub fn set_camera(&mut self, camera: CameraNode) -> Option<CameraNode> {
        self.camera.replace(camera)
    }

    /// Appends a node; duplicates are allowed.
    pub fn add_node(&mut self, node: impl Into<SceneNode>) -> NodeId {
        self.nodes.push(node.into());
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn lights(&self) -> impl Iterator<Item = (NodeId, &LightNode)> {
        self.nodes()
            .filter_map(|(id, node)| node.as_light().map(|light| (id, light)))
    }

    /// Mesh and instanced mesh nodes in insertion order.
    pub fn drawables(&self) -> impl Iterator<Item = (NodeId, Drawable<'_>)> {
        self.nodes()
            .filter_map(|(id, node)| node.as_drawable().map(|drawable| (id, drawable)))
    }

    /// Camera nodes stored in the node list.
    pub fn cameras(&self) -> impl Iterator<Item = (NodeId, &CameraNode)> {
        self.nodes().filter_map(|(id, node)| match node {
            SceneNode::Camera(camera) => Some((id, camera)),
            _ => None,
        })
    }

    pub(crate) fn clear_dirty(&mut self) {
        if let Some(camera) = &mut self.camera {
            camera.base.dirty = false;
        }
        self.nodes.iter_mut().for_each(SceneNode::clear_dirty);
    }
}
