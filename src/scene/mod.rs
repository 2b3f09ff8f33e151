//! C2: the Scene IR. A `Scene` owns dense, index-addressed arrays of
//! meshes/materials/textures/animations plus a node arena; every
//! cross-reference other than a node's parent back-pointer is a plain
//! integer index into one of these arrays, never a pointer or shared
//! handle.

mod node;
mod validate;

pub use node::{NodeArena, NodeData, NodeId, NodeWalk};

use crate::animation::Animation;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::metadata::Metadata;
use crate::texture::Texture;

bitflags::bitflags! {
    /// Importer-reported status flags for the whole scene.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SceneFlags: u32 {
        /// Some referenced data (e.g. an external texture) could not be
        /// resolved; the scene is still internally consistent.
        const INCOMPLETE = 0x1;
        /// `validate()` has been run successfully against this scene.
        const VALIDATED = 0x2;
        const VALIDATION_WARNING = 0x4;
        /// Importer emits simplified, non-hierarchical output (a single
        /// flat node with no meaningful transform hierarchy).
        const NON_VERBOSE_FORMAT = 0x8;
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub flags: SceneFlags,
    pub nodes: NodeArena,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub animations: Vec<Animation>,
    pub metadata: Metadata,
}

impl Scene {
    pub fn new(root_name: impl Into<String>) -> Self {
        Scene {
            flags: SceneFlags::empty(),
            nodes: NodeArena::new(root_name),
            meshes: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
            animations: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.nodes.root()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> u32 {
        self.meshes.push(mesh);
        (self.meshes.len() - 1) as u32
    }

    pub fn add_material(&mut self, material: Material) -> u32 {
        self.materials.push(material);
        (self.materials.len() - 1) as u32
    }

    pub fn add_texture(&mut self, texture: Texture) -> u32 {
        self.textures.push(texture);
        (self.textures.len() - 1) as u32
    }

    pub fn add_animation(&mut self, animation: Animation) -> u32 {
        self.animations.push(animation);
        (self.animations.len() - 1) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Face;
    use glam::Vec3;

    fn triangle_mesh() -> Mesh {
        let mut mesh = Mesh::new("tri");
        mesh.vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        mesh.faces = vec![Face::triangle(0, 1, 2)];
        mesh
    }

    #[test]
    fn fresh_scene_validates() {
        let scene = Scene::new("root");
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn mesh_index_out_of_range_is_first_checked() {
        let mut scene = Scene::new("root");
        scene.nodes.get_mut(scene.root()).meshes.push(0);
        let err = scene.validate().unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::InvariantViolation(crate::error::Invariant::MeshIndexOutOfRange)
        ));
    }

    #[test]
    fn face_index_out_of_range_detected() {
        let mut mesh = triangle_mesh();
        mesh.faces.push(Face::triangle(0, 1, 9));
        let mut scene = Scene::new("root");
        let idx = scene.add_mesh(mesh);
        scene.nodes.get_mut(scene.root()).meshes.push(idx);
        let err = scene.validate().unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::InvariantViolation(crate::error::Invariant::FaceIndexOutOfRange)
        ));
    }

    #[test]
    fn stream_length_mismatch_detected() {
        let mut mesh = triangle_mesh();
        mesh.normals = vec![Vec3::Z]; // length 1, vertices length 3
        let mut scene = Scene::new("root");
        let idx = scene.add_mesh(mesh);
        scene.nodes.get_mut(scene.root()).meshes.push(idx);
        let err = scene.validate().unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::InvariantViolation(crate::error::Invariant::StreamLengthMismatch)
        ));
    }

    #[test]
    fn arena_child_reparenting_preserves_tree_shape() {
        let mut scene = Scene::new("root");
        let a = scene.nodes.add_child(scene.root(), "a");
        let _b = scene.nodes.add_child(a, "b");
        assert!(scene.validate().is_ok());
        assert_eq!(scene.nodes.len(), 3);
    }

    #[test]
    fn bone_node_unresolved_detected() {
        use crate::mesh::{Bone, VertexWeight};
        let mut mesh = triangle_mesh();
        mesh.bones.push(Bone {
            name: "missing".into(),
            weights: vec![VertexWeight {
                vertex_id: 0,
                weight: 1.0,
            }],
            offset_matrix: glam::Mat4::IDENTITY,
        });
        let mut scene = Scene::new("root");
        let idx = scene.add_mesh(mesh);
        scene.nodes.get_mut(scene.root()).meshes.push(idx);
        let err = scene.validate().unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::InvariantViolation(crate::error::Invariant::BoneNodeUnresolved)
        ));
    }
}
