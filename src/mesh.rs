//! Mesh data: vertex streams, faces, bones. Field layout follows
//! `fkoep-assimp_import-rs`'s `Mesh`/`Face`/`Bone`/`VertexWeight`, translated
//! from raw FFI arrays into owned `Vec`s.

use bitflags::bitflags;
use glam::Vec3;

bitflags! {
    /// Which primitive kinds a mesh's faces contain. A mesh produced by an
    /// importer that mixes triangles and polygons sets both bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PrimitiveKind: u32 {
        const POINT    = 0x1;
        const LINE     = 0x2;
        const TRIANGLE = 0x4;
        const POLYGON  = 0x8;
    }
}

pub const MAX_UV_CHANNELS: usize = 8;
pub const MAX_COLOR_CHANNELS: usize = 8;

/// A single polygon as a list of indices into the mesh's vertex streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Face {
    pub indices: Vec<u32>,
}

impl Face {
    pub fn triangle(a: u32, b: u32, c: u32) -> Self {
        Face {
            indices: vec![a, b, c],
        }
    }
}

/// One bone's influence on a subset of the mesh's vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexWeight {
    pub vertex_id: u32,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Name of the node this bone is bound to (resolved against the scene's
    /// node tree at validation time, invariant `BoneNodeUnresolved`).
    pub name: String,
    pub weights: Vec<VertexWeight>,
    /// Transforms a vertex from mesh space into bone space at rest pose.
    pub offset_matrix: glam::Mat4,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub primitive_kinds: PrimitiveKind,
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
    pub bitangents: Vec<Vec3>,
    /// Up to [`MAX_COLOR_CHANNELS`] parallel vertex color streams.
    pub colors: Vec<Vec<[f32; 4]>>,
    /// Up to [`MAX_UV_CHANNELS`] parallel texture coordinate streams.
    pub texture_coords: Vec<Vec<Vec3>>,
    /// Number of components (2 or 3) actually meaningful in each
    /// `texture_coords` channel.
    pub num_uv_components: Vec<u32>,
    pub faces: Vec<Face>,
    pub bones: Vec<Bone>,
    /// Index into `Scene::materials`.
    pub material_index: u32,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Mesh {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}
