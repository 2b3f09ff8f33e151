//! The AMF document tree as a tagged union, following
//! `AMFImporter_Node.hpp`'s element hierarchy but expressed as an
//! exhaustively-matched Rust enum instead of a class hierarchy (the
//! "deep inheritance for node-element variants" redesign rule).

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmfColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmfTriangle {
    pub v1: u32,
    pub v2: u32,
    pub v3: u32,
    pub color: Option<AmfColor>,
    pub texture_map: Option<(u32, [f32; 2], [f32; 2], [f32; 2])>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmfVolume {
    pub material_id: Option<String>,
    pub triangles: Vec<AmfTriangle>,
    pub color: Option<AmfColor>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmfMesh {
    pub vertices: Vec<Vertex3>,
    pub volumes: Vec<AmfVolume>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmfObject {
    pub id: String,
    pub meshes: Vec<AmfMesh>,
    pub color: Option<AmfColor>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmfDelta {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Documented intent (`spec.md` §9): rotation angles in degrees about each
/// axis, independent of the translation `Delta`. The historical C++ source
/// instead overwrites `Delta` with these same values (`AMFImporter.cpp`) —
/// a transcription bug, not the intended semantics; this crate implements
/// the documented intent and locks it down with a regression test in
/// `amf::import`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmfRotationDegrees {
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmfInstance {
    pub object_id: String,
    pub delta: AmfDelta,
    pub rotation_degrees: AmfRotationDegrees,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmfConstellation {
    pub id: String,
    pub instances: Vec<AmfInstance>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmfMaterial {
    pub id: String,
    pub color: Option<AmfColor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmfTexture {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmfDocument {
    pub unit: String,
    pub objects: Vec<AmfObject>,
    pub constellations: Vec<AmfConstellation>,
    pub materials: Vec<AmfMaterial>,
    pub textures: Vec<AmfTexture>,
    pub metadata: Vec<(String, String)>,
}
