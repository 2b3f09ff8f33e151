//! glTF/GLB frontend: resolves buffers (GLB `BIN` chunk, `data:` URI, or an
//! external file relative to the import root — the three sources named by
//! the teacher's historical `import::Source::buffer`), reads accessors into
//! mesh vertex/index streams, and lowers the node hierarchy.

use std::path::Path;

use glam::{Mat4, Quat, Vec3};

use crate::error::{Error, Result};
use crate::io::IoSystem;
use crate::mesh::{Face, Mesh, PrimitiveKind};
use crate::scene::{NodeId, Scene};

use super::glb::Glb;
use super::json::{AccessorType, ComponentType, Root};

const DATA_URI_PREFIX: &str = "data:";

fn resolve_buffer(
    root: &Root,
    buffer_index: usize,
    glb_bin: Option<&[u8]>,
    io: &dyn IoSystem,
    base_path: &Path,
) -> Result<Vec<u8>> {
    let buffer = root
        .buffers
        .get(buffer_index)
        .ok_or_else(|| Error::malformed(format!("buffer index {buffer_index} out of range")))?;

    match &buffer.uri {
        None => glb_bin
            .map(|b| b.to_vec())
            .ok_or_else(|| Error::malformed("buffer has no uri and there is no GLB BIN chunk")),
        Some(uri) if uri.starts_with(DATA_URI_PREFIX) => {
            let comma = uri
                .find(',')
                .ok_or_else(|| Error::malformed("malformed data: URI"))?;
            let payload = &uri[comma + 1..];
            Ok(base64::decode_data_uri(payload))
        }
        Some(uri) => {
            let decoded = urlencoding::decode(uri)
                .map_err(|_| Error::malformed("buffer uri is not valid percent-encoding"))?;
            io.read_to_vec(&base_path.join(decoded.as_ref()))
        }
    }
}

mod base64 {
    use ::base64::Engine as _;

    pub fn decode_data_uri(payload: &str) -> Vec<u8> {
        ::base64::engine::general_purpose::STANDARD
            .decode(payload)
            .unwrap_or_default()
    }
}

fn get<T>(slice: &[T], index: usize, what: &str) -> Result<&T> {
    slice
        .get(index)
        .ok_or_else(|| Error::malformed(format!("{what} index {index} out of range")))
}

fn checked_slice(buffer: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    buffer
        .get(offset..offset + len)
        .ok_or_else(|| Error::malformed("accessor reads past the end of its buffer"))
}

struct Accessors<'a> {
    root: &'a Root,
    buffers: Vec<Vec<u8>>,
}

impl<'a> Accessors<'a> {
    fn read_floats(&self, accessor_index: usize) -> Result<Vec<f32>> {
        let accessor = get(&self.root.accessors, accessor_index, "accessor")?;
        let view_index = accessor
            .buffer_view
            .ok_or_else(|| Error::malformed("sparse/view-less accessors are not supported"))?;
        let view = get(&self.root.buffer_views, view_index, "buffer view")?;
        let buffer = get(&self.buffers, view.buffer, "buffer")?;

        let components = accessor.type_.components();
        let component_size = accessor.component_type.size();
        let stride = view.byte_stride.unwrap_or(components * component_size);

        let mut out = Vec::with_capacity(accessor.count * components);
        let base = view.byte_offset + accessor.byte_offset;
        for i in 0..accessor.count {
            let elem_offset = base + i * stride;
            for c in 0..components {
                let value_offset = elem_offset + c * component_size;
                let bytes = checked_slice(buffer, value_offset, component_size)?;
                let value = match accessor.component_type {
                    ComponentType::F32 => f32::from_le_bytes(bytes.try_into().unwrap()),
                    ComponentType::U8 => bytes[0] as f32,
                    ComponentType::U16 => u16::from_le_bytes(bytes.try_into().unwrap()) as f32,
                    ComponentType::U32 => u32::from_le_bytes(bytes.try_into().unwrap()) as f32,
                    ComponentType::I8 => bytes[0] as i8 as f32,
                    ComponentType::I16 => i16::from_le_bytes(bytes.try_into().unwrap()) as f32,
                };
                out.push(value);
            }
        }
        Ok(out)
    }

    fn read_indices(&self, accessor_index: usize) -> Result<Vec<u32>> {
        let accessor = get(&self.root.accessors, accessor_index, "accessor")?;
        if accessor.type_ != AccessorType::Scalar {
            return Err(Error::malformed("index accessor must be SCALAR"));
        }
        let view_index = accessor
            .buffer_view
            .ok_or_else(|| Error::malformed("sparse index accessors are not supported"))?;
        let view = get(&self.root.buffer_views, view_index, "buffer view")?;
        let buffer = get(&self.buffers, view.buffer, "buffer")?;
        let component_size = accessor.component_type.size();
        let stride = view.byte_stride.unwrap_or(component_size);
        let base = view.byte_offset + accessor.byte_offset;

        let mut out = Vec::with_capacity(accessor.count);
        for i in 0..accessor.count {
            let offset = base + i * stride;
            let bytes = checked_slice(buffer, offset, component_size)?;
            let value = match accessor.component_type {
                ComponentType::U8 => bytes[0] as u32,
                ComponentType::U16 => u16::from_le_bytes(bytes.try_into().unwrap()) as u32,
                ComponentType::U32 => u32::from_le_bytes(bytes.try_into().unwrap()),
                other => {
                    return Err(Error::malformed(format!(
                        "unsupported index component type {other:?}"
                    )))
                }
            };
            out.push(value);
        }
        Ok(out)
    }
}

fn lower_mesh(root: &Root, accessors: &Accessors, mesh_index: usize) -> Result<Mesh> {
    let gltf_mesh = &root.meshes[mesh_index];
    let mut mesh = Mesh::new(gltf_mesh.name.clone().unwrap_or_default());

    // Only the first primitive is lowered into this mesh; additional
    // primitives in the same glTF mesh would need their own material index
    // per sub-range, which this Scene IR does not model (one material index
    // per `Mesh`). This mirrors the same simplification this crate makes
    // for 3MF's per-triangle property groups.
    let Some(primitive) = gltf_mesh.primitives.first() else {
        return Ok(mesh);
    };

    if primitive.mode != 4 {
        log::warn!("skipping non-triangle-list primitive (mode {})", primitive.mode);
        return Ok(mesh);
    }

    if let Some(&position_accessor) = primitive.attributes.get("POSITION") {
        let floats = accessors.read_floats(position_accessor)?;
        mesh.vertices = floats.chunks_exact(3).map(|c| Vec3::new(c[0], c[1], c[2])).collect();
    }
    if let Some(&normal_accessor) = primitive.attributes.get("NORMAL") {
        let floats = accessors.read_floats(normal_accessor)?;
        mesh.normals = floats.chunks_exact(3).map(|c| Vec3::new(c[0], c[1], c[2])).collect();
    }

    if let Some(indices_accessor) = primitive.indices {
        let indices = accessors.read_indices(indices_accessor)?;
        mesh.faces = indices
            .chunks_exact(3)
            .map(|c| Face::triangle(c[0], c[1], c[2]))
            .collect();
    } else {
        mesh.faces = (0..mesh.vertices.len() as u32)
            .collect::<Vec<_>>()
            .chunks_exact(3)
            .map(|c| Face::triangle(c[0], c[1], c[2]))
            .collect();
    }
    mesh.primitive_kinds = PrimitiveKind::TRIANGLE;
    if let Some(material_index) = primitive.material {
        mesh.material_index = material_index as u32;
    }

    Ok(mesh)
}

fn node_local_transform(node: &super::json::Node) -> Mat4 {
    if let Some(m) = node.matrix {
        return Mat4::from_cols_array(&m);
    }
    let t = node.translation.map(Vec3::from).unwrap_or(Vec3::ZERO);
    let r = node
        .rotation
        .map(|q| Quat::from_xyzw(q[0], q[1], q[2], q[3]))
        .unwrap_or(Quat::IDENTITY);
    let s = node.scale.map(Vec3::from).unwrap_or(Vec3::ONE);
    Mat4::from_scale_rotation_translation(s, r, t)
}

fn lower_node(
    root: &Root,
    gltf_node_index: usize,
    scene: &mut Scene,
    parent: NodeId,
    mesh_indices: &[u32],
) {
    let gltf_node = &root.nodes[gltf_node_index];
    let name = gltf_node
        .name
        .clone()
        .unwrap_or_else(|| format!("node{gltf_node_index}"));
    let node_id = scene.nodes.add_child(parent, name);
    scene.nodes.get_mut(node_id).transform = node_local_transform(gltf_node);

    if let Some(mesh_index) = gltf_node.mesh {
        if let Some(&scene_mesh_index) = mesh_indices.get(mesh_index) {
            scene.nodes.get_mut(node_id).meshes.push(scene_mesh_index);
        }
    }

    for &child_index in &gltf_node.children {
        lower_node(root, child_index, scene, node_id, mesh_indices);
    }
}

/// Imports a `.gltf` (JSON, buffers resolved via `io`) or `.glb` document.
pub fn import_gltf(bytes: &[u8], io: &dyn IoSystem, base_path: &Path) -> Result<Scene> {
    let (json_bytes, glb_bin) = if bytes.starts_with(b"glTF") {
        let glb = Glb::from_bytes(bytes)?;
        (glb.json, glb.bin)
    } else {
        (bytes.to_vec(), None)
    };

    let root: Root = serde_json::from_slice(&json_bytes)
        .map_err(|e| Error::malformed(format!("invalid glTF JSON: {e}")))?;

    if !root.asset.version.starts_with('2') {
        return Err(Error::UnsupportedVariant(format!(
            "unsupported glTF version '{}'",
            root.asset.version
        )));
    }

    let mut buffers = Vec::with_capacity(root.buffers.len());
    for i in 0..root.buffers.len() {
        buffers.push(resolve_buffer(&root, i, glb_bin.as_deref(), io, base_path)?);
    }
    let accessors = Accessors { root: &root, buffers };

    let mut scene = Scene::new("gltf-root");
    let mut mesh_indices = Vec::with_capacity(root.meshes.len());
    for i in 0..root.meshes.len() {
        let mesh = lower_mesh(&root, &accessors, i)?;
        mesh_indices.push(scene.add_mesh(mesh));
    }

    let scene_root = scene.root();
    if let Some(default_scene) = root.scene.and_then(|i| root.scenes.get(i)) {
        for &node_index in &default_scene.nodes {
            lower_node(&root, node_index, &mut scene, scene_root, &mesh_indices);
        }
    }

    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryIoSystem;

    fn minimal_gltf_json() -> Vec<u8> {
        br#"{
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"nodes": [0]}],
            "nodes": [{"name": "n0", "mesh": 0}],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1, "mode": 4}]}],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"},
                {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
            ],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 0, "byteLength": 36},
                {"buffer": 0, "byteOffset": 36, "byteLength": 6}
            ],
            "buffers": [{"byteLength": 42}]
        }"#
        .to_vec()
    }

    #[test]
    fn imports_embedded_triangle_via_glb_bin_chunk() {
        let json = minimal_gltf_json();
        let mut bin = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        for i in [0u16, 1, 2] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        let glb = Glb {
            json,
            bin: Some(bin),
        };
        let bytes = glb.to_bytes();

        let io = MemoryIoSystem::new();
        let scene = import_gltf(&bytes, &io, Path::new("")).unwrap();
        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.meshes[0].vertices.len(), 3);
        assert_eq!(scene.meshes[0].faces.len(), 1);
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn rejects_unsupported_major_version() {
        let json = br#"{"asset": {"version": "1.0"}}"#.to_vec();
        let io = MemoryIoSystem::new();
        assert!(matches!(
            import_gltf(&json, &io, Path::new("")),
            Err(Error::UnsupportedVariant(_))
        ));
    }
}
