//! glTF/GLB backend: `Scene` → GLB (embedded positions + indices as a
//! single interleaved-free buffer split into two buffer views).

use std::collections::BTreeMap;

use crate::error::Result;
use crate::scene::{NodeId, Scene};

use super::glb::Glb;
use super::json::{
    Accessor, AccessorType, Buffer, BufferView, ComponentType, Mesh as JsonMesh, Node as JsonNode,
    Primitive, Root, Scene as JsonScene,
};

fn push_f32_slice(buffer: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        buffer.extend_from_slice(&v.to_le_bytes());
    }
}

fn push_u32_slice(buffer: &mut Vec<u8>, values: &[u32]) {
    for v in values {
        buffer.extend_from_slice(&v.to_le_bytes());
    }
}

fn build_node(scene: &Scene, node: NodeId, mesh_offset: &BTreeMap<u32, usize>) -> (JsonNode, Vec<usize>) {
    let data = scene.nodes.get(node);
    let transform = data.transform;
    let (scale, rotation, translation) = transform.to_scale_rotation_translation();
    let json_node = JsonNode {
        name: Some(data.name.clone()),
        children: Vec::new(), // filled by caller once child indices are known
        matrix: None,
        translation: Some(translation.into()),
        rotation: Some(rotation.into()),
        scale: Some(scale.into()),
        mesh: data.meshes.first().and_then(|m| mesh_offset.get(m)).copied(),
        extras: serde_json::Value::Null,
    };
    (json_node, data.children.iter().map(|c| c.0).collect())
}

/// Exports a scene to a single self-contained GLB (JSON chunk + one binary
/// buffer chunk holding every mesh's vertex/index data back to back).
pub fn export_gltf(scene: &Scene) -> Result<Vec<u8>> {
    let mut root = Root::default();
    root.asset.version = "2.0".to_string();
    root.asset.generator = Some("assetgraph".to_string());

    let mut bin = Vec::new();
    let mut mesh_offset = BTreeMap::new();

    for (mesh_index, mesh) in scene.meshes.iter().enumerate() {
        let position_view = root.buffer_views.len();
        let position_offset = bin.len();
        let floats: Vec<f32> = mesh.vertices.iter().flat_map(|v| [v.x, v.y, v.z]).collect();
        push_f32_slice(&mut bin, &floats);
        root.buffer_views.push(BufferView {
            buffer: 0,
            byte_offset: position_offset,
            byte_length: bin.len() - position_offset,
            byte_stride: None,
        });
        let position_accessor = root.accessors.len();
        root.accessors.push(Accessor {
            buffer_view: Some(position_view),
            byte_offset: 0,
            component_type: ComponentType::F32,
            count: mesh.vertices.len(),
            type_: AccessorType::Vec3,
            min: None,
            max: None,
        });

        let indices_view = root.buffer_views.len();
        let indices_offset = bin.len();
        let indices: Vec<u32> = mesh
            .faces
            .iter()
            .flat_map(|f| f.indices.iter().copied())
            .collect();
        push_u32_slice(&mut bin, &indices);
        root.buffer_views.push(BufferView {
            buffer: 0,
            byte_offset: indices_offset,
            byte_length: bin.len() - indices_offset,
            byte_stride: None,
        });
        let indices_accessor = root.accessors.len();
        root.accessors.push(Accessor {
            buffer_view: Some(indices_view),
            byte_offset: 0,
            component_type: ComponentType::U32,
            count: indices.len(),
            type_: AccessorType::Scalar,
            min: None,
            max: None,
        });

        root.meshes.push(JsonMesh {
            name: Some(mesh.name.clone()),
            primitives: vec![Primitive {
                attributes: BTreeMap::from([("POSITION".to_string(), position_accessor)]),
                indices: Some(indices_accessor),
                material: None,
                mode: 4,
            }],
        });
        mesh_offset.insert(mesh_index as u32, root.meshes.len() - 1);
    }

    root.buffers.push(Buffer {
        uri: None,
        byte_length: bin.len(),
    });

    // Build all nodes first (flat, matching the Scene arena's own layout),
    // then patch in each node's children by index.
    let mut json_nodes = Vec::with_capacity(scene.nodes.len());
    let mut child_lists = Vec::with_capacity(scene.nodes.len());
    for (_, _) in scene.nodes.iter() {
        json_nodes.push(JsonNode::default());
        child_lists.push(Vec::new());
    }
    for (id, _) in scene.nodes.iter() {
        let (node, children) = build_node(scene, id, &mesh_offset);
        json_nodes[id.0] = node;
        child_lists[id.0] = children;
    }
    for (id, children) in child_lists.into_iter().enumerate() {
        json_nodes[id].children = children;
    }
    root.nodes = json_nodes;

    // The Scene IR's arena root is exported as an ordinary glTF node too
    // (rather than only its children) so data attached directly to it, such
    // as meshes on a scene with no further hierarchy, is never dropped.
    root.scenes.push(JsonScene {
        nodes: vec![scene.root().0],
        name: None,
    });
    root.scene = Some(0);

    let json = serde_json::to_vec(&root).map_err(|e| {
        crate::error::Error::malformed(format!("failed to serialize glTF JSON: {e}"))
    })?;

    let glb = Glb {
        json,
        bin: if bin.is_empty() { None } else { Some(bin) },
    };
    Ok(glb.to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Face, Mesh};
    use glam::Vec3;

    #[test]
    fn exports_single_triangle_as_valid_glb() {
        let mut scene = Scene::new("root");
        let mut mesh = Mesh::new("tri");
        mesh.vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        mesh.faces = vec![Face::triangle(0, 1, 2)];
        let idx = scene.add_mesh(mesh);
        let root = scene.root();
        scene.nodes.get_mut(root).meshes.push(idx);

        let bytes = export_gltf(&scene).unwrap();
        assert_eq!(&bytes[0..4], b"glTF");

        let roundtrip = super::super::glb::Glb::from_bytes(&bytes).unwrap();
        assert!(roundtrip.bin.is_some());
    }
}
