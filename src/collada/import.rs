//! COLLADA frontend: `library_geometries` + `library_visual_scenes` +
//! `library_materials`/`library_effects` → [`Scene`]. Accepts
//! `<COLLADA version="1.4.*|1.5.*">`, matching the two schema major
//! versions named in the external interfaces design.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

use crate::error::{Error, Result};
use crate::material::{keys as material_keys, Material, PropertyValue};
use crate::mesh::{Face, Mesh};
use crate::scene::Scene;
use crate::xml::{XmlNode, XmlTree};

fn parse_float_array(node: XmlNode<'_>) -> Vec<f32> {
    node.text()
        .split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect()
}

fn find_source<'a>(mesh_node: XmlNode<'a>, id: &str) -> Option<XmlNode<'a>> {
    mesh_node
        .children_named("source")
        .find(|s| s.attribute("id") == Some(id.trim_start_matches('#')))
}

fn source_floats(mesh_node: XmlNode<'_>, id: &str) -> Option<Vec<f32>> {
    let source = find_source(mesh_node, id)?;
    let array = source.child_named("float_array")?;
    Some(parse_float_array(array))
}

struct InputBinding {
    semantic: String,
    source_id: String,
    offset: usize,
}

fn parse_inputs(parent: XmlNode<'_>) -> Vec<InputBinding> {
    parent
        .children_named("input")
        .filter_map(|input| {
            let semantic = input.attribute("semantic")?.to_string();
            let source_id = input.attribute("source")?.to_string();
            let offset = input.attribute_uint("offset").unwrap_or(0) as usize;
            Some(InputBinding {
                semantic,
                source_id,
                offset,
            })
        })
        .collect()
}

fn lower_geometry(geometry_node: XmlNode<'_>) -> Result<Mesh> {
    let name = geometry_node
        .attribute("name")
        .or_else(|| geometry_node.attribute("id"))
        .unwrap_or("geometry")
        .to_string();
    let mesh_node = geometry_node
        .expect_one("mesh")
        .map_err(|_| Error::malformed("<geometry> missing <mesh>"))?;

    let mut mesh = Mesh::new(name);

    // `<triangles>` is the common case; `<polylist>`/`<polygons>` with
    // uniformly-3 vertex counts are treated identically since this Scene IR
    // stores faces as arbitrary index lists anyway.
    let primitive_node = mesh_node
        .child_named("triangles")
        .or_else(|| mesh_node.child_named("polylist"))
        .ok_or_else(|| Error::malformed("<mesh> has no <triangles>/<polylist>"))?;

    let inputs = parse_inputs(primitive_node);
    let position_input = inputs
        .iter()
        .find(|i| i.semantic == "VERTEX" || i.semantic == "POSITION")
        .ok_or_else(|| Error::malformed("primitive has no VERTEX/POSITION input"))?;

    // The VERTEX input points at a <vertices> element which itself wraps a
    // POSITION source; resolve one level of indirection if present.
    let position_source_id = mesh_node
        .child_named("vertices")
        .filter(|v| v.attribute("id") == Some(position_input.source_id.trim_start_matches('#')))
        .and_then(|v| v.children_named("input").find(|i| i.attribute("semantic") == Some("POSITION")))
        .and_then(|i| i.attribute("source").map(|s| s.to_string()))
        .unwrap_or_else(|| position_input.source_id.clone());

    let positions = source_floats(mesh_node, &position_source_id)
        .ok_or_else(|| Error::malformed("could not resolve POSITION source"))?;
    mesh.vertices = positions
        .chunks_exact(3)
        .map(|c| Vec3::new(c[0], c[1], c[2]))
        .collect();

    let stride = inputs.iter().map(|i| i.offset).max().map(|m| m + 1).unwrap_or(1);
    let p_node = primitive_node
        .child_named("p")
        .ok_or_else(|| Error::malformed("primitive has no <p> index list"))?;
    let indices: Vec<u32> = p_node
        .text()
        .split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect();

    let position_offset = position_input.offset;
    for chunk in indices.chunks_exact(stride * 3) {
        let mut face_indices = Vec::with_capacity(3);
        for v in 0..3 {
            face_indices.push(chunk[v * stride + position_offset]);
        }
        mesh.faces.push(Face {
            indices: face_indices,
        });
    }

    Ok(mesh)
}

fn parse_transform_stack(node: XmlNode<'_>) -> Mat4 {
    if let Some(matrix_node) = node.child_named("matrix") {
        let values: Vec<f32> = matrix_node
            .text()
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        if values.len() == 16 {
            // COLLADA <matrix> is row-major.
            return Mat4::from_cols_array(&[
                values[0], values[4], values[8], values[12],
                values[1], values[5], values[9], values[13],
                values[2], values[6], values[10], values[14],
                values[3], values[7], values[11], values[15],
            ]);
        }
    }

    let mut transform = Mat4::IDENTITY;
    if let Some(t) = node.child_named("translate") {
        let v: Vec<f32> = t.text().split_whitespace().filter_map(|s| s.parse().ok()).collect();
        if v.len() == 3 {
            transform *= Mat4::from_translation(Vec3::new(v[0], v[1], v[2]));
        }
    }
    for r in node.children_named("rotate") {
        let v: Vec<f32> = r.text().split_whitespace().filter_map(|s| s.parse().ok()).collect();
        if v.len() == 4 {
            let axis = Vec3::new(v[0], v[1], v[2]);
            if axis.length_squared() > 0.0 {
                transform *= Mat4::from_quat(Quat::from_axis_angle(axis.normalize(), v[3].to_radians()));
            }
        }
    }
    if let Some(s) = node.child_named("scale") {
        let v: Vec<f32> = s.text().split_whitespace().filter_map(|s| s.parse().ok()).collect();
        if v.len() == 3 {
            transform *= Mat4::from_scale(Vec3::new(v[0], v[1], v[2]));
        }
    }
    transform
}

fn lower_node(
    xml_node: XmlNode<'_>,
    scene: &mut Scene,
    parent: crate::scene::NodeId,
    geometry_meshes: &HashMap<String, u32>,
) {
    let name = xml_node
        .attribute("name")
        .or_else(|| xml_node.attribute("id"))
        .unwrap_or("node")
        .to_string();
    let node_id = scene.nodes.add_child(parent, name);
    scene.nodes.get_mut(node_id).transform = parse_transform_stack(xml_node);

    for instance in xml_node.children_named("instance_geometry") {
        if let Some(url) = instance.attribute("url") {
            let key = url.trim_start_matches('#');
            if let Some(&mesh_index) = geometry_meshes.get(key) {
                scene.nodes.get_mut(node_id).meshes.push(mesh_index);
            }
        }
    }

    for child in xml_node.children_named("node") {
        lower_node(child, scene, node_id, geometry_meshes);
    }
}

fn lower_material(effect_node: Option<XmlNode<'_>>, name: &str) -> Material {
    let mut material = Material::new(name);
    if let Some(effect) = effect_node {
        let color = effect
            .child_named("profile_COMMON")
            .and_then(|p| p.child_named("technique"))
            .and_then(|t| t.child_named("phong").or_else(|| t.child_named("lambert")))
            .and_then(|shading| shading.child_named("diffuse"))
            .and_then(|d| d.child_named("color"))
            .map(|c| c.text().split_whitespace().filter_map(|s| s.parse::<f32>().ok()).collect::<Vec<_>>());
        if let Some(values) = color {
            if values.len() >= 3 {
                let a = values.get(3).copied().unwrap_or(1.0);
                material.set(
                    material_keys::DIFFUSE_COLOR,
                    PropertyValue::Color([values[0], values[1], values[2], a]),
                );
            }
        }
    }
    material
}

pub fn import_collada(xml: &str) -> Result<Scene> {
    let tree = XmlTree::parse(xml.to_string())?;
    let root = tree.root_element();
    if root.tag_name() != "COLLADA" {
        return Err(Error::malformed(format!(
            "expected <COLLADA> root element, found <{}>",
            root.tag_name()
        )));
    }
    let version = root.attribute("version").unwrap_or("");
    if !(version.starts_with("1.4") || version.starts_with("1.5")) {
        return Err(Error::UnsupportedVariant(format!(
            "unsupported COLLADA version '{version}'"
        )));
    }

    let mut scene = Scene::new("collada-root");
    let scene_root = scene.root();

    let mut geometry_meshes = HashMap::new();
    if let Some(lib) = root.child_named("library_geometries") {
        for geometry in lib.children_named("geometry") {
            let Some(id) = geometry.attribute("id") else {
                continue;
            };
            match lower_geometry(geometry) {
                Ok(mesh) => {
                    let idx = scene.add_mesh(mesh);
                    geometry_meshes.insert(id.to_string(), idx);
                }
                Err(e) => log::warn!("skipping unsupported geometry '{id}': {e}"),
            }
        }
    }

    if let Some(lib) = root.child_named("library_effects") {
        let effects: HashMap<&str, XmlNode> = lib
            .children_named("effect")
            .filter_map(|e| e.attribute("id").map(|id| (id, e)))
            .collect();
        if let Some(materials_lib) = root.child_named("library_materials") {
            for material_node in materials_lib.children_named("material") {
                let name = material_node.attribute("name").unwrap_or("material");
                let effect_url = material_node
                    .child_named("instance_effect")
                    .and_then(|ie| ie.attribute("url"))
                    .map(|u| u.trim_start_matches('#'));
                let effect = effect_url.and_then(|url| effects.get(url)).copied();
                scene.add_material(lower_material(effect, name));
            }
        }
    }

    if let Some(lib) = root.child_named("library_visual_scenes") {
        if let Some(visual_scene) = lib.children_named("visual_scene").next() {
            for node in visual_scene.children_named("node") {
                lower_node(node, &mut scene, scene_root, &geometry_meshes);
            }
        }
    }

    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_COLLADA: &str = r#"<?xml version="1.0"?>
<COLLADA version="1.4.1" xmlns="http://www.collada.org/2005/11/COLLADASchema">
  <library_geometries>
    <geometry id="tri-mesh">
      <mesh>
        <source id="tri-positions">
          <float_array id="tri-positions-array" count="9">0 0 0 1 0 0 0 1 0</float_array>
        </source>
        <vertices id="tri-vertices">
          <input semantic="POSITION" source="#tri-positions"/>
        </vertices>
        <triangles count="1">
          <input semantic="VERTEX" source="#tri-vertices" offset="0"/>
          <p>0 1 2</p>
        </triangles>
      </mesh>
    </geometry>
  </library_geometries>
  <library_visual_scenes>
    <visual_scene id="scene">
      <node id="node0" name="node0">
        <instance_geometry url="#tri-mesh"/>
      </node>
    </visual_scene>
  </library_visual_scenes>
</COLLADA>"#;

    #[test]
    fn parses_triangle_geometry_and_node() {
        let scene = import_collada(SIMPLE_COLLADA).unwrap();
        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.meshes[0].vertices.len(), 3);
        assert_eq!(scene.meshes[0].faces.len(), 1);
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn rejects_unsupported_version() {
        let xml = SIMPLE_COLLADA.replace("1.4.1", "2.0.0");
        assert!(matches!(import_collada(&xml), Err(Error::UnsupportedVariant(_))));
    }
}
