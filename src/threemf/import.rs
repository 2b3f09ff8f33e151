//! 3MF frontend: OPC package → `<model><resources>` dictionary → `<build>`
//! walk, lowering into a [`Scene`]. Grounded on `XmlSerializer.cpp`'s
//! `ImportXml`/`ReadBuildItem`/`parseTransformMatrix`.

use glam::{Mat4, Vec3};

use crate::error::{Error, Result};
use crate::material::{keys as material_keys, Material, PropertyValue};
use crate::mesh::{Face, Mesh};
use crate::opc::OpcPackage;
use crate::scene::Scene;
use crate::xml::XmlTree;

use super::resources::{self, Resources};

/// Parses a 3MF build-item `transform` attribute: 12 space-separated
/// numbers, the first nine forming the 3x3 linear part column-major (columns
/// `m[0..3]`, `m[3..6]`, `m[6..9]`), the last three the translation. The
/// implicit fourth row is always `(0, 0, 0, 1)`.
pub fn parse_transform(text: &str) -> Result<Mat4> {
    let values: Vec<f32> = text
        .split_whitespace()
        .map(|s| s.parse::<f32>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| Error::malformed("transform attribute is not all numbers"))?;
    if values.len() != 12 {
        return Err(Error::malformed(format!(
            "transform attribute must have 12 numbers, found {}",
            values.len()
        )));
    }
    let col0 = Vec3::new(values[0], values[1], values[2]);
    let col1 = Vec3::new(values[3], values[4], values[5]);
    let col2 = Vec3::new(values[6], values[7], values[8]);
    let translation = Vec3::new(values[9], values[10], values[11]);
    Ok(Mat4::from_cols(
        col0.extend(0.0),
        col1.extend(0.0),
        col2.extend(0.0),
        translation.extend(1.0),
    ))
}

fn material_from_resource(resources: &Resources, pid: u32, p_index: Option<u32>) -> Option<Material> {
    if let Some(group) = resources.color_groups.get(&pid) {
        let index = p_index? as usize;
        let color = group.colors.get(index)?.clone()?;
        let mut material = Material::new("3mf-color");
        material.set(material_keys::DIFFUSE_COLOR, PropertyValue::Color(color));
        return Some(material);
    }
    if let Some(group) = resources.base_materials.get(&pid) {
        let index = p_index? as usize;
        let (name, color) = group.bases.get(index)?.clone();
        let mut material = Material::new(name);
        if let Some(color) = color {
            material.set(material_keys::DIFFUSE_COLOR, PropertyValue::Color(color));
        }
        return Some(material);
    }
    None
}

fn lower_object(
    object: &resources::Object3mf,
    resources: &Resources,
    scene: &mut Scene,
) -> u32 {
    let mut mesh = Mesh::new(object.name.clone());
    mesh.vertices = object
        .mesh
        .vertices
        .iter()
        .map(|v| Vec3::new(v.x, v.y, v.z))
        .collect();

    // Every triangle may reference a *different* property group via its own
    // `pid`; since `Mesh` has one material index, the first resolvable
    // triangle material (or the object-level default `pid`) wins and the
    // rest is a best-effort same-mesh approximation, matching the
    // "deliberately simple post-process contract" stance taken elsewhere in
    // this crate for data this Scene IR does not model per-triangle.
    let mut material_index = None;
    for triangle in &object.mesh.triangles {
        mesh.faces.push(Face::triangle(triangle.v1, triangle.v2, triangle.v3));
        if material_index.is_none() {
            let pid = triangle.pid.or(object.pid);
            if let Some(pid) = pid {
                if let Some(material) = material_from_resource(resources, pid, triangle.p1) {
                    material_index = Some(scene.add_material(material));
                }
            }
        }
    }
    mesh.material_index = material_index.unwrap_or(0);

    scene.add_mesh(mesh)
}

pub fn import_3mf(bytes: Vec<u8>) -> Result<Scene> {
    let package = OpcPackage::open(bytes)?;
    let tree = XmlTree::parse(package.model_xml)?;
    let model = tree.root_element();
    if model.tag_name() != "model" {
        return Err(Error::malformed(format!(
            "expected <model> root element, found <{}>",
            model.tag_name()
        )));
    }

    let resources_node = model
        .expect_one("resources")
        .map_err(|_| Error::malformed("<model> missing <resources>"))?;
    let resources = resources::parse_resources(resources_node)?;

    let mut scene = Scene::new("3mf-root");
    let root = scene.root();

    for texture in package.embedded_textures {
        scene.add_texture(texture);
    }

    let mut object_to_mesh = std::collections::HashMap::new();
    for object in resources.objects.values() {
        let mesh_index = lower_object(object, &resources, &mut scene);
        object_to_mesh.insert(object.id, mesh_index);
    }

    if let Some(build_node) = model.child_named("build") {
        for item in build_node.children_named("item") {
            let Some(objectid) = item.attribute_uint("objectid").map(|v| v as u32) else {
                log::warn!("<item> missing objectid, skipping");
                continue;
            };
            let Some(&mesh_index) = object_to_mesh.get(&objectid) else {
                log::warn!("<item> references unknown object id {objectid}");
                continue;
            };
            let node_id = scene.nodes.add_child(root, format!("item-{objectid}"));
            if let Some(transform_text) = item.attribute("transform") {
                scene.nodes.get_mut(node_id).transform = parse_transform(transform_text)?;
            }
            scene.nodes.get_mut(node_id).meshes.push(mesh_index);
        }
    } else {
        log::warn!("<model> has no <build> section; no instances created");
    }

    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_round_trips() {
        let text = "1 0 0 0 1 0 0 0 1 0 0 0";
        let m = parse_transform(text).unwrap();
        assert_eq!(m, Mat4::IDENTITY);
    }

    #[test]
    fn translation_only_transform() {
        let text = "1 0 0 0 1 0 0 0 1 5 6 7";
        let m = parse_transform(text).unwrap();
        let (_, _, t) = m.to_scale_rotation_translation();
        assert_eq!(t, Vec3::new(5.0, 6.0, 7.0));
    }

    #[test]
    fn rejects_wrong_count() {
        assert!(parse_transform("1 2 3").is_err());
    }
}
