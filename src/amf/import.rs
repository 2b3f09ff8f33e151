//! AMF frontend: recursive-descent parse into [`AmfDocument`], then
//! lowering into a [`Scene`]. Grounded on `AMFImporter.cpp`/
//! `AMFImporter_Geometry.cpp`/`AMFImporter_Material.cpp`.

use glam::{Mat4, Quat, Vec3};

use crate::error::{Error, Result};
use crate::material::{keys as material_keys, Material, PropertyValue};
use crate::mesh::{Face, Mesh};
use crate::scene::Scene;
use crate::texture::{Texel, Texture};
use crate::xml::{XmlNode, XmlTree};

use super::base64;
use super::node::*;

const VALID_UNITS: &[&str] = &["inch", "millimeter", "meter", "feet", "micron"];

fn validate_unit(unit: &str) -> Result<()> {
    if VALID_UNITS.iter().any(|u| u.eq_ignore_ascii_case(unit)) {
        Ok(())
    } else {
        Err(Error::malformed(format!(
            "unrecognised AMF unit '{unit}'; expected one of {VALID_UNITS:?}"
        )))
    }
}

fn parse_color(node: XmlNode<'_>) -> Option<AmfColor> {
    let r = node.read_float_leaf("r").ok()?;
    let g = node.read_float_leaf("g").ok()?;
    let b = node.read_float_leaf("b").ok()?;
    let a = node.expect_at_most_one("a").ok().flatten().and_then(|n| n.text().parse().ok()).unwrap_or(1.0);
    Some(AmfColor { r, g, b, a })
}

fn parse_vertex(node: XmlNode<'_>) -> Result<Vertex3> {
    let coords = node.expect_one("coordinates")?;
    Ok(Vertex3 {
        x: coords.read_float_leaf("x")? as f64,
        y: coords.read_float_leaf("y")? as f64,
        z: coords.read_float_leaf("z")? as f64,
    })
}

fn parse_triangle(node: XmlNode<'_>) -> Result<AmfTriangle> {
    let v1 = node
        .child_named("v1")
        .and_then(|n| n.text().parse::<u32>().ok())
        .ok_or_else(|| Error::malformed("<triangle> missing v1"))?;
    let v2 = node
        .child_named("v2")
        .and_then(|n| n.text().parse::<u32>().ok())
        .ok_or_else(|| Error::malformed("<triangle> missing v2"))?;
    let v3 = node
        .child_named("v3")
        .and_then(|n| n.text().parse::<u32>().ok())
        .ok_or_else(|| Error::malformed("<triangle> missing v3"))?;
    let color = node.child_named("color").and_then(parse_color);
    Ok(AmfTriangle {
        v1,
        v2,
        v3,
        color,
        texture_map: None,
    })
}

fn parse_volume(node: XmlNode<'_>) -> Result<AmfVolume> {
    let material_id = node.attribute("materialid").map(|s| s.to_string());
    let color = node.child_named("color").and_then(parse_color);
    let mut triangles = Vec::new();
    for tri_node in node.children_named("triangle") {
        triangles.push(parse_triangle(tri_node)?);
    }
    Ok(AmfVolume {
        material_id,
        triangles,
        color,
    })
}

fn parse_mesh(node: XmlNode<'_>) -> Result<AmfMesh> {
    let vertices_node = node.expect_one("vertices")?;
    let mut vertices = Vec::new();
    for v in vertices_node.children_named("vertex") {
        vertices.push(parse_vertex(v)?);
    }
    let mut volumes = Vec::new();
    for v in node.children_named("volume") {
        volumes.push(parse_volume(v)?);
    }
    Ok(AmfMesh { vertices, volumes })
}

fn parse_object(node: XmlNode<'_>) -> Result<AmfObject> {
    let id = node.attribute("id").unwrap_or_default().to_string();
    let color = node.child_named("color").and_then(parse_color);
    let mut meshes = Vec::new();
    for m in node.children_named("mesh") {
        meshes.push(parse_mesh(m)?);
    }
    Ok(AmfObject { id, meshes, color })
}

fn parse_instance(node: XmlNode<'_>) -> Result<AmfInstance> {
    let object_id = node.attribute("objectid").unwrap_or_default().to_string();
    let leaf = |name: &'static str| -> f64 {
        node.child_named(name)
            .and_then(|n| n.text().parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    Ok(AmfInstance {
        object_id,
        delta: AmfDelta {
            x: leaf("deltax"),
            y: leaf("deltay"),
            z: leaf("deltaz"),
        },
        rotation_degrees: AmfRotationDegrees {
            rx: leaf("rx"),
            ry: leaf("ry"),
            rz: leaf("rz"),
        },
    })
}

fn parse_constellation(node: XmlNode<'_>) -> Result<AmfConstellation> {
    let id = node.attribute("id").unwrap_or_default().to_string();
    let mut instances = Vec::new();
    for inst in node.children_named("instance") {
        instances.push(parse_instance(inst)?);
    }
    Ok(AmfConstellation { id, instances })
}

fn parse_material(node: XmlNode<'_>) -> Result<AmfMaterial> {
    let id = node.attribute("id").unwrap_or_default().to_string();
    let color = node.child_named("color").and_then(parse_color);
    Ok(AmfMaterial { id, color })
}

fn parse_texture(node: XmlNode<'_>) -> Result<AmfTexture> {
    let id = node.attribute("id").unwrap_or_default().to_string();
    let width = node.attribute_uint("width").unwrap_or(0) as u32;
    let height = node.attribute_uint("height").unwrap_or(0) as u32;
    let depth = node.attribute_uint("depth").unwrap_or(1) as u32;
    let data = base64::decode(node.text());

    let expected_len = width as usize * height as usize * depth as usize;
    if data.len() != expected_len {
        return Err(Error::malformed(format!(
            "AMF texture '{id}' decoded to {} bytes, expected width*height*depth = {expected_len}",
            data.len()
        )));
    }

    Ok(AmfTexture {
        id,
        width,
        height,
        depth,
        data,
    })
}

/// Parses a complete AMF XML document.
pub fn parse(xml: &str) -> Result<AmfDocument> {
    let tree = XmlTree::parse(xml.to_string())?;
    let root = tree.root_element();
    if root.tag_name() != "amf" {
        return Err(Error::malformed(format!(
            "expected <amf> root element, found <{}>",
            root.tag_name()
        )));
    }

    let unit = root.attribute("unit").unwrap_or("millimeter").to_string();
    validate_unit(&unit)?;

    let mut document = AmfDocument {
        unit,
        ..Default::default()
    };

    for object_node in root.children_named("object") {
        document.objects.push(parse_object(object_node)?);
    }
    for constellation_node in root.children_named("constellation") {
        document
            .constellations
            .push(parse_constellation(constellation_node)?);
    }
    for material_node in root.children_named("material") {
        document.materials.push(parse_material(material_node)?);
    }
    for texture_node in root.children_named("texture") {
        document.textures.push(parse_texture(texture_node)?);
    }
    for metadata_node in root.children_named("metadata") {
        let key = metadata_node.attribute("type").unwrap_or("").to_string();
        document.metadata.push((key, metadata_node.text().to_string()));
    }

    Ok(document)
}

/// Expands AMF's raw per-pixel samples (already length-validated against
/// `width*height*depth` by `parse_texture`) into texels. `depth` is the
/// channel count per pixel: 1 is grayscale, 3 is RGB, 4 is RGBA; any other
/// depth reuses the first channel as the gray value and treats the rest as
/// unused, matching the tolerant-decode style used elsewhere in this codec.
fn texels_from_amf_data(depth: u32, data: &[u8]) -> Vec<Texel> {
    let depth = depth.max(1) as usize;
    data.chunks(depth)
        .map(|chunk| match depth {
            1 => Texel {
                r: chunk[0],
                g: chunk[0],
                b: chunk[0],
                a: 255,
            },
            3 => Texel {
                r: chunk[0],
                g: chunk[1],
                b: chunk[2],
                a: 255,
            },
            _ => Texel {
                r: chunk[0],
                g: *chunk.get(1).unwrap_or(&chunk[0]),
                b: *chunk.get(2).unwrap_or(&chunk[0]),
                a: *chunk.get(3).unwrap_or(&255),
            },
        })
        .collect()
}

fn color_to_material(color: &AmfColor) -> Material {
    let mut material = Material::new("amf-color");
    material.set(
        material_keys::DIFFUSE_COLOR,
        PropertyValue::Color([color.r, color.g, color.b, color.a]),
    );
    material
}

fn lower_mesh(mesh: &AmfMesh, material_index: u32) -> Mesh {
    let mut out = Mesh::new("amf-mesh");
    out.vertices = mesh
        .vertices
        .iter()
        .map(|v| Vec3::new(v.x as f32, v.y as f32, v.z as f32))
        .collect();
    out.material_index = material_index;
    for volume in &mesh.volumes {
        for tri in &volume.triangles {
            out.faces.push(Face::triangle(tri.v1, tri.v2, tri.v3));
        }
    }
    out
}

/// Lowers a parsed AMF document into a [`Scene`]. Each `<object>` becomes a
/// node with one mesh per `<mesh>` element; `<constellation>` instances
/// become child nodes with the translation (`delta`) and documented
/// rotation (`rotation_degrees`, degrees converted to radians) composed
/// into the node's transform.
pub fn lower(document: &AmfDocument) -> Result<Scene> {
    let mut scene = Scene::new("amf-root");
    let root = scene.root();

    let mut material_for_object = std::collections::HashMap::new();
    for object in &document.objects {
        if let Some(color) = &object.color {
            let idx = scene.add_material(color_to_material(color));
            material_for_object.insert(object.id.clone(), idx);
        }
    }
    for material in &document.materials {
        if let Some(color) = &material.color {
            let idx = scene.add_material(color_to_material(color));
            material_for_object.insert(format!("material:{}", material.id), idx);
        }
    }
    for texture in &document.textures {
        scene.add_texture(Texture::from_texels(
            format!("*{}", texture.id),
            texture.width,
            texture.height,
            texels_from_amf_data(texture.depth, &texture.data),
        ));
    }

    let mut object_nodes = std::collections::HashMap::new();
    for object in &document.objects {
        let node_id = scene.nodes.add_child(root, format!("object-{}", object.id));
        let material_index = material_for_object.get(&object.id).copied().unwrap_or(0);
        for mesh in &object.meshes {
            let mesh_index = scene.add_mesh(lower_mesh(mesh, material_index));
            scene.nodes.get_mut(node_id).meshes.push(mesh_index);
        }
        object_nodes.insert(object.id.clone(), node_id);
    }

    for constellation in &document.constellations {
        let constellation_node = scene
            .nodes
            .add_child(root, format!("constellation-{}", constellation.id));
        for instance in &constellation.instances {
            let Some(&referenced) = object_nodes.get(&instance.object_id) else {
                log::warn!(
                    "instance referenced unknown object id '{}'",
                    instance.object_id
                );
                continue;
            };
            let instance_node = scene.nodes.add_child(constellation_node, "instance");
            let translation = Vec3::new(
                instance.delta.x as f32,
                instance.delta.y as f32,
                instance.delta.z as f32,
            );
            let rot = &instance.rotation_degrees;
            let rotation = Quat::from_euler(
                glam::EulerRot::XYZ,
                (rot.rx as f32).to_radians(),
                (rot.ry as f32).to_radians(),
                (rot.rz as f32).to_radians(),
            );
            scene.nodes.get_mut(instance_node).transform =
                Mat4::from_rotation_translation(rotation, translation);
            scene.nodes.get_mut(instance_node).meshes =
                scene.nodes.get(referenced).meshes.clone();
        }
    }

    Ok(scene)
}

pub fn import_amf(xml: &str) -> Result<Scene> {
    let document = parse(xml)?;
    lower(&document)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_AMF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<amf unit="millimeter">
  <object id="0">
    <mesh>
      <vertices>
        <vertex><coordinates><x>0</x><y>0</y><z>0</z></coordinates></vertex>
        <vertex><coordinates><x>1</x><y>0</y><z>0</z></coordinates></vertex>
        <vertex><coordinates><x>0</x><y>1</y><z>0</z></coordinates></vertex>
      </vertices>
      <volume>
        <triangle><v1>0</v1><v2>1</v2><v3>2</v3></triangle>
      </volume>
    </mesh>
  </object>
</amf>"#;

    #[test]
    fn parses_minimal_object() {
        let doc = parse(MINIMAL_AMF).unwrap();
        assert_eq!(doc.unit, "millimeter");
        assert_eq!(doc.objects.len(), 1);
        assert_eq!(doc.objects[0].meshes[0].vertices.len(), 3);
        assert_eq!(doc.objects[0].meshes[0].volumes[0].triangles.len(), 1);
    }

    #[test]
    fn rejects_bad_unit() {
        let xml = MINIMAL_AMF.replace(r#"unit="millimeter""#, r#"unit="furlong""#);
        assert!(parse(&xml).is_err());
    }

    #[test]
    fn unit_check_is_case_insensitive() {
        let xml = MINIMAL_AMF.replace(r#"unit="millimeter""#, r#"unit="MilliMeter""#);
        assert!(parse(&xml).is_ok());
    }

    #[test]
    fn lowering_produces_valid_scene() {
        let doc = parse(MINIMAL_AMF).unwrap();
        let scene = lower(&doc).unwrap();
        assert!(scene.validate().is_ok());
        assert_eq!(scene.meshes.len(), 1);
    }

    #[test]
    fn instance_rotation_not_translation() {
        // Regression test for the documented (non-buggy) semantics: rx/ry/rz
        // feed the instance's rotation, never its Delta translation.
        let xml = r#"<?xml version="1.0"?>
<amf unit="millimeter">
  <object id="0">
    <mesh>
      <vertices>
        <vertex><coordinates><x>0</x><y>0</y><z>0</z></coordinates></vertex>
        <vertex><coordinates><x>1</x><y>0</y><z>0</z></coordinates></vertex>
        <vertex><coordinates><x>0</x><y>1</y><z>0</z></coordinates></vertex>
      </vertices>
      <volume><triangle><v1>0</v1><v2>1</v2><v3>2</v3></triangle></volume>
    </mesh>
  </object>
  <constellation id="c0">
    <instance objectid="0">
      <deltax>5</deltax><deltay>0</deltay><deltaz>0</deltaz>
      <rx>90</rx><ry>0</ry><rz>0</rz>
    </instance>
  </constellation>
</amf>"#;
        let doc = parse(xml).unwrap();
        let scene = lower(&doc).unwrap();
        let instance_id = scene
            .nodes
            .find_by_name("instance")
            .expect("instance node");
        let transform = scene.nodes.get(instance_id).transform;
        let (_, rotation, translation) = transform.to_scale_rotation_translation();
        // Translation must be the literal delta, not zero-because-it-was-
        // overwritten-by-rotation, and rotation must be non-identity.
        assert!((translation.x - 5.0).abs() < 1e-4);
        assert!(rotation.to_axis_angle().1.abs() > 1e-4);
    }

    #[test]
    fn texture_length_must_match_width_height_depth() {
        let xml = r#"<?xml version="1.0"?>
<amf unit="millimeter">
  <texture id="0" width="2" height="2" depth="1">aGVsbG8=</texture>
</amf>"#;
        // "aGVsbG8=" decodes to "hello" (5 bytes), but width*height*depth = 4.
        assert!(parse(xml).is_err());
    }

    #[test]
    fn grayscale_texture_lowers_to_texels_not_compressed() {
        let xml = r#"<?xml version="1.0"?>
<amf unit="millimeter">
  <texture id="0" width="2" height="2" depth="1">AAD//w==</texture>
</amf>"#;
        // "AAD//w==" decodes to [0x00, 0x00, 0xff, 0xff] (4 bytes = 2*2*1).
        let doc = parse(xml).unwrap();
        let scene = lower(&doc).unwrap();
        assert_eq!(scene.textures.len(), 1);
        assert!(!scene.textures[0].is_compressed());
        assert_eq!(scene.textures[0].width, 2);
        assert_eq!(scene.textures[0].height, 2);
        assert!(scene.validate().is_ok());
    }
}
