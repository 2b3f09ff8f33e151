//! 3MF `<resources>` dictionary: objects, base materials, colour groups and
//! texture groups, each keyed by an integer id that is unique only within
//! its own resource kind (an `<object id="1">` and a `<basematerials
//! id="1">` may coexist). Grounded on `XmlSerializer.cpp`.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::xml::XmlNode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v1: u32,
    pub v2: u32,
    pub v3: u32,
    /// Resource id of the property group (`basematerials`/`colorgroup`/
    /// `texture2dgroup`) this triangle's corners index into, if any.
    pub pid: Option<u32>,
    pub p1: Option<u32>,
    pub p2: Option<u32>,
    pub p3: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh3mf {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object3mf {
    pub id: u32,
    pub name: String,
    /// Resource id of a `basematerials`/`colorgroup`/`texture2dgroup` this
    /// object's triangles default to when a triangle has no `pid`.
    pub pid: Option<u32>,
    pub mesh: Mesh3mf,
}

/// `#RRGGBB` or `#RRGGBBAA`. Returns `None` on anything else, matching the
/// original's "silently skip, don't set the property" behaviour rather
/// than surfacing a parse error (§9 quirk, preserved verbatim).
pub fn parse_color(text: &str) -> Option<[f32; 4]> {
    if !(text.len() == 7 || text.len() == 9) || !text.starts_with('#') {
        return None;
    }
    let channel = |s: &str| -> Option<f32> { u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0) };
    let r = channel(&text[1..3])?;
    let g = channel(&text[3..5])?;
    let b = channel(&text[5..7])?;
    let a = if text.len() == 9 {
        channel(&text[7..9])?
    } else {
        1.0
    };
    Some([r, g, b, a])
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseMaterialsGroup {
    pub id: u32,
    pub bases: Vec<(String, Option<[f32; 4]>)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorGroup {
    pub id: u32,
    pub colors: Vec<Option<[f32; 4]>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Texture2dGroup {
    pub id: u32,
    pub texture_id: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resources {
    pub objects: HashMap<u32, Object3mf>,
    pub base_materials: HashMap<u32, BaseMaterialsGroup>,
    pub color_groups: HashMap<u32, ColorGroup>,
    pub texture_groups: HashMap<u32, Texture2dGroup>,
}

fn parse_vertex(node: XmlNode<'_>) -> Result<Vertex> {
    Ok(Vertex {
        x: node.attribute_float("x").ok_or_else(|| Error::malformed("<vertex> missing x"))?,
        y: node.attribute_float("y").ok_or_else(|| Error::malformed("<vertex> missing y"))?,
        z: node.attribute_float("z").ok_or_else(|| Error::malformed("<vertex> missing z"))?,
    })
}

fn parse_triangle(node: XmlNode<'_>) -> Result<Triangle> {
    let idx = |name: &str| -> Result<u32> {
        node.attribute_uint(name)
            .map(|v| v as u32)
            .ok_or_else(|| Error::malformed(format!("<triangle> missing {name}")))
    };
    Ok(Triangle {
        v1: idx("v1")?,
        v2: idx("v2")?,
        v3: idx("v3")?,
        pid: node.attribute_uint("pid").map(|v| v as u32),
        p1: node.attribute_uint("p1").map(|v| v as u32),
        p2: node.attribute_uint("p2").map(|v| v as u32),
        p3: node.attribute_uint("p3").map(|v| v as u32),
    })
}

fn parse_mesh(node: XmlNode<'_>) -> Result<Mesh3mf> {
    let mut mesh = Mesh3mf::default();
    if let Some(vertices_node) = node.child_named("vertices") {
        for v in vertices_node.children_named("vertex") {
            mesh.vertices.push(parse_vertex(v)?);
        }
    }
    if let Some(triangles_node) = node.child_named("triangles") {
        for t in triangles_node.children_named("triangle") {
            mesh.triangles.push(parse_triangle(t)?);
        }
    }
    Ok(mesh)
}

fn parse_object(node: XmlNode<'_>) -> Result<Object3mf> {
    let id = node
        .attribute_uint("id")
        .map(|v| v as u32)
        .ok_or_else(|| Error::malformed("<object> missing id"))?;
    let name = node.attribute("name").unwrap_or_default().to_string();
    let pid = node.attribute_uint("pid").map(|v| v as u32);
    let mesh = match node.child_named("mesh") {
        Some(mesh_node) => parse_mesh(mesh_node)?,
        None => Mesh3mf::default(),
    };
    Ok(Object3mf { id, name, pid, mesh })
}

fn parse_base_materials(node: XmlNode<'_>) -> Result<BaseMaterialsGroup> {
    let id = node
        .attribute_uint("id")
        .map(|v| v as u32)
        .ok_or_else(|| Error::malformed("<basematerials> missing id"))?;
    let mut bases = Vec::new();
    for base in node.children_named("base") {
        let name = base.attribute("name").unwrap_or_default().to_string();
        let color = base.attribute("displaycolor").and_then(parse_color);
        bases.push((name, color));
    }
    Ok(BaseMaterialsGroup { id, bases })
}

fn parse_color_group(node: XmlNode<'_>) -> Result<ColorGroup> {
    let id = node
        .attribute_uint("id")
        .map(|v| v as u32)
        .ok_or_else(|| Error::malformed("<colorgroup> missing id"))?;
    let colors = node
        .children_named("color")
        .map(|c| c.attribute("color").and_then(parse_color))
        .collect();
    Ok(ColorGroup { id, colors })
}

pub fn parse_resources(node: XmlNode<'_>) -> Result<Resources> {
    let mut resources = Resources::default();
    for object in node.children_named("object") {
        let parsed = parse_object(object)?;
        resources.objects.insert(parsed.id, parsed);
    }
    for basematerials in node.children_named("basematerials") {
        let parsed = parse_base_materials(basematerials)?;
        resources.base_materials.insert(parsed.id, parsed);
    }
    for colorgroup in node.children_named("colorgroup") {
        let parsed = parse_color_group(colorgroup)?;
        resources.color_groups.insert(parsed.id, parsed);
    }
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rrggbb() {
        assert_eq!(parse_color("#FF0000"), Some([1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn parses_rrggbbaa() {
        assert_eq!(parse_color("#00FF0080"), Some([0.0, 1.0, 0.0, 128.0 / 255.0]));
    }

    #[test]
    fn malformed_color_silently_yields_none() {
        assert_eq!(parse_color("red"), None);
        assert_eq!(parse_color("#FF00"), None);
    }
}
