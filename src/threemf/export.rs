//! 3MF backend: `Scene` → `<model>` XML → OPC package (relationships +
//! `[Content_Types].xml` + zip). Grounded structurally on `D3MFExporter.cpp`
//! and the same relationship constants used by the importer's `opc` layer.

use std::io::Write;

use zip::write::FileOptions;
use zip::ZipWriter;

use crate::error::{Error, Result};
use crate::scene::{NodeId, Scene};
use crate::xmlwriter::XmlWriter;

fn write_model_xml(scene: &Scene) -> String {
    let mut w = XmlWriter::new();
    w.open(
        "model",
        &[
            ("unit", "millimeter"),
            ("xmlns", "http://schemas.microsoft.com/3dmanufacturing/core/2015/02"),
        ],
    );

    w.open("resources", &[]);
    for (index, mesh) in scene.meshes.iter().enumerate() {
        w.open("object", &[("id", &(index + 1).to_string()), ("type", "model")]);
        w.open("mesh", &[]);
        w.open("vertices", &[]);
        for v in &mesh.vertices {
            w.leaf(
                "vertex",
                &[
                    ("x", &v.x.to_string()),
                    ("y", &v.y.to_string()),
                    ("z", &v.z.to_string()),
                ],
            );
        }
        w.close(); // vertices
        w.open("triangles", &[]);
        for face in &mesh.faces {
            if face.indices.len() != 3 {
                continue; // 3MF triangles are strictly 3-sided
            }
            w.leaf(
                "triangle",
                &[
                    ("v1", &face.indices[0].to_string()),
                    ("v2", &face.indices[1].to_string()),
                    ("v3", &face.indices[2].to_string()),
                ],
            );
        }
        w.close(); // triangles
        w.close(); // mesh
        w.close(); // object
    }
    w.close(); // resources

    w.open("build", &[]);
    fn walk(scene: &Scene, node: NodeId, w: &mut XmlWriter) {
        let data = scene.nodes.get(node);
        for &mesh_index in &data.meshes {
            w.leaf("item", &[("objectid", &(mesh_index + 1).to_string())]);
        }
        for &child in &data.children {
            walk(scene, child, w);
        }
    }
    walk(scene, scene.root(), &mut w);
    w.close(); // build

    w.close(); // model
    w.finish()
}

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel" Target="/3D/3dmodel.model"/>
</Relationships>"#;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
</Types>"#;

/// Exports a scene to a complete 3MF (OPC) package.
pub fn export_3mf(scene: &Scene) -> Result<Vec<u8>> {
    let model_xml = write_model_xml(scene);

    let mut buf = Vec::new();
    {
        let cursor = std::io::Cursor::new(&mut buf);
        let mut zip = ZipWriter::new(cursor);
        let options: FileOptions<()> = FileOptions::default();

        zip.start_file("_rels/.rels", options)
            .map_err(|e| Error::malformed(format!("zip write error: {e}")))?;
        zip.write_all(RELS_XML.as_bytes())
            .map_err(|e| Error::malformed(format!("zip write error: {e}")))?;

        zip.start_file("[Content_Types].xml", options)
            .map_err(|e| Error::malformed(format!("zip write error: {e}")))?;
        zip.write_all(CONTENT_TYPES_XML.as_bytes())
            .map_err(|e| Error::malformed(format!("zip write error: {e}")))?;

        zip.start_file("3D/3dmodel.model", options)
            .map_err(|e| Error::malformed(format!("zip write error: {e}")))?;
        zip.write_all(model_xml.as_bytes())
            .map_err(|e| Error::malformed(format!("zip write error: {e}")))?;

        zip.finish()
            .map_err(|e| Error::malformed(format!("zip finish error: {e}")))?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Face, Mesh};
    use glam::Vec3;

    #[test]
    fn exports_single_triangle_box_without_error() {
        let mut scene = Scene::new("root");
        let mut mesh = Mesh::new("tri");
        mesh.vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        mesh.faces = vec![Face::triangle(0, 1, 2)];
        let idx = scene.add_mesh(mesh);
        let root = scene.root();
        scene.nodes.get_mut(root).meshes.push(idx);

        let bytes = export_3mf(&scene).unwrap();
        assert!(!bytes.is_empty());
        // A valid zip always starts with the local file header signature.
        assert_eq!(&bytes[0..4], b"PK\x03\x04");
    }
}
