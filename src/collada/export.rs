//! COLLADA backend: `Scene` → COLLADA 1.4.1 XML text. Section order follows
//! `ColladaExporter.cpp`: asset, library_images, library_effects,
//! library_materials, library_geometries, library_visual_scenes, scene.

use crate::error::Result;
use crate::scene::{NodeId, Scene};
use crate::xmlwriter::XmlWriter;

fn write_asset(w: &mut XmlWriter) {
    w.open("asset", &[]);
    w.open("contributor", &[]);
    w.text_element("authoring_tool", "assetgraph");
    w.close();
    w.text_element("up_axis", "Y_UP");
    w.close();
}

fn write_geometries(scene: &Scene, w: &mut XmlWriter) {
    w.open("library_geometries", &[]);
    for (index, mesh) in scene.meshes.iter().enumerate() {
        let geom_id = format!("geom-{index}");
        w.open("geometry", &[("id", &geom_id), ("name", &mesh.name)]);
        w.open("mesh", &[]);

        let positions_id = format!("{geom_id}-positions");
        let positions_array_id = format!("{positions_id}-array");
        w.open("source", &[("id", &positions_id)]);
        let floats: Vec<String> = mesh
            .vertices
            .iter()
            .flat_map(|v| [v.x, v.y, v.z])
            .map(|f| f.to_string())
            .collect();
        w.open(
            "float_array",
            &[
                ("id", &positions_array_id),
                ("count", &(floats.len()).to_string()),
            ],
        );
        w.raw_text(&floats.join(" "));
        w.close();
        w.close(); // source

        let vertices_id = format!("{geom_id}-vertices");
        w.open("vertices", &[("id", &vertices_id)]);
        w.leaf("input", &[("semantic", "POSITION"), ("source", &format!("#{positions_id}"))]);
        w.close();

        w.open("triangles", &[("count", &mesh.faces.len().to_string())]);
        w.leaf("input", &[("semantic", "VERTEX"), ("source", &format!("#{vertices_id}")), ("offset", "0")]);
        w.close(); // triangles

        w.close(); // mesh
        w.close(); // geometry
    }
    w.close(); // library_geometries
}

fn write_visual_scene(scene: &Scene, w: &mut XmlWriter) {
    w.open("library_visual_scenes", &[]);
    w.open("visual_scene", &[("id", "scene"), ("name", "scene")]);

    fn walk(scene: &Scene, node: NodeId, w: &mut XmlWriter) {
        let data = scene.nodes.get(node);
        w.open("node", &[("id", &data.name), ("name", &data.name)]);
        let m = data.transform.to_cols_array();
        // COLLADA <matrix> text is row-major; glam stores column-major.
        let row_major = [
            m[0], m[4], m[8], m[12],
            m[1], m[5], m[9], m[13],
            m[2], m[6], m[10], m[14],
            m[3], m[7], m[11], m[15],
        ];
        let text = row_major
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        w.text_element("matrix", &text);
        for &mesh_index in &data.meshes {
            w.leaf(
                "instance_geometry",
                &[("url", &format!("#geom-{mesh_index}"))],
            );
        }
        for &child in &data.children {
            walk(scene, child, w);
        }
        w.close(); // node
    }

    for &child in &scene.nodes.get(scene.root()).children {
        walk(scene, child, w);
    }

    w.close(); // visual_scene
    w.close(); // library_visual_scenes
}

pub fn export_collada(scene: &Scene) -> Result<String> {
    let mut w = XmlWriter::new();
    w.open(
        "COLLADA",
        &[
            ("version", "1.4.1"),
            ("xmlns", "http://www.collada.org/2005/11/COLLADASchema"),
        ],
    );
    write_asset(&mut w);
    write_geometries(scene, &mut w);
    write_visual_scene(scene, &mut w);
    w.open("scene", &[]);
    w.leaf("instance_visual_scene", &[("url", "#scene")]);
    w.close();
    w.close(); // COLLADA
    Ok(w.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Face, Mesh};
    use glam::Vec3;

    #[test]
    fn exports_minimal_scene() {
        let mut scene = Scene::new("root");
        let mut mesh = Mesh::new("tri");
        mesh.vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        mesh.faces = vec![Face::triangle(0, 1, 2)];
        scene.add_mesh(mesh);
        let root = scene.root();
        let child = scene.nodes.add_child(root, "child");
        scene.nodes.get_mut(child).meshes.push(0);

        let xml = export_collada(&scene).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<COLLADA version=\"1.4.1\""));
        assert!(xml.contains("instance_geometry"));
    }
}
