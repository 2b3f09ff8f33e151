//! Walks a scene's node tree and prints it, one line per node, indented by
//! depth. Grounded on the teacher's `examples/tree/main.rs`.

use std::path::Path;

use assetgraph::io::{FsIoSystem, IoSystem};
use assetgraph::registry::{ImportHints, Registry};
use assetgraph::scene::{NodeId, Scene};

fn print_tree(scene: &Scene, node: NodeId, depth: usize) {
    let data = scene.nodes.get(node);
    println!("{}- {} ({})", "  ".repeat(depth), node.0, data.name);
    for &child in &data.children {
        print_tree(scene, child, depth + 1);
    }
}

fn run(path: &str) -> assetgraph::Result<()> {
    let path = Path::new(path);
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let io = FsIoSystem::new(dir);
    let bytes = io.read_to_vec(Path::new(path.file_name().unwrap()))?;

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let hints = ImportHints::from_extension(extension);
    let scene = Registry::builtin().import(&bytes, &io, dir, &hints)?;

    println!(
        "{} meshes, {} materials, {} nodes",
        scene.meshes.len(),
        scene.materials.len(),
        scene.nodes.len()
    );
    print_tree(&scene, scene.root(), 0);
    Ok(())
}

fn main() {
    match std::env::args().nth(1) {
        Some(path) => {
            if let Err(err) = run(&path) {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
        None => println!("usage: dump-tree <FILE>"),
    }
}
