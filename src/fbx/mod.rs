//! FBX binary codec: tokenizer (C6) plus a minimal scope-tree-to-Scene
//! lowering covering geometry nodes, following the same `Model`/`Geometry`
//! node-name conventions the original format uses.

pub mod tokenizer;

mod import;

pub use import::import_fbx;
