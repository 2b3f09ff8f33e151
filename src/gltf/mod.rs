//! glTF 2.0 / GLB codec. See `SPEC_FULL.md` §4.11.

pub mod glb;
pub mod json;

mod export;
mod import;

pub use export::export_gltf;
pub use import::import_gltf;
