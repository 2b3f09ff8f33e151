//! 3MF codec: OPC package (C5) + `<model>` resource dictionary/build walk.
//! Grounded on `D3MFOpcPackage.cpp`, `XmlSerializer.cpp` and
//! `D3MFExporter.cpp`.

mod export;
mod import;
mod resources;

pub use export::export_3mf;
pub use import::{import_3mf, parse_transform};
pub use resources::{parse_color, Object3mf, Resources};
