//! AMF (Additive Manufacturing File format) codec: a representative XML
//! push-down parser, grounded on `AMFImporter.cpp` and
//! `AMFImporter_Node.hpp`.

mod base64;
mod import;
mod node;

pub use import::{import_amf, lower, parse};
pub use node::*;
