//! A pluggable multi-format 3D asset import/export pipeline built around a
//! shared in-memory scene graph. Individual format codecs (AMF, 3MF,
//! COLLADA, FBX, glTF/GLB) translate between their own on-disk
//! representation and [`scene::Scene`]; the [`registry`] module dispatches
//! a path or byte buffer to whichever codec recognises it.
//!
//! ```no_run
//! use assetgraph::io::FsIoSystem;
//! use assetgraph::registry::{ImportHints, Registry};
//! use std::path::Path;
//!
//! let io = FsIoSystem::new(".");
//! let bytes = std::fs::read("model.gltf").unwrap();
//! let scene = Registry::builtin()
//!     .import(&bytes, &io, Path::new("."), &ImportHints::from_extension("gltf"))
//!     .unwrap();
//! println!("{} meshes", scene.meshes.len());
//! ```

pub mod animation;
pub mod config;
pub mod error;
pub mod io;
pub mod material;
pub mod mesh;
pub mod metadata;
pub mod opc;
pub mod postprocess;
pub mod registry;
pub mod scene;
pub mod texture;
pub mod xml;
pub mod xmlwriter;
pub mod zip_archive;

// Each codec module mixes frontend (import) and backend (export) code;
// the `import`/`export` Cargo features gate which directions
// `registry::Registry::builtin()` wires up, not which modules compile.
pub mod amf;
pub mod collada;
pub mod fbx;
pub mod gltf;
pub mod threemf;

pub use error::{Error, Result};
pub use scene::Scene;
