//! C9: the importer/exporter registry and format dispatch.
//!
//! Mirrors the two-pass lookup the teacher's and the broader format-zoo's
//! loader registries use: first try importers whose extension list matches
//! a caller-supplied hint (still confirming with a signature check so a
//! `.dae` that is actually something else is rejected), then fall back to
//! pure signature sniffing across every registered importer in
//! registration order. Registration order is always the tie-break; nothing
//! here reorders by specificity or confidence.

use std::path::Path;

use lazy_static::lazy_static;

use crate::error::{Error, Result};
use crate::io::IoSystem;
use crate::scene::Scene;

/// Caller-supplied context narrowing the dispatch search. Corresponds to
/// the teacher's `ReadFile(path, checkSig)` two-mode lookup: a file
/// extension is a hint, not a guarantee, unless `force_check` asks every
/// importer to re-verify its signature regardless of extension match.
#[derive(Debug, Clone, Default)]
pub struct ImportHints {
    pub extension: Option<String>,
    pub force_check: bool,
}

impl ImportHints {
    pub fn from_extension(extension: impl Into<String>) -> Self {
        ImportHints {
            extension: Some(extension.into()),
            force_check: false,
        }
    }
}

pub trait Importer: Send + Sync {
    fn name(&self) -> &'static str;
    fn extensions(&self) -> &'static [&'static str];

    /// Sniffs `bytes` (and, secondarily, `extension`) for this format's
    /// signature. Must not assume `bytes` is the whole file for streamed
    /// formats, but every importer in this crate reads whole documents so
    /// `bytes` is always complete here.
    fn can_read(&self, bytes: &[u8], extension: Option<&str>) -> bool;

    fn import(&self, bytes: &[u8], io: &dyn IoSystem, base_path: &Path) -> Result<Scene>;
}

pub trait Exporter: Send + Sync {
    fn name(&self) -> &'static str;
    fn extension(&self) -> &'static str;
    fn export(&self, scene: &Scene) -> Result<Vec<u8>>;
}

fn contains_signature(bytes: &[u8], needle: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(512)];
    if needle.len() > window.len() {
        return false;
    }
    window.windows(needle.len()).any(|w| w.eq_ignore_ascii_case(needle))
}

mod builtin {
    use super::*;
    use crate::amf::import_amf;
    use crate::collada::{export_collada, import_collada};
    use crate::fbx::import_fbx;
    use crate::gltf::{export_gltf, import_gltf};
    use crate::threemf::{export_3mf, import_3mf};

    pub struct AmfImporter;
    impl Importer for AmfImporter {
        fn name(&self) -> &'static str {
            "amf"
        }
        fn extensions(&self) -> &'static [&'static str] {
            &["amf"]
        }
        fn can_read(&self, bytes: &[u8], _extension: Option<&str>) -> bool {
            contains_signature(bytes, b"<amf")
        }
        fn import(&self, bytes: &[u8], _io: &dyn IoSystem, _base_path: &Path) -> Result<Scene> {
            let text = std::str::from_utf8(bytes)
                .map_err(|_| Error::malformed("AMF input is not valid UTF-8"))?;
            import_amf(text)
        }
    }

    pub struct ThreeMfImporter;
    impl Importer for ThreeMfImporter {
        fn name(&self) -> &'static str {
            "3mf"
        }
        fn extensions(&self) -> &'static [&'static str] {
            &["3mf"]
        }
        fn can_read(&self, bytes: &[u8], _extension: Option<&str>) -> bool {
            bytes.starts_with(b"PK\x03\x04")
        }
        fn import(&self, bytes: &[u8], _io: &dyn IoSystem, _base_path: &Path) -> Result<Scene> {
            import_3mf(bytes.to_vec())
        }
    }

    pub struct ThreeMfExporter;
    impl Exporter for ThreeMfExporter {
        fn name(&self) -> &'static str {
            "3mf"
        }
        fn extension(&self) -> &'static str {
            "3mf"
        }
        fn export(&self, scene: &Scene) -> Result<Vec<u8>> {
            export_3mf(scene)
        }
    }

    pub struct ColladaImporter;
    impl Importer for ColladaImporter {
        fn name(&self) -> &'static str {
            "collada"
        }
        fn extensions(&self) -> &'static [&'static str] {
            &["dae"]
        }
        fn can_read(&self, bytes: &[u8], _extension: Option<&str>) -> bool {
            contains_signature(bytes, b"<collada")
        }
        fn import(&self, bytes: &[u8], _io: &dyn IoSystem, _base_path: &Path) -> Result<Scene> {
            let text = std::str::from_utf8(bytes)
                .map_err(|_| Error::malformed("COLLADA input is not valid UTF-8"))?;
            import_collada(text)
        }
    }

    pub struct ColladaExporter;
    impl Exporter for ColladaExporter {
        fn name(&self) -> &'static str {
            "collada"
        }
        fn extension(&self) -> &'static str {
            "dae"
        }
        fn export(&self, scene: &Scene) -> Result<Vec<u8>> {
            export_collada(scene).map(|xml| xml.into_bytes())
        }
    }

    pub struct FbxImporter;
    impl Importer for FbxImporter {
        fn name(&self) -> &'static str {
            "fbx"
        }
        fn extensions(&self) -> &'static [&'static str] {
            &["fbx"]
        }
        fn can_read(&self, bytes: &[u8], _extension: Option<&str>) -> bool {
            bytes.starts_with(crate::fbx::tokenizer::MAGIC)
        }
        fn import(&self, bytes: &[u8], _io: &dyn IoSystem, _base_path: &Path) -> Result<Scene> {
            import_fbx(bytes)
        }
    }

    pub struct GltfImporter;
    impl Importer for GltfImporter {
        fn name(&self) -> &'static str {
            "gltf"
        }
        fn extensions(&self) -> &'static [&'static str] {
            &["gltf", "glb"]
        }
        fn can_read(&self, bytes: &[u8], _extension: Option<&str>) -> bool {
            bytes.starts_with(b"glTF") || bytes.starts_with(b"{")
        }
        fn import(&self, bytes: &[u8], io: &dyn IoSystem, base_path: &Path) -> Result<Scene> {
            import_gltf(bytes, io, base_path)
        }
    }

    pub struct GltfExporter;
    impl Exporter for GltfExporter {
        fn name(&self) -> &'static str {
            "gltf"
        }
        fn extension(&self) -> &'static str {
            "glb"
        }
        fn export(&self, scene: &Scene) -> Result<Vec<u8>> {
            export_gltf(scene)
        }
    }
}

/// Holds every registered importer/exporter in fixed registration order.
/// Dispatch always walks this order; nothing here is sorted by confidence
/// or specificity.
pub struct Registry {
    importers: Vec<Box<dyn Importer>>,
    exporters: Vec<Box<dyn Exporter>>,
}

impl Registry {
    pub fn empty() -> Self {
        Registry {
            importers: Vec::new(),
            exporters: Vec::new(),
        }
    }

    pub fn register_importer(&mut self, importer: Box<dyn Importer>) {
        self.importers.push(importer);
    }

    pub fn register_exporter(&mut self, exporter: Box<dyn Exporter>) {
        self.exporters.push(exporter);
    }

    fn find_importer(&self, bytes: &[u8], extension: Option<&str>) -> Option<&dyn Importer> {
        if let Some(ext) = extension {
            for importer in &self.importers {
                if importer.extensions().contains(&ext) && importer.can_read(bytes, Some(ext)) {
                    return Some(importer.as_ref());
                }
            }
        }
        for importer in &self.importers {
            if importer.can_read(bytes, extension) {
                return Some(importer.as_ref());
            }
        }
        None
    }

    pub fn import(
        &self,
        bytes: &[u8],
        io: &dyn IoSystem,
        base_path: &Path,
        hints: &ImportHints,
    ) -> Result<Scene> {
        let extension = if hints.force_check {
            None
        } else {
            hints.extension.as_deref()
        };
        let importer = self
            .find_importer(bytes, extension)
            .ok_or(Error::UnknownFormat)?;
        importer.import(bytes, io, base_path)
    }

    pub fn export(&self, scene: &Scene, format: &str) -> Result<Vec<u8>> {
        self.exporters
            .iter()
            .find(|e| e.name() == format || e.extension() == format)
            .ok_or(Error::UnknownFormat)?
            .export(scene)
    }

    /// The registry built into this crate: every codec in
    /// `SPEC_FULL.md` §4, registered in the order its module appears there.
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }
}

lazy_static! {
    static ref BUILTIN: Registry = {
        let mut registry = Registry::empty();

        #[cfg(feature = "import")]
        {
            registry.register_importer(Box::new(builtin::AmfImporter));
            registry.register_importer(Box::new(builtin::ThreeMfImporter));
            registry.register_importer(Box::new(builtin::ColladaImporter));
            registry.register_importer(Box::new(builtin::FbxImporter));
            registry.register_importer(Box::new(builtin::GltfImporter));
        }

        #[cfg(feature = "export")]
        {
            registry.register_exporter(Box::new(builtin::ThreeMfExporter));
            registry.register_exporter(Box::new(builtin::ColladaExporter));
            registry.register_exporter(Box::new(builtin::GltfExporter));
        }

        registry
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryIoSystem;

    #[test]
    fn dispatches_3mf_by_extension_and_signature() {
        let scene = Scene::new("root");
        let bytes = Registry::builtin().export(&scene, "3mf").unwrap();
        let io = MemoryIoSystem::new();
        let hints = ImportHints::from_extension("3mf");
        let imported = Registry::builtin()
            .import(&bytes, &io, Path::new(""), &hints)
            .unwrap();
        assert_eq!(imported.meshes.len(), scene.meshes.len());
    }

    #[test]
    fn dispatches_by_pure_signature_sniff_with_no_extension_hint() {
        let scene = Scene::new("root");
        let bytes = Registry::builtin().export(&scene, "glb").unwrap();
        let io = MemoryIoSystem::new();
        let imported = Registry::builtin()
            .import(&bytes, &io, Path::new(""), &ImportHints::default())
            .unwrap();
        assert_eq!(imported.meshes.len(), scene.meshes.len());
    }

    #[test]
    fn unknown_format_is_rejected() {
        let io = MemoryIoSystem::new();
        let err = Registry::builtin()
            .import(b"not a recognised format", &io, Path::new(""), &ImportHints::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFormat));
    }

    #[test]
    fn unknown_export_format_is_rejected() {
        let scene = Scene::new("root");
        let err = Registry::builtin().export(&scene, "obj").unwrap_err();
        assert!(matches!(err, Error::UnknownFormat));
    }
}
