//! C5: the Open Packaging Conventions layer 3MF is built on. Grounded
//! directly on `D3MFOpcPackage.cpp`: parses `_rels/.rels`, resolves the
//! package's root part via its relationship type, and collects thumbnail
//! images as embedded auxiliary textures.

use crate::error::{Error, Result};
use crate::texture::Texture;
use crate::xml::XmlTree;
use crate::zip_archive::ZipArchive;

pub const ROOT_RELATIONSHIPS_ARCHIVE: &str = "_rels/.rels";
pub const CONTENT_TYPES_ARCHIVE: &str = "[Content_Types].xml";
pub const MODEL_PART: &str = "3D/3dmodel.model";
pub const PACKAGE_START_PART_RELATIONSHIP_TYPE: &str =
    "http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel";

struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let tree = XmlTree::parse(xml.to_string())?;
    let mut out = Vec::new();
    for node in tree.root_element().children_named("Relationship") {
        let id = node.attribute("Id").unwrap_or_default().to_string();
        let rel_type = node.attribute("Type").unwrap_or_default().to_string();
        let target = node.attribute("Target").unwrap_or_default().to_string();
        // validateRels: drop relationships missing any required attribute.
        if id.is_empty() || rel_type.is_empty() || target.is_empty() {
            continue;
        }
        out.push(Relationship { id, rel_type, target });
    }
    Ok(out)
}

/// Strips up to two leading `/` characters from a relationship target, per
/// the literal "deal with zip-bug" workaround in the original source: some
/// 3MF producers double up the leading slash when writing the Target
/// attribute of the root-part relationship.
fn strip_zip_bug_prefix(mut path: String) -> String {
    if let Some(stripped) = path.strip_prefix('/') {
        path = stripped.to_string();
        if let Some(stripped_again) = path.strip_prefix('/') {
            path = stripped_again.to_string();
        }
    }
    path
}

fn is_embedded_texture(filename: &str) -> bool {
    let extension = filename.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    (extension == "jpg" || extension == "png") && filename.contains("thumbnail")
}

/// The result of opening a 3MF OPC package: the resolved root model part's
/// XML text plus any embedded thumbnail textures discovered along the way.
pub struct OpcPackage {
    pub model_xml: String,
    pub embedded_textures: Vec<Texture>,
}

impl OpcPackage {
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        let mut archive = ZipArchive::open(bytes)?;
        let names = archive.file_names();

        if !names.iter().any(|n| n == MODEL_PART) {
            return Err(Error::malformed(format!(
                "package does not contain {MODEL_PART}"
            )));
        }

        let mut root_part: Option<String> = None;
        let mut embedded_textures = Vec::new();

        for name in &names {
            if name == ROOT_RELATIONSHIPS_ARCHIVE {
                let rels_xml = archive.read_string(name)?;
                let relationships = parse_relationships(&rels_xml)?;
                let target = relationships
                    .iter()
                    .find(|r| r.rel_type == PACKAGE_START_PART_RELATIONSHIP_TYPE)
                    .map(|r| r.target.clone())
                    .ok_or_else(|| {
                        Error::malformed(format!(
                            "cannot find relationship of type {PACKAGE_START_PART_RELATIONSHIP_TYPE}"
                        ))
                    })?;
                root_part = Some(strip_zip_bug_prefix(target));
            } else if name == CONTENT_TYPES_ARCHIVE {
                log::warn!("ignored file of unsupported type: {name}");
            } else if is_embedded_texture(name) {
                let bytes = archive.read(name)?;
                let format_hint = if name.to_ascii_lowercase().ends_with(".png") {
                    "png"
                } else {
                    "png" // matches original: format hint is hardcoded to png regardless of extension
                };
                let texture = Texture::from_compressed(format!("*{name}"), format_hint, bytes);
                embedded_textures.push(texture);
            } else {
                log::warn!("ignored file of unknown type: {name}");
            }
        }

        let root_part = root_part.unwrap_or_else(|| MODEL_PART.to_string());
        let model_xml = archive.read_string(&root_part)?;

        Ok(OpcPackage {
            model_xml,
            embedded_textures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_one_leading_slash() {
        assert_eq!(strip_zip_bug_prefix("/3D/3dmodel.model".into()), "3D/3dmodel.model");
    }

    #[test]
    fn strips_doubled_leading_slash_zip_bug() {
        assert_eq!(
            strip_zip_bug_prefix("//3D/3dmodel.model".into()),
            "3D/3dmodel.model"
        );
    }

    #[test]
    fn embedded_texture_requires_thumbnail_in_name() {
        assert!(is_embedded_texture("Metadata/thumbnail.png"));
        assert!(!is_embedded_texture("Metadata/cover.png"));
        assert!(!is_embedded_texture("Metadata/thumbnail.gif"));
    }

    #[test]
    fn parses_relationships_and_drops_invalid() {
        let xml = r#"<?xml version="1.0"?>
        <Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
            <Relationship Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel" Target="/3D/3dmodel.model"/>
            <Relationship Id="" Type="x" Target="y"/>
        </Relationships>"#;
        let rels = parse_relationships(xml).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].target, "/3D/3dmodel.model");
    }
}
