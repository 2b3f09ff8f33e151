//! Material property bag, modelled on assimp's `aiMaterial` key/value store
//! (`fkoep-assimp_import-rs/src/material.rs`) rather than a fixed struct, so
//! codecs with very different material models (AMF's flat color, 3MF's
//! resource-group colors, COLLADA's Phong/Lambert common profile, glTF's PBR
//! metallic-roughness) can all populate the same type.

use std::collections::BTreeMap;

/// A single material property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Float(f32),
    FloatArray(Vec<f32>),
    Integer(i32),
    String(String),
    /// Linear RGBA, each component typically in `0.0..=1.0`.
    Color([f32; 4]),
    Bool(bool),
}

/// Well-known property keys, matching the common subset every supported
/// codec can populate. Hosts may also set arbitrary string keys via
/// [`Material::set`] for format-specific extensions.
pub mod keys {
    pub const DIFFUSE_COLOR: &str = "diffuse.color";
    pub const SPECULAR_COLOR: &str = "specular.color";
    pub const EMISSIVE_COLOR: &str = "emissive.color";
    pub const BASE_COLOR: &str = "pbr.base_color";
    pub const METALLIC_FACTOR: &str = "pbr.metallic";
    pub const ROUGHNESS_FACTOR: &str = "pbr.roughness";
    pub const OPACITY: &str = "opacity";
    pub const SHININESS: &str = "shininess";
    pub const NAME: &str = "name";
    pub const DIFFUSE_TEXTURE: &str = "diffuse.texture";
    pub const BASE_COLOR_TEXTURE: &str = "pbr.base_color_texture";
    pub const NORMAL_TEXTURE: &str = "normal.texture";
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    properties: BTreeMap<String, PropertyValue>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        let mut material = Material::default();
        material.set(keys::NAME, PropertyValue::String(name.into()));
        material
    }

    pub fn name(&self) -> &str {
        match self.properties.get(keys::NAME) {
            Some(PropertyValue::String(s)) => s.as_str(),
            _ => "",
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.properties.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Index into `Scene::textures` for a texture-valued property, if set
    /// and of the right shape.
    pub fn texture_index(&self, key: &str) -> Option<u32> {
        match self.properties.get(key) {
            Some(PropertyValue::Integer(i)) if *i >= 0 => Some(*i as u32),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }
}
