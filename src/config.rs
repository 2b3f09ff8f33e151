//! §6.4: a small typed property store for import/export/post-process
//! configuration, keyed by dotted strings such as
//! `import.fbx.read_all_geometry_layers`. Unknown keys are never an error —
//! a codec or pass that doesn't recognise a key logs a warning and ignores
//! it, so a config built for one pipeline can be reused against another
//! without per-codec filtering.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Int(v)
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Float(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::String(v.to_owned())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    values: HashMap<String, ConfigValue>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(ConfigValue::Bool(b)) => *b,
            Some(other) => {
                log::warn!("config key '{key}' expected a bool, found {other:?}; using default");
                default
            }
            None => default,
        }
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(ConfigValue::Int(i)) => *i,
            Some(other) => {
                log::warn!("config key '{key}' expected an int, found {other:?}; using default");
                default
            }
            None => default,
        }
    }

    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        match self.values.get(key) {
            Some(ConfigValue::Float(f)) => *f,
            Some(other) => {
                log::warn!("config key '{key}' expected a float, found {other:?}; using default");
                default
            }
            None => default,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(ConfigValue::String(s)) => Some(s.as_str()),
            Some(other) => {
                log::warn!("config key '{key}' expected a string, found {other:?}");
                None
            }
            None => None,
        }
    }
}

/// Well-known keys named in the external interfaces design.
pub mod keys {
    pub const FBX_READ_ALL_GEOMETRY_LAYERS: &str = "import.fbx.read_all_geometry_layers";
    pub const FBX_READ_MATERIALS: &str = "import.fbx.read_materials";
    pub const MDL_HL1_READ_ANIMATIONS: &str = "import.mdl.hl1.read_animations";
    pub const GLOBAL_MEASURE_TIME: &str = "import.global.measure_time";
    pub const LIMIT_BONE_WEIGHTS_MAX_WEIGHTS: &str = "postprocess.limit_bone_weights.max_weights";
    pub const SPLIT_LARGE_MESHES_TRIANGLE_LIMIT: &str =
        "postprocess.split_large_meshes.triangle_limit";
    pub const SPLIT_LARGE_MESHES_VERTEX_LIMIT: &str = "postprocess.split_large_meshes.vertex_limit";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_falls_back_to_default() {
        let store = ConfigStore::new();
        assert_eq!(store.get_bool("nonexistent.key", true), true);
    }

    #[test]
    fn typed_round_trip() {
        let mut store = ConfigStore::new();
        store.set(keys::FBX_READ_MATERIALS, true);
        store.set(keys::SPLIT_LARGE_MESHES_TRIANGLE_LIMIT, 65535i64);
        assert!(store.get_bool(keys::FBX_READ_MATERIALS, false));
        assert_eq!(
            store.get_int(keys::SPLIT_LARGE_MESHES_TRIANGLE_LIMIT, 0),
            65535
        );
    }
}
