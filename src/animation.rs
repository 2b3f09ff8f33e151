//! Animation data, following `fkoep-assimp_import-rs/src/anim.rs`:
//! per-channel position/rotation/scaling key tracks addressed by node name,
//! plus pre/post extrapolation behavior.

use glam::{Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorKey {
    pub time: f64,
    pub value: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuatKey {
    pub time: f64,
    pub value: Quat,
}

/// What a channel does before its first key / after its last key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimBehavior {
    #[default]
    Default,
    Constant,
    Linear,
    Repeat,
}

/// One animated node's position/rotation/scaling tracks. Times within each
/// of `position_keys`, `rotation_keys` and `scaling_keys` must be
/// non-decreasing (invariant `NonMonotonicAnimation`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeAnim {
    /// Name of the target node, resolved by name (not index) since multiple
    /// formats address animation targets this way.
    pub node_name: String,
    pub position_keys: Vec<VectorKey>,
    pub rotation_keys: Vec<QuatKey>,
    pub scaling_keys: Vec<VectorKey>,
    pub pre_state: AnimBehavior,
    pub post_state: AnimBehavior,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Animation {
    pub name: String,
    pub duration: f64,
    pub ticks_per_second: f64,
    pub channels: Vec<NodeAnim>,
}

fn is_monotonic(times: impl Iterator<Item = f64>) -> bool {
    let mut last = f64::NEG_INFINITY;
    for t in times {
        if t < last {
            return false;
        }
        last = t;
    }
    true
}

impl NodeAnim {
    pub fn is_monotonic(&self) -> bool {
        is_monotonic(self.position_keys.iter().map(|k| k.time))
            && is_monotonic(self.rotation_keys.iter().map(|k| k.time))
            && is_monotonic(self.scaling_keys.iter().map(|k| k.time))
    }
}
