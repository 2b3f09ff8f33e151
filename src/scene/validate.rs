//! Implements the nine scene invariants. `validate` reports the first
//! failing invariant, checked in the fixed order listed below, matching the
//! "first failing invariant" contract.

use std::collections::HashSet;

use crate::error::{Error, Invariant, Result};

use super::Scene;

impl Scene {
    pub fn validate(&self) -> Result<()> {
        self.check_mesh_indices()?;
        self.check_material_indices()?;
        self.check_texture_indices()?;
        self.check_bone_node_names()?;
        self.check_stream_lengths()?;
        self.check_face_indices()?;
        self.check_tree_shape()?;
        self.check_animation_monotonicity()?;
        self.check_compressed_texture_shape()?;
        Ok(())
    }

    fn check_mesh_indices(&self) -> Result<()> {
        let mesh_count = self.meshes.len() as u32;
        for (_, node) in self.nodes.iter() {
            for &m in &node.meshes {
                if m >= mesh_count {
                    return Err(Error::InvariantViolation(Invariant::MeshIndexOutOfRange));
                }
            }
        }
        Ok(())
    }

    fn check_material_indices(&self) -> Result<()> {
        let material_count = self.materials.len() as u32;
        for mesh in &self.meshes {
            if mesh.material_index >= material_count && material_count > 0 {
                return Err(Error::InvariantViolation(Invariant::MaterialIndexOutOfRange));
            }
        }
        Ok(())
    }

    fn check_texture_indices(&self) -> Result<()> {
        use crate::material::keys;

        let texture_count = self.textures.len() as u32;
        let texture_keys = [
            keys::DIFFUSE_TEXTURE,
            keys::BASE_COLOR_TEXTURE,
            keys::NORMAL_TEXTURE,
        ];
        for material in &self.materials {
            for key in texture_keys {
                if let Some(index) = material.texture_index(key) {
                    if index >= texture_count {
                        return Err(Error::InvariantViolation(Invariant::TextureIndexOutOfRange));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_bone_node_names(&self) -> Result<()> {
        for mesh in &self.meshes {
            for bone in &mesh.bones {
                if self.nodes.find_by_name(&bone.name).is_none() {
                    return Err(Error::InvariantViolation(Invariant::BoneNodeUnresolved));
                }
            }
        }
        Ok(())
    }

    fn check_stream_lengths(&self) -> Result<()> {
        for mesh in &self.meshes {
            let n = mesh.vertex_count();
            let ok = (mesh.normals.is_empty() || mesh.normals.len() == n)
                && (mesh.tangents.is_empty() || mesh.tangents.len() == n)
                && (mesh.bitangents.is_empty() || mesh.bitangents.len() == n)
                && mesh.colors.iter().all(|c| c.is_empty() || c.len() == n)
                && mesh
                    .texture_coords
                    .iter()
                    .all(|t| t.is_empty() || t.len() == n);
            if !ok {
                return Err(Error::InvariantViolation(Invariant::StreamLengthMismatch));
            }
        }
        Ok(())
    }

    fn check_face_indices(&self) -> Result<()> {
        for mesh in &self.meshes {
            let n = mesh.vertex_count() as u32;
            for face in &mesh.faces {
                if face.indices.iter().any(|&i| i >= n) {
                    return Err(Error::InvariantViolation(Invariant::FaceIndexOutOfRange));
                }
            }
        }
        Ok(())
    }

    fn check_tree_shape(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (id, _) in self.nodes.iter() {
            if !seen.insert(id) {
                return Err(Error::InvariantViolation(Invariant::DuplicateNode));
            }
        }
        // Every non-root node must be reachable exactly once by walking
        // from the root via `children` (arena construction already
        // guarantees this; this is a defence against hand-built scenes).
        let mut reached = HashSet::new();
        for id in self.nodes.walk(self.nodes.root()) {
            if !reached.insert(id) {
                return Err(Error::InvariantViolation(Invariant::DuplicateNode));
            }
        }
        if reached.len() != self.nodes.len() {
            return Err(Error::InvariantViolation(Invariant::DuplicateNode));
        }
        Ok(())
    }

    fn check_animation_monotonicity(&self) -> Result<()> {
        for anim in &self.animations {
            for channel in &anim.channels {
                if !channel.is_monotonic() {
                    return Err(Error::InvariantViolation(Invariant::NonMonotonicAnimation));
                }
            }
        }
        Ok(())
    }

    fn check_compressed_texture_shape(&self) -> Result<()> {
        for texture in &self.textures {
            if let crate::texture::TextureData::Compressed { bytes, .. } = &texture.data {
                if texture.height != 0 || texture.width as usize != bytes.len() {
                    return Err(Error::InvariantViolation(
                        Invariant::CompressedTextureShape,
                    ));
                }
            }
        }
        Ok(())
    }
}
