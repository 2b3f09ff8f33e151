//! Texture storage, following `fkoep-assimp_import-rs/src/texture.rs`'s
//! tagged layout: an uncompressed texture has `height != 0` and a
//! `width * height` texel buffer; a compressed texture (the embedded-JPEG/
//! PNG case used by 3MF thumbnails and glTF images) has `height == 0` and
//! `width` holding the byte length of the raw compressed payload in
//! `data`, tagged with a format hint.

/// An uncompressed RGBA8 texel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextureData {
    /// Decoded texel grid, `width * height` texels, row-major.
    Texels(Vec<Texel>),
    /// Raw compressed bytes (e.g. the literal contents of a `.png`/`.jpg`
    /// file), tagged with a lowercase three-or-four character format hint
    /// such as `"png"` or `"jpg"`.
    Compressed { format_hint: String, bytes: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    /// Often a synthetic name such as `*0` for embedded textures that have
    /// no path of their own (mirrors assimp's `*N`-indexed embedded texture
    /// convention).
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub data: TextureData,
}

impl Texture {
    pub fn from_texels(filename: impl Into<String>, width: u32, height: u32, texels: Vec<Texel>) -> Self {
        Texture {
            filename: filename.into(),
            width,
            height,
            data: TextureData::Texels(texels),
        }
    }

    pub fn from_compressed(filename: impl Into<String>, format_hint: impl Into<String>, bytes: Vec<u8>) -> Self {
        let width = bytes.len() as u32;
        Texture {
            filename: filename.into(),
            width,
            height: 0,
            data: TextureData::Compressed {
                format_hint: format_hint.into(),
                bytes,
            },
        }
    }

    /// `None` for uncompressed textures, matching the teacher's
    /// `format_hint()` returning `None` when `height != 0`.
    pub fn format_hint(&self) -> Option<&str> {
        match &self.data {
            TextureData::Compressed { format_hint, .. } => Some(format_hint.as_str()),
            TextureData::Texels(_) => None,
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.data, TextureData::Compressed { .. })
    }
}
