//! GLB binary container header/chunk reader and writer, grounded directly
//! on `examples/gltf-rs-gltf/src/binary.rs`'s `Header`/`ChunkType` shape,
//! generalised to also write a GLB (the teacher's historical snapshot only
//! reads one).

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

use crate::error::{Error, Result};

const MAGIC: u32 = 0x46546C67; // "glTF"
const VERSION: u32 = 2;
const CHUNK_TYPE_JSON: u32 = 0x4E4F534A; // "JSON"
const CHUNK_TYPE_BIN: u32 = 0x004E4942; // "BIN\0"
const HEADER_LENGTH: u32 = 12;
const CHUNK_HEADER_LENGTH: u32 = 8;

#[derive(Debug, Clone)]
pub struct Glb {
    pub json: Vec<u8>,
    pub bin: Option<Vec<u8>>,
}

fn read_chunk(cursor: &mut Cursor<&[u8]>) -> Result<(u32, Vec<u8>)> {
    let length = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| Error::malformed("truncated GLB chunk header"))?;
    let chunk_type = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| Error::malformed("truncated GLB chunk header"))?;
    let mut data = vec![0u8; length as usize];
    std::io::Read::read_exact(cursor, &mut data)
        .map_err(|_| Error::malformed("truncated GLB chunk data"))?;
    Ok((chunk_type, data))
}

impl Glb {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let magic = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| Error::malformed("truncated GLB header"))?;
        if magic != MAGIC {
            return Err(Error::UnknownFormat);
        }
        let version = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| Error::malformed("truncated GLB header"))?;
        if version != VERSION {
            return Err(Error::UnsupportedVariant(format!("GLB version {version}")));
        }
        let _total_length = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| Error::malformed("truncated GLB header"))?;

        let (first_type, first_data) = read_chunk(&mut cursor)?;
        if first_type != CHUNK_TYPE_JSON {
            return Err(Error::malformed("first GLB chunk must be of type JSON"));
        }

        let mut bin = None;
        if (cursor.position() as usize) < bytes.len() {
            let (second_type, second_data) = read_chunk(&mut cursor)?;
            if second_type == CHUNK_TYPE_BIN {
                bin = Some(second_data);
            }
        }

        Ok(Glb {
            json: first_data,
            bin,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let json_padded = pad_to_four(&self.json, b' ');
        let bin_padded = self.bin.as_ref().map(|b| pad_to_four(b, 0));

        let mut total_length = HEADER_LENGTH + CHUNK_HEADER_LENGTH + json_padded.len() as u32;
        if let Some(bin) = &bin_padded {
            total_length += CHUNK_HEADER_LENGTH + bin.len() as u32;
        }

        let mut out = Vec::with_capacity(total_length as usize);
        out.write_u32::<LittleEndian>(MAGIC).unwrap();
        out.write_u32::<LittleEndian>(VERSION).unwrap();
        out.write_u32::<LittleEndian>(total_length).unwrap();

        out.write_u32::<LittleEndian>(json_padded.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(CHUNK_TYPE_JSON).unwrap();
        out.extend_from_slice(&json_padded);

        if let Some(bin) = bin_padded {
            out.write_u32::<LittleEndian>(bin.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(CHUNK_TYPE_BIN).unwrap();
            out.extend_from_slice(&bin);
        }

        out
    }
}

fn pad_to_four(data: &[u8], pad_byte: u8) -> Vec<u8> {
    let mut out = data.to_vec();
    while out.len() % 4 != 0 {
        out.push(pad_byte);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_json_and_bin_chunks() {
        let glb = Glb {
            json: br#"{"asset":{"version":"2.0"}}"#.to_vec(),
            bin: Some(vec![1, 2, 3, 4, 5]),
        };
        let bytes = glb.to_bytes();
        let parsed = Glb::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.json, glb.json);
        // bin is padded to a 4-byte boundary with zero bytes.
        assert_eq!(&parsed.bin.unwrap()[..5], &[1, 2, 3, 4, 5][..]);
    }

    #[test]
    fn rejects_bad_magic() {
        let bytes = [0u8; 20];
        assert!(matches!(Glb::from_bytes(&bytes), Err(Error::UnknownFormat)));
    }

    #[test]
    fn json_only_glb_has_no_bin_chunk() {
        let glb = Glb {
            json: br#"{"asset":{"version":"2.0"}}"#.to_vec(),
            bin: None,
        };
        let bytes = glb.to_bytes();
        let parsed = Glb::from_bytes(&bytes).unwrap();
        assert!(parsed.bin.is_none());
    }
}
