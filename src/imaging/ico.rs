//! Multi-resolution `.ico` container with PNG-embedded entries.
//!
//! Layout: a 6-byte header (reserved, type = 1, count), one 16-byte
//! directory entry per image, then the PNG payloads back to back. Width and
//! height bytes of 0 mean 256.

use super::encoder::OutputArtifact;
use super::error::PipelineError;
use super::params::OutputFormat;
use std::io::Write;

/// Largest side an ICO directory entry can describe.
pub const MAX_ICO_SIDE: u32 = 256;

const HEADER_LEN: usize = 6;
const ENTRY_LEN: usize = 16;

/// Pack PNG artifacts into an ICO file, in the order given.
pub fn pack_ico(images: &[&OutputArtifact]) -> Result<Vec<u8>, PipelineError> {
    if images.is_empty() {
        return Err(PipelineError::invalid("an ICO needs at least one image"));
    }
    if images.len() > u16::MAX as usize {
        return Err(PipelineError::invalid("too many images for one ICO"));
    }
    for artifact in images {
        if artifact.format() != Some(OutputFormat::Png) {
            return Err(PipelineError::invalid(format!(
                "ICO entries must be PNG, got {}",
                artifact.mime_type()
            )));
        }
        if artifact.width() > MAX_ICO_SIDE || artifact.height() > MAX_ICO_SIDE {
            return Err(PipelineError::invalid(format!(
                "ICO entries are at most {MAX_ICO_SIDE}px, got {}x{}",
                artifact.width(),
                artifact.height()
            )));
        }
    }

    let payload: usize = images.iter().map(|a| a.byte_length()).sum();
    let mut out = Vec::with_capacity(HEADER_LEN + ENTRY_LEN * images.len() + payload);

    // reserved=0, type=1 (icon), count
    out.write_all(&[0, 0, 1, 0])?;
    out.write_all(&(images.len() as u16).to_le_bytes())?;

    let mut offset = HEADER_LEN + ENTRY_LEN * images.len();
    for artifact in images {
        out.write_all(&[
            side_byte(artifact.width()),
            side_byte(artifact.height()),
            0, // palette
            0, // reserved
        ])?;
        out.write_all(&1u16.to_le_bytes())?; // color planes
        out.write_all(&32u16.to_le_bytes())?; // bits per pixel
        out.write_all(&(artifact.byte_length() as u32).to_le_bytes())?;
        out.write_all(&(offset as u32).to_le_bytes())?;
        offset += artifact.byte_length();
    }

    for artifact in images {
        out.write_all(artifact.bytes())?;
    }
    Ok(out)
}

fn side_byte(side: u32) -> u8 {
    if side >= MAX_ICO_SIDE { 0 } else { side as u8 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::encoder::encode;
    use crate::imaging::{EncodeRequest, RasterSurface, RustBackend, SurfaceLimits};

    fn artifact(size: u32, request: &EncodeRequest) -> OutputArtifact {
        let surface = RasterSurface::new(size, size, &SurfaceLimits::default()).unwrap();
        encode(&RustBackend::new(), &surface, request).unwrap()
    }

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    #[test]
    fn header_lists_one_entry_per_image() {
        let a16 = artifact(16, &EncodeRequest::png());
        let a32 = artifact(32, &EncodeRequest::png());
        let a256 = artifact(256, &EncodeRequest::png());
        let ico = pack_ico(&[&a16, &a32, &a256]).unwrap();

        assert_eq!(&ico[..4], &[0, 0, 1, 0]);
        assert_eq!(u16_at(&ico, 4), 3);

        let entry = |i: usize| HEADER_LEN + ENTRY_LEN * i;
        assert_eq!(ico[entry(0)], 16);
        assert_eq!(ico[entry(1)], 32);
        assert_eq!(ico[entry(2)], 0, "256 is stored as 0");
        assert_eq!(u16_at(&ico, entry(0) + 6), 32);

        let first_offset = u32_at(&ico, entry(0) + 12) as usize;
        assert_eq!(first_offset, HEADER_LEN + 3 * ENTRY_LEN);
        assert_eq!(u32_at(&ico, entry(0) + 8) as usize, a16.byte_length());
        assert_eq!(&ico[first_offset..first_offset + 8], &a16.bytes()[..8]);

        let second_offset = u32_at(&ico, entry(1) + 12) as usize;
        assert_eq!(second_offset, first_offset + a16.byte_length());
        assert_eq!(
            ico.len(),
            HEADER_LEN + 3 * ENTRY_LEN + a16.byte_length() + a32.byte_length() + a256.byte_length()
        );
    }

    #[test]
    fn packed_ico_sniffs_as_ico() {
        let a = artifact(16, &EncodeRequest::png());
        let ico = pack_ico(&[&a]).unwrap();
        assert_eq!(image::guess_format(&ico).unwrap(), image::ImageFormat::Ico);
    }

    #[test]
    fn rejects_empty_and_non_png_and_oversized() {
        assert!(pack_ico(&[]).is_err());
        let webp = artifact(16, &EncodeRequest::new("image/webp"));
        assert!(pack_ico(&[&webp]).is_err());
        let big = artifact(512, &EncodeRequest::png());
        assert!(pack_ico(&[&big]).is_err());
    }
}
