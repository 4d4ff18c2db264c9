//! Image codec seam
//!
//! Pixel decoding and scaling live outside this crate. The engine only needs
//! an owned, cloneable thumbnail per frame and an on-demand full-resolution
//! decode for detailed previews.

use std::path::Path;

use crate::error::{EngineError, EngineResult};

/// Owned bitmap handle
///
/// The engine treats the pixel payload as opaque. Cloning is a deep copy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bitmap {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel (or encoded) payload
    pub pixels: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Decoder for frame images
pub trait FrameCodec: Send + Sync {
    /// Decode `path` and scale it into a `size`×`size` thumbnail
    fn decode_thumbnail(&self, path: &Path, size: u16) -> EngineResult<Bitmap>;

    /// Decode `path` at full resolution
    fn decode_full(&self, path: &Path) -> EngineResult<Bitmap>;
}

/// Codec that keeps the encoded file contents as the bitmap payload
///
/// Used by headless runs where nothing is ever drawn. It still verifies
/// that every frame file is readable and non-empty, so import and
/// recording see the same failures a real decoder would report for
/// missing or truncated files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCodec;

impl PassthroughCodec {
    fn read(path: &Path) -> EngineResult<Vec<u8>> {
        let bytes = std::fs::read(path).map_err(|e| EngineError::io(path, e))?;
        if bytes.is_empty() {
            return Err(EngineError::Decode(format!("{}: empty image file", path.display())));
        }
        Ok(bytes)
    }
}

impl FrameCodec for PassthroughCodec {
    fn decode_thumbnail(&self, path: &Path, size: u16) -> EngineResult<Bitmap> {
        let bytes = Self::read(path)?;
        Ok(Bitmap::new(size as u32, size as u32, bytes))
    }

    fn decode_full(&self, path: &Path) -> EngineResult<Bitmap> {
        let bytes = Self::read(path)?;
        Ok(Bitmap::new(0, 0, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_reads_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("00000001.jpg");
        std::fs::write(&path, b"\xff\xd8fake").unwrap();

        let thumb = PassthroughCodec.decode_thumbnail(&path, 64).unwrap();
        assert_eq!(thumb.width, 64);
        assert_eq!(thumb.height, 64);
        assert_eq!(thumb.pixels, b"\xff\xd8fake");
    }

    #[test]
    fn test_passthrough_missing_file_is_io_error() {
        let err = PassthroughCodec
            .decode_thumbnail(Path::new("/nonexistent/frame.jpg"), 64)
            .unwrap_err();
        assert!(err.is_io_kind(std::io::ErrorKind::NotFound));
    }

    #[test]
    fn test_passthrough_empty_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.jpg");
        std::fs::write(&path, b"").unwrap();

        let err = PassthroughCodec.decode_full(&path).unwrap_err();
        assert!(matches!(err, EngineError::Decode(_)));
    }
}
