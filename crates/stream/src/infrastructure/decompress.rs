use flate2::read::{DeflateDecoder, GzDecoder};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;

use crate::domain::Decompressor;
use crate::error::DecompressError;

/// Gzip-wrapped frames (Huobi, OKEx v3 binary frames)
#[derive(Debug, Clone, Copy, Default)]
pub struct Gzip;

/// Raw deflate frames
#[derive(Debug, Clone, Copy, Default)]
pub struct Deflate;

/// Pass-through
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Decompressor for Gzip {
    fn decompress(&self, raw: &[u8]) -> Result<Vec<u8>, DecompressError> {
        let mut out = Vec::with_capacity(raw.len() * 4);
        GzDecoder::new(raw)
            .read_to_end(&mut out)
            .map_err(|source| DecompressError::Codec { codec: "gzip", source })?;
        Ok(out)
    }

    fn name(&self) -> &str {
        "gzip"
    }
}

impl Decompressor for Deflate {
    fn decompress(&self, raw: &[u8]) -> Result<Vec<u8>, DecompressError> {
        let mut out = Vec::with_capacity(raw.len() * 4);
        DeflateDecoder::new(raw)
            .read_to_end(&mut out)
            .map_err(|source| DecompressError::Codec { codec: "deflate", source })?;
        Ok(out)
    }

    fn name(&self) -> &str {
        "deflate"
    }
}

impl Decompressor for Identity {
    fn decompress(&self, raw: &[u8]) -> Result<Vec<u8>, DecompressError> {
        Ok(raw.to_vec())
    }

    fn name(&self) -> &str {
        "identity"
    }
}

/// Compression named in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Deflate,
}

impl Compression {
    /// `None` means frames are dispatched without a decompression step
    pub fn decompressor(&self) -> Option<Arc<dyn Decompressor>> {
        match self {
            Compression::None => None,
            Compression::Gzip => Some(Arc::new(Gzip)),
            Compression::Deflate => Some(Arc::new(Deflate)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{DeflateEncoder, GzEncoder};
    use std::io::Write;

    const FRAME: &[u8] = br#"{"ch":"market.btcusdt.detail","ts":1630000000000}"#;

    #[test]
    fn test_gzip_roundtrip() {
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(FRAME).unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(Gzip.decompress(&compressed).unwrap(), FRAME);
    }

    #[test]
    fn test_deflate_roundtrip() {
        let mut encoder = DeflateEncoder::new(Vec::new(), flate2::Compression::fast());
        encoder.write_all(FRAME).unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(Deflate.decompress(&compressed).unwrap(), FRAME);
    }

    #[test]
    fn test_gzip_rejects_plain_text() {
        let err = Gzip.decompress(FRAME).unwrap_err();
        assert!(err.to_string().starts_with("gzip decode failed"));
    }

    #[test]
    fn test_compression_from_config() {
        let c: Compression = serde_json::from_str("\"gzip\"").unwrap();
        assert_eq!(c, Compression::Gzip);
        assert_eq!(c.decompressor().map(|d| d.name().to_string()), Some("gzip".to_string()));
        assert!(Compression::None.decompressor().is_none());
    }
}
