//! Recorded audio clips handed over by a capture source.

use std::path::Path;

use sha2::{Digest, Sha256};

/// Declared format of an uploaded clip.
///
/// Only one format is declared; it is not negotiated per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFormat {
    #[default]
    Wav,
}

impl AudioFormat {
    /// Filename sent with the multipart upload
    pub fn file_name(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "recording.wav",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
        }
    }
}

/// A completed recording: opaque bytes plus the declared format.
///
/// The payload is never inspected or transcoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    bytes: Vec<u8>,
    format: AudioFormat,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, format: AudioFormat) -> Self {
        Self { bytes, format }
    }

    /// Clip declared as WAV
    pub fn wav(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(bytes.into(), AudioFormat::Wav)
    }

    /// Read a clip from disk, declaring it as WAV whatever its extension
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::wav(bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn file_name(&self) -> &'static str {
        self.format.file_name()
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Short SHA256 digest (12 hex chars), safe to log in place of the payload
    pub fn digest(&self) -> String {
        digest_bytes(&self.bytes)
    }
}

/// Short SHA256 digest of arbitrary bytes
pub fn digest_bytes(bytes: &[u8]) -> String {
    let hash = Sha256::digest(bytes);
    hex::encode(hash)[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_declares_fixed_filename() {
        let clip = AudioClip::wav(vec![1, 2, 3]);
        assert_eq!(clip.file_name(), "recording.wav");
        assert_eq!(clip.mime_type(), "audio/wav");
        assert_eq!(clip.len(), 3);
    }

    #[test]
    fn test_digest_is_short_and_stable() {
        let a = AudioClip::wav(b"RIFF....WAVE".to_vec());
        let b = AudioClip::wav(b"RIFF....WAVE".to_vec());
        assert_eq!(a.digest().len(), 12);
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), AudioClip::wav(b"other".to_vec()).digest());
    }

    #[tokio::test]
    async fn test_from_path_reads_bytes_verbatim() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("take1.webm");
        tokio::fs::write(&path, b"not really wav").await.unwrap();

        let clip = AudioClip::from_path(&path).await.unwrap();
        assert_eq!(clip.bytes(), b"not really wav");
        assert_eq!(clip.format(), AudioFormat::Wav);
    }
}
