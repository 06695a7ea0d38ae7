use crate::error::{ErrorKind, Result};
use derive_more::Display;
use exn::ResultExt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const ZIP_EMPTY_MAGIC: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];
const ZIP_SPANNED_MAGIC: [u8; 4] = [0x50, 0x4B, 0x07, 0x08];
const RAR_MAGIC: [u8; 6] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07];
const PDF_MAGIC: [u8; 5] = *b"%PDF-";
const MATROSKA_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];
const MP4_BRAND: [u8; 4] = *b"ftyp";
const RIFF_MAGIC: [u8; 4] = *b"RIFF";
const AVI_FORM: [u8; 4] = *b"AVI ";
const SNIFF_LEN: usize = 16;

/// Video container formats.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum VideoFormat {
    /// Matroska and WebM (.mkv, .webm)
    #[display("matroska")]
    Matroska,
    /// ISO base media (.mp4, .m4v, .mov)
    #[display("mp4")]
    Mp4,
    /// RIFF AVI (.avi)
    #[display("avi")]
    Avi,
}

/// What a file's leading bytes say it is.
///
/// Only [`Zip`](Self::Zip) is ever opened; the other variants exist so
/// callers can tell a container apart from a plain file.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    #[display("zip")]
    Zip,
    #[display("rar")]
    Rar,
    #[display("pdf")]
    Pdf,
    #[display("video ({_0})")]
    Video(VideoFormat),
    #[default]
    #[display("unsupported")]
    Unsupported,
}
impl From<&[u8]> for ArchiveKind {
    fn from(value: &[u8]) -> Self {
        ArchiveKind::from_magic_bytes(value)
    }
}
impl ArchiveKind {
    /// Detect the container format from magic bytes.
    ///
    /// Returns [`Unsupported`](Self::Unsupported) if nothing matches or the
    /// input is too short to tell.
    #[must_use]
    pub fn from_magic_bytes(bytes: &[u8]) -> Self {
        if bytes.starts_with(&ZIP_MAGIC) || bytes.starts_with(&ZIP_EMPTY_MAGIC) || bytes.starts_with(&ZIP_SPANNED_MAGIC)
        {
            return ArchiveKind::Zip;
        }
        if bytes.starts_with(&RAR_MAGIC) {
            return ArchiveKind::Rar;
        }
        if bytes.starts_with(&PDF_MAGIC) {
            return ArchiveKind::Pdf;
        }
        if bytes.starts_with(&MATROSKA_MAGIC) {
            return ArchiveKind::Video(VideoFormat::Matroska);
        }
        if bytes.get(4..8) == Some(MP4_BRAND.as_slice()) {
            return ArchiveKind::Video(VideoFormat::Mp4);
        }
        if bytes.starts_with(&RIFF_MAGIC) && bytes.get(8..12) == Some(AVI_FORM.as_slice()) {
            return ArchiveKind::Video(VideoFormat::Avi);
        }
        ArchiveKind::Unsupported
    }

    /// Read the first bytes of a file and detect its format.
    pub fn sniff(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).or_raise(|| ErrorKind::Unreadable(path.to_path_buf()))?;
        let mut head = Vec::with_capacity(SNIFF_LEN);
        file.take(SNIFF_LEN as u64)
            .read_to_end(&mut head)
            .or_raise(|| ErrorKind::Unreadable(path.to_path_buf()))?;
        Ok(ArchiveKind::from_magic_bytes(&head))
    }
}
