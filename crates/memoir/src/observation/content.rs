//! Content parts carried by observations: text spans and media items.

use crate::error::CodecError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;

/// One ordered piece of an observation's content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    Media(Media),
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            Self::Media(_) => None,
        }
    }

    pub fn is_media(&self) -> bool {
        matches!(self, Self::Media(_))
    }
}

impl From<&str> for ContentPart {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ContentPart {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Media> for ContentPart {
    fn from(media: Media) -> Self {
        Self::Media(media)
    }
}

/// Supported image encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Gif,
}

impl ImageFormat {
    /// Short format tag used in snapshots (`png`, `jpeg`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }

    /// MIME type handed to model clients.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Parse a format tag. Accepts `jpg` as an alias and an `image/` prefix.
    pub fn parse(tag: &str) -> Result<Self, CodecError> {
        let tag = tag.strip_prefix("image/").unwrap_or(tag);
        match tag.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            "gif" => Ok(Self::Gif),
            _ => Err(CodecError::UnsupportedFormat(tag.to_string())),
        }
    }

    /// Detect the format from the leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An encoded image owned by an observation.
#[derive(Clone, PartialEq, Eq)]
pub struct Media {
    format: ImageFormat,
    data: Vec<u8>,
}

impl Media {
    /// Wrap already-encoded image bytes with a known format.
    pub fn new(format: ImageFormat, data: impl Into<Vec<u8>>) -> Self {
        Self {
            format,
            data: data.into(),
        }
    }

    /// Wrap image bytes, detecting the format from their signature.
    pub fn detect(data: impl Into<Vec<u8>>) -> Result<Self, CodecError> {
        let data = data.into();
        let format = ImageFormat::sniff(&data).ok_or(CodecError::UnknownFormat)?;
        Ok(Self { format, data })
    }

    /// Decode a base64 payload. A leading `data:<mime>;base64,` header is
    /// stripped first.
    pub fn from_base64(format: ImageFormat, payload: &str) -> Result<Self, CodecError> {
        let payload = strip_data_url(payload);
        let data = STANDARD.decode(payload.trim())?;
        if data.is_empty() {
            return Err(CodecError::EmptyPayload);
        }
        Ok(Self { format, data })
    }

    /// Encode the bytes as standard base64.
    pub fn to_base64(&self) -> Result<String, CodecError> {
        if self.data.is_empty() {
            return Err(CodecError::EmptyPayload);
        }
        Ok(STANDARD.encode(&self.data))
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Media")
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .finish()
    }
}

fn strip_data_url(payload: &str) -> &str {
    match payload.strip_prefix("data:") {
        Some(rest) => rest.split_once(";base64,").map_or(payload, |(_, data)| data),
        None => payload,
    }
}
