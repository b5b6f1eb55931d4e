//! Lecture des images soumises à l'analyse.
//!
//! Une image est conservée telle quelle sous forme de data URL
//! (`data:<mime>;base64,<contenu>`), aucun décodage des pixels n'a lieu.

use std::{fmt, fs, path::Path};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Taille maximale acceptée pour une image (10 Mo)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Error reading the image file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Please upload an image file (JPEG, PNG, GIF)")]
    NotAnImage,
    #[error("The image file is empty")]
    Empty,
    #[error("The image exceeds the maximum size of {MAX_IMAGE_SIZE} bytes")]
    TooLarge,
    #[error("Malformed image data URL")]
    MalformedDataUrl,
}

/// Une image encodée, prête à être stockée avec le rapport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    mime: String,
    data: String,
}

impl ImagePayload {
    /// Encode des octets bruts après avoir vérifié qu'il s'agit d'une image
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        if bytes.len() > MAX_IMAGE_SIZE {
            return Err(ImageError::TooLarge);
        }

        let format = image::guess_format(bytes).map_err(|_| ImageError::NotAnImage)?;

        Ok(Self {
            mime: format.to_mime_type().to_owned(),
            data: STANDARD.encode(bytes),
        })
    }

    pub fn parse_data_url(url: &str) -> Result<Self, ImageError> {
        let rest = url.strip_prefix("data:").ok_or(ImageError::MalformedDataUrl)?;
        let (mime, data) = rest
            .split_once(";base64,")
            .ok_or(ImageError::MalformedDataUrl)?;
        if !mime.starts_with("image/") {
            return Err(ImageError::NotAnImage);
        }

        Ok(Self {
            mime: mime.to_owned(),
            data: data.to_owned(),
        })
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Les octets d'origine de l'image
    pub fn bytes(&self) -> Result<Vec<u8>, ImageError> {
        STANDARD
            .decode(&self.data)
            .map_err(|_| ImageError::MalformedDataUrl)
    }

    /// Taille des octets d'origine
    pub fn byte_len(&self) -> usize {
        self.bytes().map(|b| b.len()).unwrap_or(0)
    }

    pub fn to_data_url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, self.data)
    }
}

impl Serialize for ImagePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_data_url().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ImagePayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ImagePayload::parse_data_url(&s)
            .map_err(|_| <D::Error as serde::de::Error>::custom("Invalid image data URL"))
    }
}

/// Source des images soumises
pub trait ImageDecoder {
    fn decode(&self, path: &Path) -> Result<ImagePayload, ImageError>;
}

/// Lit les images depuis le système de fichiers
#[derive(Debug, Default, Clone, Copy)]
pub struct FileImageDecoder;

impl ImageDecoder for FileImageDecoder {
    fn decode(&self, path: &Path) -> Result<ImagePayload, ImageError> {
        let bytes = fs::read(path)?;
        ImagePayload::from_bytes(&bytes)
    }
}
