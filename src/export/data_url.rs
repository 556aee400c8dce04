use base64::{Engine as _, engine::general_purpose::STANDARD};

use super::error::ExportError;

const PNG_PREFIX: &str = "data:image/png;base64,";

/// A `data:image/png;base64,` URL holding an encoded snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDataUrl(String);

impl ImageDataUrl {
    pub fn from_png(bytes: &[u8]) -> Self {
        Self(format!("{PNG_PREFIX}{}", STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn decode(&self) -> Result<Vec<u8>, ExportError> {
        let payload = self
            .0
            .strip_prefix(PNG_PREFIX)
            .ok_or(ExportError::MalformedDataUrl)?;
        STANDARD
            .decode(payload)
            .map_err(|_| ExportError::MalformedDataUrl)
    }
}

impl TryFrom<String> for ImageDataUrl {
    type Error = ExportError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.starts_with(PNG_PREFIX) {
            Ok(Self(value))
        } else {
            Err(ExportError::MalformedDataUrl)
        }
    }
}
