//! Error types shared across the capture, session, and compositing layers.

use std::path::PathBuf;

use image::ImageError;

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("Image: {0}")]
    Image(#[from] ImageError),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FilterError {
    #[error("Unknown filter function '{0}'")]
    UnknownFunction(String),
    #[error("Malformed filter expression near '{0}'")]
    Malformed(String),
    #[error("Invalid value '{value}' for {function}")]
    InvalidValue { function: String, value: String },
}

#[derive(thiserror::Error, Debug)]
pub enum SessionDataError {
    #[error("No photos found")]
    NoPhotos,
    #[error("Not an image data URI")]
    NotDataUri,
    #[error("Base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Query parameter is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("Store: {0}")]
    Store(#[from] StoreError),
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not replace {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum CompositeError {
    #[error("Strip is not ready (state: {0})")]
    NotReady(&'static str),
    #[error("Strip was already exported")]
    AlreadyExported,
    #[error("No photos to lay out")]
    NoPhotos,
    #[error("Photo {index} failed to decode: {source}")]
    Decode { index: usize, source: ImageError },
    #[error("Decode worker disconnected before all photos finished")]
    WorkerLost,
    #[error("Image: {0}")]
    Image(#[from] ImageError),
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store: {0}")]
    Store(#[from] StoreError),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Font {path}: {reason}")]
    Font { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = FilterError::InvalidValue {
            function: "contrast".into(),
            value: "abc".into(),
        };
        assert_eq!(err.to_string(), "Invalid value 'abc' for contrast");

        let err = CompositeError::NotReady("loading");
        assert!(err.to_string().contains("loading"));

        assert_eq!(SessionDataError::NotDataUri.to_string(), "Not an image data URI");
    }
}
