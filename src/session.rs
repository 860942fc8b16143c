//! Captured stills, the bounded capture session, and the query-string handoff
//! between the capture and edit screens.

use std::{fmt, io::Cursor, sync::Arc};

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageError, ImageFormat, ImageOutputFormat, RgbaImage};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::error::SessionDataError;

pub const MAX_PHOTOS: usize = 3;

/// Query parameter carrying the percent-encoded JSON list of data URIs.
pub const HANDOFF_PARAM: &str = "photos";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    fn mime(&self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
        }
    }
}

/// One captured photo, kept encoded. Clones share the bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StillImage {
    kind: ImageKind,
    bytes: Arc<[u8]>,
}

impl StillImage {
    pub fn encode(img: &RgbaImage) -> Result<Self, ImageError> {
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(img.clone()).write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)?;
        Ok(Self {
            kind: ImageKind::Png,
            bytes: png.into(),
        })
    }

    /// Wraps already-encoded bytes; formats other than PNG/JPEG are re-encoded.
    pub fn from_encoded(bytes: Vec<u8>) -> Result<Self, ImageError> {
        match image::guess_format(&bytes)? {
            ImageFormat::Png => Ok(Self {
                kind: ImageKind::Png,
                bytes: bytes.into(),
            }),
            ImageFormat::Jpeg => Ok(Self {
                kind: ImageKind::Jpeg,
                bytes: bytes.into(),
            }),
            _ => Self::encode(&image::load_from_memory(&bytes)?.to_rgba8()),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn decode(&self) -> Result<RgbaImage, ImageError> {
        Ok(image::load_from_memory(&self.bytes)?.to_rgba8())
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.kind.mime(), STANDARD.encode(&self.bytes))
    }

    pub fn from_data_uri(uri: &str) -> Result<Self, SessionDataError> {
        let rest = uri.strip_prefix("data:").ok_or(SessionDataError::NotDataUri)?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or(SessionDataError::NotDataUri)?;
        let kind = match mime {
            "image/png" => ImageKind::Png,
            "image/jpeg" | "image/jpg" => ImageKind::Jpeg,
            _ => return Err(SessionDataError::NotDataUri),
        };
        Ok(Self {
            kind,
            bytes: STANDARD.decode(payload)?.into(),
        })
    }
}

impl fmt::Debug for StillImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StillImage")
            .field("kind", &self.kind)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl TryFrom<String> for StillImage {
    type Error = SessionDataError;

    fn try_from(uri: String) -> Result<Self, Self::Error> {
        Self::from_data_uri(&uri)
    }
}

impl From<StillImage> for String {
    fn from(still: StillImage) -> Self {
        still.to_data_uri()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Added { remaining: usize },
    /// This still filled the last slot.
    Completed,
    /// The session was already full; nothing changed.
    Rejected,
}

/// Ordered stills of one booth run, never more than [`MAX_PHOTOS`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    stills: Vec<StillImage>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a session from loaded stills, dropping any beyond the cap.
    pub fn from_stills(mut stills: Vec<StillImage>) -> Self {
        if stills.len() > MAX_PHOTOS {
            log::warn!("Dropping {} photo(s) beyond the limit", stills.len() - MAX_PHOTOS);
            stills.truncate(MAX_PHOTOS);
        }
        Self { stills }
    }

    pub fn push(&mut self, still: StillImage) -> PushOutcome {
        if self.is_complete() {
            return PushOutcome::Rejected;
        }
        self.stills.push(still);
        if self.is_complete() {
            PushOutcome::Completed
        } else {
            PushOutcome::Added {
                remaining: self.remaining(),
            }
        }
    }

    pub fn stills(&self) -> &[StillImage] {
        &self.stills
    }

    pub fn len(&self) -> usize {
        self.stills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stills.is_empty()
    }

    pub fn remaining(&self) -> usize {
        MAX_PHOTOS - self.stills.len()
    }

    pub fn is_complete(&self) -> bool {
        self.stills.len() >= MAX_PHOTOS
    }

    pub fn reset(&mut self) {
        self.stills.clear();
    }
}

pub fn to_json(stills: &[StillImage]) -> Result<String, SessionDataError> {
    Ok(serde_json::to_string(stills)?)
}

pub fn from_json(json: &str) -> Result<Vec<StillImage>, SessionDataError> {
    Ok(serde_json::from_str(json)?)
}

/// `photos=<percent-encoded JSON array of data URIs>`
pub fn encode_handoff(stills: &[StillImage]) -> Result<String, SessionDataError> {
    let json = to_json(stills)?;
    Ok(format!(
        "{HANDOFF_PARAM}={}",
        utf8_percent_encode(&json, NON_ALPHANUMERIC)
    ))
}

/// Reads the `photos` parameter out of a query string (leading `?` optional).
pub fn decode_handoff(query: &str) -> Result<Vec<StillImage>, SessionDataError> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let raw = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == HANDOFF_PARAM)
        .map(|(_, value)| value)
        .ok_or(SessionDataError::NoPhotos)?;
    let json = percent_decode_str(raw).decode_utf8()?;
    from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn still(shade: u8) -> StillImage {
        StillImage::encode(&RgbaImage::from_pixel(4, 3, Rgba([shade, shade, shade, 255]))).unwrap()
    }

    #[test]
    fn session_never_exceeds_three() {
        let mut session = Session::new();
        assert_eq!(session.push(still(1)), PushOutcome::Added { remaining: 2 });
        assert_eq!(session.push(still(2)), PushOutcome::Added { remaining: 1 });
        assert_eq!(session.push(still(3)), PushOutcome::Completed);
        let before = session.clone();
        assert_eq!(session.push(still(4)), PushOutcome::Rejected);
        assert_eq!(session, before);
        assert_eq!(session.len(), MAX_PHOTOS);
    }

    #[test]
    fn reset_clears_the_session() {
        let mut session = Session::from_stills(vec![still(1), still(2), still(3), still(4)]);
        assert_eq!(session.len(), 3);
        session.reset();
        assert!(session.is_empty());
        assert_eq!(session.push(still(9)), PushOutcome::Added { remaining: 2 });
    }

    #[test]
    fn handoff_round_trips_byte_for_byte() {
        let stills = vec![still(10), still(20), still(30)];
        let query = encode_handoff(&stills).unwrap();
        assert!(query.starts_with("photos="));
        assert!(!query[7..].contains(['"', ',', ':', '/', '+', '=']));
        let back = decode_handoff(&format!("?lang=en&{query}")).unwrap();
        assert_eq!(back, stills);
        for (a, b) in back.iter().zip(&stills) {
            assert_eq!(a.bytes(), b.bytes());
        }
    }

    #[test]
    fn handoff_errors() {
        assert!(matches!(decode_handoff("lang=en"), Err(SessionDataError::NoPhotos)));
        assert!(matches!(decode_handoff("photos=%5Bnope"), Err(SessionDataError::Json(_))));
        assert!(matches!(
            decode_handoff("photos=%5B%22data%3Atext%2Fplain%3Bbase64%2CAA%3D%3D%22%5D"),
            Err(SessionDataError::Json(_))
        ));
    }

    #[test]
    fn data_uri_round_trip() {
        let s = still(77);
        let uri = s.to_data_uri();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(StillImage::from_data_uri(&uri).unwrap(), s);
        assert!(matches!(
            StillImage::from_data_uri("http://example.com/a.png"),
            Err(SessionDataError::NotDataUri)
        ));
        assert!(matches!(
            StillImage::from_data_uri("data:image/png;base64,@@@"),
            Err(SessionDataError::Base64(_))
        ));
    }

    #[test]
    fn decodes_what_it_encodes() {
        let img = still(200).decode().unwrap();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(*img.get_pixel(3, 2), Rgba([200, 200, 200, 255]));
    }
}
