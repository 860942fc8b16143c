//! Owns one booth run: the capture session, the capture pipeline and the
//! store the session is handed over through.

use crate::{
    capture::{CapturePipeline, FrameSource},
    error::{CaptureError, SessionDataError},
    session::{self, PushOutcome, Session, StillImage, MAX_PHOTOS},
    storage::{KeyValueStore, CAPTURED_PHOTOS_KEY},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Captured { taken: usize, remaining: usize },
    /// The last slot was filled; the session is ready for editing.
    Completed,
    /// Session already full.
    Rejected,
    /// The source had no frame yet.
    NotReady,
}

impl CaptureOutcome {
    /// Message to show the user, if any.
    pub fn notice(&self) -> Option<String> {
        match self {
            CaptureOutcome::Rejected => Some(format!(
                "Maximum {MAX_PHOTOS} photos allowed! Creating your photo strip..."
            )),
            CaptureOutcome::Completed => Some("All photos taken! Creating your photo strip...".into()),
            CaptureOutcome::Captured { .. } | CaptureOutcome::NotReady => None,
        }
    }
}

pub struct Booth {
    session: Session,
    pipeline: CapturePipeline,
    store: Box<dyn KeyValueStore>,
}

impl Booth {
    pub fn new(pipeline: CapturePipeline, store: Box<dyn KeyValueStore>) -> Self {
        Self {
            session: Session::new(),
            pipeline,
            store,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn pipeline(&self) -> &CapturePipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut CapturePipeline {
        &mut self.pipeline
    }

    pub fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        self.store.as_mut()
    }

    /// Takes one photo. Completing the session also persists it.
    pub fn capture(&mut self, source: &mut dyn FrameSource) -> Result<CaptureOutcome, CaptureError> {
        if self.session.is_complete() {
            log::warn!("Capture rejected: session already holds {MAX_PHOTOS} photos");
            return Ok(CaptureOutcome::Rejected);
        }
        let Some(still) = self.pipeline.capture_frame(source)? else {
            return Ok(CaptureOutcome::NotReady);
        };
        Ok(match self.session.push(still) {
            PushOutcome::Added { remaining } => CaptureOutcome::Captured {
                taken: self.session.len(),
                remaining,
            },
            PushOutcome::Completed => {
                if let Err(err) = self.persist_session() {
                    log::warn!("Could not store captured photos: {err}");
                }
                CaptureOutcome::Completed
            }
            PushOutcome::Rejected => CaptureOutcome::Rejected,
        })
    }

    pub fn persist_session(&mut self) -> Result<(), SessionDataError> {
        let json = session::to_json(self.session.stills())?;
        self.store.set(CAPTURED_PHOTOS_KEY, &json)?;
        log::info!("Stored {} photo(s)", self.session.len());
        Ok(())
    }

    /// Persists the session and returns the handoff query for the edit screen.
    pub fn finish(&mut self) -> Result<String, SessionDataError> {
        if self.session.is_empty() {
            return Err(SessionDataError::NoPhotos);
        }
        self.persist_session()?;
        session::encode_handoff(self.session.stills())
    }

    /// Starts over: empties the session and forgets the stored photos.
    pub fn restart(&mut self) -> Result<(), SessionDataError> {
        self.session.reset();
        self.store.remove(CAPTURED_PHOTOS_KEY)?;
        log::info!("Session restarted");
        Ok(())
    }

    /// Finds the photos to edit: the handoff query first, then the store.
    /// Unreadable data is logged and skipped.
    pub fn load_for_edit(&self, query: Option<&str>) -> Result<Vec<StillImage>, SessionDataError> {
        if let Some(query) = query {
            match session::decode_handoff(query) {
                Ok(stills) if !stills.is_empty() => {
                    log::info!("Loaded {} photo(s) from handoff", stills.len());
                    return Ok(Session::from_stills(stills).stills().to_vec());
                }
                Ok(_) => log::debug!("Handoff carried no photos"),
                Err(SessionDataError::NoPhotos) => {}
                Err(err) => log::error!("Error parsing photos from handoff: {err}"),
            }
        }
        match self.store.get(CAPTURED_PHOTOS_KEY) {
            Ok(Some(json)) => match session::from_json(&json) {
                Ok(stills) if !stills.is_empty() => {
                    log::info!("Loaded {} photo(s) from store", stills.len());
                    return Ok(Session::from_stills(stills).stills().to_vec());
                }
                Ok(_) => {}
                Err(err) => log::error!("Error parsing stored photos: {err}"),
            },
            Ok(None) => {}
            Err(err) => log::error!("Could not read stored photos: {err}"),
        }
        Err(SessionDataError::NoPhotos)
    }
}
