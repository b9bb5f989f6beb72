//! # Live Preview Synchronizer
//!
//! Keeps a rendered PDF preview consistent with the latest in-progress
//! document while minimizing redundant network work.
//!
//! ## Pipeline
//!
//! - **Fingerprint gate**: a serialized snapshot of the document is compared
//!   against the previous one; identical snapshots are no-ops
//! - **Content gate**: nothing is rendered until the document has meaningful
//!   content, so an empty editor never generates throwaway previews
//! - **Immediate first render**: the first transition into meaningful content
//!   skips the debounce (bulk import lands fully formed)
//! - **Debounce**: subsequent edits wait out a quiet period; only the last
//!   edit in a burst triggers a render
//! - **Supersede**: starting a render aborts the previous in-flight one, and
//!   a generation counter guarantees only the last-started request can
//!   install its result
//! - **Frame lifecycle**: the previous frame is released before a replacement
//!   is installed; teardown aborts everything and releases the frame
//!
//! Render failures surface as text but keep the last good frame on screen;
//! a superseded request's outcome is discarded unconditionally.

mod frame;

pub use frame::PdfFrame;

use crate::client::ApiClient;
use crate::shared::config::AppConfig;
use crate::shared::types::ResumeData;
use frame::FrameSlot;
use futures_util::future::{AbortHandle, Abortable, Aborted};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Endpoint rendering an in-progress (unsaved) document
const PREVIEW_ENDPOINT: &str = "/generate?preview=true";

/// Observable pipeline status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewStatus {
    /// Monotonic count of installed frames
    pub revision: u64,
    /// A render is currently in flight
    pub generating: bool,
    /// Last render failure; cleared by the next successful render
    pub error: Option<String>,
}

/// Wire payload of a preview render: the document plus the UI language
#[derive(Serialize)]
struct RenderPayload<'a> {
    #[serde(flatten)]
    data: &'a ResumeData,
    lang: &'a str,
}

struct Inner {
    fingerprint: Option<String>,
    primed: bool,
    generation: u64,
    debounce: Option<JoinHandle<()>>,
    render: Option<AbortHandle>,
    slot: FrameSlot,
}

impl Inner {
    fn new() -> Self {
        Self {
            fingerprint: None,
            primed: false,
            generation: 0,
            debounce: None,
            render: None,
            slot: FrameSlot::new(),
        }
    }
}

/// State shared with the debounce and render tasks
#[derive(Clone)]
struct Shared {
    client: Arc<ApiClient>,
    inner: Arc<Mutex<Inner>>,
    status: Arc<watch::Sender<PreviewStatus>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a render for `payload`, superseding any in-flight one.
    ///
    /// Called with the inner lock held; the request itself runs on a
    /// spawned task guarded by an abort handle and the generation counter.
    fn start_render(&self, inner: &mut Inner, payload: String) {
        if let Some(handle) = inner.render.take() {
            handle.abort();
        }
        inner.generation += 1;
        let generation = inner.generation;
        let (abort, registration) = AbortHandle::new_pair();
        inner.render = Some(abort);
        self.status.send_modify(|status| {
            status.generating = true;
        });

        let shared = self.clone();
        let client = Arc::clone(&self.client);
        let request = async move { client.post_bytes(PREVIEW_ENDPOINT, Some(payload)).await };
        tokio::spawn(async move {
            match Abortable::new(request, registration).await {
                // Superseded: the outcome is discarded unconditionally.
                Err(Aborted) => {}
                Ok(Ok(bytes)) => {
                    let mut inner = shared.lock();
                    if inner.generation != generation {
                        return;
                    }
                    inner.render = None;
                    inner.slot.install(PdfFrame::new(bytes));
                    let revision = inner.slot.installed();
                    drop(inner);
                    shared.status.send_modify(|status| {
                        status.revision = revision;
                        status.generating = false;
                        status.error = None;
                    });
                }
                Ok(Err(error)) if error.is_cancelled() => {}
                Ok(Err(error)) => {
                    let mut inner = shared.lock();
                    if inner.generation != generation {
                        return;
                    }
                    inner.render = None;
                    drop(inner);
                    // The last good frame stays up; stale beats blank.
                    tracing::warn!("preview render failed: {}", error);
                    shared.status.send_modify(|status| {
                        status.generating = false;
                        status.error = Some(error.to_string());
                    });
                }
            }
        });
    }
}

/// Debounced, cancellable render pipeline for one document instance
pub struct PreviewSynchronizer {
    shared: Shared,
    debounce: Duration,
}

impl PreviewSynchronizer {
    pub fn new(client: Arc<ApiClient>, debounce: Duration) -> Self {
        let (status, _) = watch::channel(PreviewStatus::default());
        Self {
            shared: Shared {
                client,
                inner: Arc::new(Mutex::new(Inner::new())),
                status: Arc::new(status),
            },
            debounce,
        }
    }

    /// Create a synchronizer using the configured debounce window
    pub fn with_config(client: Arc<ApiClient>, config: &AppConfig) -> Self {
        Self::new(client, config.preview_debounce)
    }

    /// Read-only subscription to pipeline status changes
    pub fn subscribe(&self) -> watch::Receiver<PreviewStatus> {
        self.shared.status.subscribe()
    }

    /// Snapshot of the current status
    pub fn status(&self) -> PreviewStatus {
        self.shared.status.borrow().clone()
    }

    /// Read snapshot of the current frame's bytes, if one is displayed
    pub fn pdf(&self) -> Option<Arc<Vec<u8>>> {
        self.shared.lock().slot.payload()
    }

    /// Feed the latest document state into the pipeline.
    ///
    /// Must be called from within a tokio runtime. Identical states are
    /// no-ops; the first meaningful state renders immediately; every later
    /// change is debounced.
    pub fn update(&self, data: &ResumeData, lang: &str) {
        let payload = match serde_json::to_string(&RenderPayload { data, lang }) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::error!("failed to serialize preview payload: {}", error);
                return;
            }
        };

        let mut inner = self.shared.lock();
        if inner.fingerprint.as_deref() == Some(payload.as_str()) {
            return;
        }
        inner.fingerprint = Some(payload.clone());

        if let Some(timer) = inner.debounce.take() {
            timer.abort();
        }

        if !inner.primed {
            if !data.has_content() {
                // Still empty: wait for real content before the first render.
                return;
            }
            inner.primed = true;
            self.shared.start_render(&mut inner, payload);
            return;
        }

        let shared = self.shared.clone();
        let delay = self.debounce;
        inner.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = shared.lock();
            // Only the timer for the latest state may fire a render.
            if inner.fingerprint.as_deref() == Some(payload.as_str()) {
                shared.start_render(&mut inner, payload);
            }
        }));
    }

    /// Manual refresh: re-render the current document immediately.
    pub fn refresh(&self) {
        let mut inner = self.shared.lock();
        let Some(payload) = inner.fingerprint.clone() else {
            return;
        };
        self.shared.start_render(&mut inner, payload);
    }
}

impl Drop for PreviewSynchronizer {
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        if let Some(timer) = inner.debounce.take() {
            timer.abort();
        }
        if let Some(render) = inner.render.take() {
            render.abort();
        }
        // A render already past its last await still may not install.
        inner.generation += 1;
        inner.slot.clear();
    }
}

impl std::fmt::Debug for PreviewSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSynchronizer")
            .field("debounce", &self.debounce)
            .field("status", &*self.shared.status.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_payload_carries_language() {
        let mut data = ResumeData::empty();
        data.personal.name = "Ada".to_string();
        let json = serde_json::to_string(&RenderPayload {
            data: &data,
            lang: "fr",
        })
        .expect("serializable");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["lang"], "fr");
        assert_eq!(value["personal"]["name"], "Ada");
    }

    #[test]
    fn test_default_status_is_idle() {
        let status = PreviewStatus::default();
        assert_eq!(status.revision, 0);
        assert!(!status.generating);
        assert!(status.error.is_none());
    }
}
