/**
 * Resume Store
 *
 * CRUD over the caller's named, server-stored resumes, gated by the session
 * state. Quota failures on save are routed to a dedicated limit hook so the
 * UI can prompt an account upgrade instead of showing a raw error.
 */

use crate::client::ApiClient;
use crate::session::SessionState;
use crate::shared::error::ApiError;
use crate::shared::types::{ResumeData, SavedResume, SavedResumeList};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

type Hook = Box<dyn Fn() + Send + Sync>;

/// Outcome of a save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// First save: a new record was created and adopted as current
    Created(i64),
    /// The existing current record was updated
    Updated(i64),
    /// The account's resume quota is exhausted; the limit hook has fired
    /// and the generic error path was not taken
    LimitReached,
}

#[derive(Serialize)]
struct CreatePayload<'a> {
    name: &'a str,
    json_content: Option<&'a ResumeData>,
}

#[derive(Serialize)]
struct UpdatePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    json_content: Option<&'a ResumeData>,
}

/// Orchestrates the saved-resume collection for one editing surface
pub struct ResumeStore {
    client: Arc<ApiClient>,
    session: watch::Receiver<SessionState>,
    cached: Vec<SavedResume>,
    current: Option<i64>,
    on_limit_reached: Option<Hook>,
    on_editor_reset: Option<Hook>,
}

impl ResumeStore {
    pub fn new(client: Arc<ApiClient>, session: watch::Receiver<SessionState>) -> Self {
        Self {
            client,
            session,
            cached: Vec::new(),
            current: None,
            on_limit_reached: None,
            on_editor_reset: None,
        }
    }

    /// Register the quota-limit hook, replacing any previous one
    pub fn set_on_limit_reached(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.on_limit_reached = Some(Box::new(hook));
    }

    /// Register the editor-reset hook, replacing any previous one.
    ///
    /// Fired when the session boundary or a delete invalidates the open
    /// document; the editing surface should reset to a fresh empty one.
    pub fn set_on_editor_reset(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.on_editor_reset = Some(Box::new(hook));
    }

    /// Identifier of the record the editor is bound to, if any
    pub fn current_id(&self) -> Option<i64> {
        self.current
    }

    /// Last fetched list; authoritative only right after [`list`](Self::list)
    pub fn cached(&self) -> &[SavedResume] {
        &self.cached
    }

    /// Begin a fresh unsaved document; the next save creates a new record.
    pub fn start_new(&mut self) {
        self.current = None;
    }

    /// Fetch the caller's saved resumes.
    ///
    /// Without an authenticated session this short-circuits: no network
    /// call, the cache and current id are cleared, the editor-reset hook
    /// fires, and the result is empty.
    pub async fn list(&mut self) -> Result<&[SavedResume], ApiError> {
        if !self.session.borrow().is_authenticated() {
            self.cached.clear();
            self.current = None;
            self.fire_editor_reset();
            return Ok(&self.cached);
        }
        let response: SavedResumeList = self.client.get("/resumes").await?;
        self.cached = response.resumes;
        Ok(&self.cached)
    }

    /// Save the document under `name`.
    ///
    /// The first save creates a record and adopts the server-assigned id;
    /// every later save updates that same record. An HTTP 429 becomes
    /// [`SaveOutcome::LimitReached`] and fires the limit hook instead of
    /// erroring.
    pub async fn save(&mut self, name: &str, data: &ResumeData) -> Result<SaveOutcome, ApiError> {
        let was_new = self.current.is_none();
        let result = match self.current {
            None => {
                self.client
                    .post::<SavedResume, _>(
                        "/resumes",
                        &CreatePayload {
                            name,
                            json_content: Some(data),
                        },
                    )
                    .await
            }
            Some(id) => {
                self.client
                    .put::<SavedResume, _>(
                        &format!("/resumes/{}", id),
                        &UpdatePayload {
                            name: Some(name),
                            json_content: Some(data),
                        },
                    )
                    .await
            }
        };
        match result {
            Ok(saved) => {
                let outcome = if was_new {
                    SaveOutcome::Created(saved.id)
                } else {
                    SaveOutcome::Updated(saved.id)
                };
                self.current = Some(saved.id);
                self.remember(saved);
                Ok(outcome)
            }
            Err(ApiError::Http { status: 429, .. }) => {
                tracing::debug!("resume quota reached, routing to limit hook");
                self.fire_limit_reached();
                Ok(SaveOutcome::LimitReached)
            }
            Err(error) => Err(error),
        }
    }

    /// Delete a record. Deleting the current one resets the editor.
    pub async fn delete(&mut self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&format!("/resumes/{}", id)).await?;
        self.cached.retain(|resume| resume.id != id);
        if self.current == Some(id) {
            self.current = None;
            self.fire_editor_reset();
        }
        Ok(())
    }

    /// Rename a record without touching its content.
    pub async fn rename(&mut self, id: i64, new_name: &str) -> Result<SavedResume, ApiError> {
        let saved: SavedResume = self
            .client
            .put(
                &format!("/resumes/{}", id),
                &UpdatePayload {
                    name: Some(new_name),
                    json_content: None,
                },
            )
            .await?;
        self.remember(saved.clone());
        Ok(saved)
    }

    /// Fetch one record and make it the current document.
    pub async fn load(&mut self, id: i64) -> Result<SavedResume, ApiError> {
        let saved: SavedResume = self.client.get(&format!("/resumes/{}", id)).await?;
        self.current = Some(saved.id);
        self.remember(saved.clone());
        Ok(saved)
    }

    /// Render a saved resume to PDF for download.
    pub async fn export_pdf(
        &self,
        id: i64,
        template_id: &str,
        lang: &str,
    ) -> Result<Bytes, ApiError> {
        let path = format!(
            "/resumes/{}/generate?template_id={}&lang={}",
            id, template_id, lang
        );
        self.client.post_bytes(&path, None).await
    }

    /// Fetch the starter document model.
    pub async fn default_document(&self) -> Result<ResumeData, ApiError> {
        self.client.get("/default-data").await
    }

    /// Optimistically refresh the cached list after a successful mutation.
    fn remember(&mut self, saved: SavedResume) {
        match self.cached.iter_mut().find(|resume| resume.id == saved.id) {
            Some(entry) => *entry = saved,
            None => self.cached.push(saved),
        }
    }

    fn fire_limit_reached(&self) {
        if let Some(hook) = &self.on_limit_reached {
            hook();
        }
    }

    fn fire_editor_reset(&self) {
        if let Some(hook) = &self.on_editor_reset {
            hook();
        }
    }
}

impl std::fmt::Debug for ResumeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeStore")
            .field("current", &self.current)
            .field("cached", &self.cached.len())
            .finish_non_exhaustive()
    }
}
