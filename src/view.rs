//! The document view: overlay, draft placement and document actions.
//!
//! SYSTEM CONTEXT
//! ==============
//! A `ViewSession` is driven by one task calling [`ViewSession::next_event`].
//! Two inputs wake it: surface updates from the locator and load outcomes
//! from a spawned fetch task. Every wake recomputes the overlay from the
//! latest geometry and the latest mark list, so nothing is diffed and a
//! repaint with unchanged inputs paints an identical frame.
//!
//! LOAD GENERATIONS
//! ================
//! Each `reload` bumps a generation counter and tags the spawned load with
//! it. Outcomes from superseded generations, and anything that arrives after
//! `close`, are dropped without touching view state.

#[cfg(test)]
#[path = "view_test.rs"]
mod view_test;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use viewport::draft::{DraftMediator, DraftStyle};
use viewport::geometry::{Point, ViewportGeometry};
use viewport::mark::SignatureMark;
use viewport::overlay::{DisplayMode, OverlayLayer, render_overlay};

use crate::documents::{DocumentSource, resolve_source};
use crate::error::{ClientError, ErrorKind};
use crate::locator::{Located, LocatorHandle};
use crate::net::api::ApiClient;
use crate::net::types::{CreateMarkRequest, Document};
use crate::session::Session;

/// Who is looking at the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// The signed-in owner; document lookup and saves need the bearer token.
    Owner,
    /// Anyone holding the document id; read-only.
    Public,
}

/// A user-facing message produced by a failed background step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
}

impl From<&ClientError> for Notice {
    fn from(err: &ClientError) -> Self {
        Self { kind: err.kind(), code: err.error_code(), message: err.to_string() }
    }
}

/// What [`ViewSession::next_event`] applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// Surface geometry or layer changed and the overlay was repainted.
    Repainted,
    /// Document and marks arrived and the overlay was repainted.
    Loaded,
    /// A load failed. View state is unchanged.
    Notice(Notice),
}

/// Everything one load fetches.
#[derive(Debug, Clone)]
struct Loaded {
    document: Document,
    source: DocumentSource,
    marks: Vec<SignatureMark>,
}

#[derive(Debug)]
struct LoadOutcome {
    generation: u64,
    result: Result<Loaded, ClientError>,
}

enum Wake {
    Surface,
    SurfaceGone,
    Load(LoadOutcome),
}

pub struct ViewSession {
    api: ApiClient,
    session: Session,
    document_id: String,
    mode: ViewMode,

    locator: LocatorHandle,
    surface: watch::Receiver<Option<Located>>,
    surface_live: bool,
    layer: Option<OverlayLayer>,
    geometry: Option<ViewportGeometry>,

    document: Option<Document>,
    source: Option<DocumentSource>,
    marks: Vec<SignatureMark>,
    display: DisplayMode,
    draft: DraftMediator,
    last_signature_id: Option<String>,

    generation: u64,
    loads_tx: mpsc::UnboundedSender<LoadOutcome>,
    loads_rx: mpsc::UnboundedReceiver<LoadOutcome>,
    load_task: Option<JoinHandle<()>>,
    closed: bool,
}

impl ViewSession {
    /// Open a view over `document_id` and start the first load.
    ///
    /// # Errors
    ///
    /// Validation error for a blank document id, or an owner view without a
    /// signed-in session.
    pub fn open(
        api: ApiClient,
        session: Session,
        document_id: &str,
        mode: ViewMode,
        locator: LocatorHandle,
    ) -> Result<Self, ClientError> {
        let document_id = document_id.trim();
        if document_id.is_empty() {
            return Err(ClientError::validation("document id is required"));
        }
        if mode == ViewMode::Owner {
            session.bearer()?;
        }
        let (loads_tx, loads_rx) = mpsc::unbounded_channel();
        let surface = locator.subscribe();
        let mut view = Self {
            api,
            session,
            document_id: document_id.to_owned(),
            mode,
            locator,
            surface,
            surface_live: true,
            layer: None,
            geometry: None,
            document: None,
            source: None,
            marks: Vec::new(),
            display: DisplayMode::Plain,
            draft: DraftMediator::new(),
            last_signature_id: None,
            generation: 0,
            loads_tx,
            loads_rx,
            load_task: None,
            closed: false,
        };
        view.apply_surface();
        view.reload()?;
        info!(document_id = %view.document_id, ?mode, "view opened");
        Ok(view)
    }

    // --- state ---

    #[must_use]
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    #[must_use]
    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    #[must_use]
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// The file the viewer should display, once loaded.
    #[must_use]
    pub fn source(&self) -> Option<&DocumentSource> {
        self.source.as_ref()
    }

    #[must_use]
    pub fn marks(&self) -> &[SignatureMark] {
        &self.marks
    }

    #[must_use]
    pub fn geometry(&self) -> Option<&ViewportGeometry> {
        self.geometry.as_ref()
    }

    #[must_use]
    pub fn layer(&self) -> Option<&OverlayLayer> {
        self.layer.as_ref()
    }

    #[must_use]
    pub fn display_mode(&self) -> DisplayMode {
        self.display
    }

    #[must_use]
    pub fn draft(&self) -> &DraftMediator {
        &self.draft
    }

    /// Style edits on the draft being placed.
    pub fn draft_mut(&mut self) -> &mut DraftMediator {
        &mut self.draft
    }

    /// Id of the most recently saved signature, used for invites.
    #[must_use]
    pub fn last_signature_id(&self) -> Option<&str> {
        self.last_signature_id.as_deref()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // --- event loop ---

    /// Start a fresh load of document, source and marks. Any load still in
    /// flight is aborted and its outcome will be ignored.
    ///
    /// # Errors
    ///
    /// [`ClientError::ViewClosed`] after `close`.
    pub fn reload(&mut self) -> Result<(), ClientError> {
        self.ensure_open()?;
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
        self.generation += 1;
        let generation = self.generation;
        let api = self.api.clone();
        let session = self.session.clone();
        let document_id = self.document_id.clone();
        let mode = self.mode;
        let tx = self.loads_tx.clone();
        self.load_task = Some(tokio::spawn(async move {
            let result = load(&api, &session, &document_id, mode).await;
            if tx.send(LoadOutcome { generation, result }).is_err() {
                debug!(generation, "view dropped before load finished");
            }
        }));
        debug!(document_id = %self.document_id, generation, "load started");
        Ok(())
    }

    /// Wait for the next surface update or load outcome and apply it.
    ///
    /// Returns `None` once the view is closed. Stale load outcomes are
    /// skipped without returning.
    pub async fn next_event(&mut self) -> Option<ViewEvent> {
        loop {
            if self.closed {
                return None;
            }
            let wake = tokio::select! {
                changed = self.surface.changed(), if self.surface_live => {
                    if changed.is_ok() { Wake::Surface } else { Wake::SurfaceGone }
                }
                Some(outcome) = self.loads_rx.recv() => Wake::Load(outcome),
            };
            match wake {
                Wake::Surface => {
                    self.apply_surface();
                    return Some(ViewEvent::Repainted);
                }
                Wake::SurfaceGone => {
                    debug!(document_id = %self.document_id, "locator stopped");
                    self.surface_live = false;
                }
                Wake::Load(outcome) => {
                    if let Some(event) = self.apply_load(outcome) {
                        return Some(event);
                    }
                }
            }
        }
    }

    fn apply_surface(&mut self) {
        let located = *self.surface.borrow_and_update();
        match located {
            Some(located) => {
                let spec = located.layer;
                match self.layer.as_mut() {
                    Some(layer) if layer.id() == spec.id => {
                        layer.reshape(spec.width_px, spec.height_px, spec.canvas_origin);
                    }
                    _ => {
                        let mut layer = OverlayLayer::new(spec.id, spec.width_px, spec.height_px);
                        layer.reshape(spec.width_px, spec.height_px, spec.canvas_origin);
                        self.layer = Some(layer);
                    }
                }
                self.geometry = located.geometry;
            }
            None => {
                self.layer = None;
                self.geometry = None;
            }
        }
        self.repaint();
    }

    fn apply_load(&mut self, outcome: LoadOutcome) -> Option<ViewEvent> {
        if self.closed || outcome.generation != self.generation {
            debug!(generation = outcome.generation, current = self.generation, "stale load ignored");
            return None;
        }
        self.load_task = None;
        match outcome.result {
            Ok(loaded) => {
                info!(
                    document_id = %self.document_id,
                    marks = loaded.marks.len(),
                    finalized = loaded.source.is_finalized(),
                    "document loaded"
                );
                self.document = Some(loaded.document);
                self.source = Some(loaded.source);
                self.marks = loaded.marks;
                self.repaint();
                Some(ViewEvent::Loaded)
            }
            Err(e) => {
                warn!(document_id = %self.document_id, error = %e, "load failed");
                Some(ViewEvent::Notice(Notice::from(&e)))
            }
        }
    }

    fn repaint(&mut self) {
        let frame = render_overlay(&self.marks, self.geometry.as_ref(), self.display);
        if let Some(layer) = self.layer.as_mut() {
            layer.paint(frame);
        }
    }

    /// Switch between plain marks and marks with status badges.
    pub fn set_tracking(&mut self, tracking: bool) {
        self.display = if tracking { DisplayMode::Tracking } else { DisplayMode::Plain };
        self.repaint();
    }

    // --- draft ---

    /// Start placing a new signature with the default style for this view.
    ///
    /// # Errors
    ///
    /// [`ClientError::ViewClosed`] after `close`.
    pub fn begin_signature(&mut self) -> Result<(), ClientError> {
        self.ensure_open()?;
        let style = match self.mode {
            ViewMode::Owner => DraftStyle::owner(),
            ViewMode::Public => DraftStyle::guest(),
        };
        self.draft.begin(style);
        Ok(())
    }

    /// Move the draft to a screen-space position. No I/O.
    ///
    /// # Errors
    ///
    /// Validation error when no signature is being placed.
    pub fn drag_to(&mut self, position: Point) -> Result<(), ClientError> {
        self.draft.drag_to(position)?;
        Ok(())
    }

    /// Save the draft at its current PDF-space position, then reload marks.
    ///
    /// Nothing is sent while the canvas geometry is unknown. On failure the
    /// draft stays in place so the save can be retried.
    ///
    /// # Errors
    ///
    /// [`ClientError::ViewportNotReady`] without geometry; validation errors
    /// for public views or an idle draft; network and server errors.
    pub async fn save_signature(&mut self) -> Result<String, ClientError> {
        self.ensure_open()?;
        if self.mode != ViewMode::Owner {
            return Err(ClientError::validation("public views sign through their signing link"));
        }
        let placement = self.draft.placement(self.geometry.as_ref())?;
        let request = CreateMarkRequest::new(&self.document_id, placement);
        let signature_id = self.api.create_mark(&self.session, &request).await?;
        self.draft.finish();
        self.last_signature_id = Some(signature_id.clone());
        self.reload()?;
        Ok(signature_id)
    }

    /// Abandon the draft.
    pub fn cancel_signature(&mut self) {
        self.draft.cancel();
    }

    // --- document actions ---

    /// Flatten all marks into the PDF and return the signed file.
    ///
    /// # Errors
    ///
    /// Validation error for public views; network and server errors.
    pub async fn finalize(&mut self) -> Result<Vec<u8>, ClientError> {
        self.ensure_open()?;
        if self.mode != ViewMode::Owner {
            return Err(ClientError::validation("only the owner can finalize a document"));
        }
        let bytes = self.api.finalize(&self.session, &self.document_id).await?;
        self.reload()?;
        Ok(bytes)
    }

    /// Email a public signing link for the last saved signature.
    ///
    /// # Errors
    ///
    /// Validation error for a blank email or when nothing was saved yet;
    /// network and server errors.
    pub async fn send_invite(&self, email: &str) -> Result<(), ClientError> {
        self.ensure_open()?;
        if email.trim().is_empty() {
            return Err(ClientError::validation("recipient email is required"));
        }
        let signature_id = self
            .last_signature_id
            .as_deref()
            .ok_or_else(|| ClientError::validation("save a signature before sending a link"))?;
        self.api.send_public_link(&self.session, signature_id, email).await
    }

    /// Stop the locator and abort any in-flight load. Later outcomes are
    /// ignored and `next_event` returns `None`.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
        self.locator.stop();
        info!(document_id = %self.document_id, "view closed");
    }

    fn ensure_open(&self) -> Result<(), ClientError> {
        if self.closed {
            return Err(ClientError::ViewClosed);
        }
        Ok(())
    }
}

impl Drop for ViewSession {
    fn drop(&mut self) {
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
    }
}

async fn load(api: &ApiClient, session: &Session, document_id: &str, mode: ViewMode) -> Result<Loaded, ClientError> {
    let document = match mode {
        ViewMode::Owner => api.fetch_document(session, document_id).await?,
        ViewMode::Public => api.fetch_public_document(document_id).await?,
    };
    let source = resolve_source(api, &document).await;
    let marks = api.fetch_marks(session, document_id).await?;
    Ok(Loaded { document, source, marks })
}
