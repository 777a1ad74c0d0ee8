//! Canvas and scroll-container discovery.
//!
//! SYSTEM CONTEXT
//! ==============
//! The host that renders the PDF (a web view, a native widget, the CLI's
//! virtual page) reports element lifecycle through a [`SurfaceReporter`].
//! The locator folds those reports into a single published value: both
//! elements, the current geometry and the overlay layer that sits on top of
//! the container. Subscribers are woken only when that value changes.
//!
//! LAYER LIFECYCLE
//! ===============
//! One layer per scroll container instance. A resize keeps the layer id and
//! reshapes it; a detach drops it; a container with a new id gets a new
//! layer. Layer ids are never reused within one locator.

#[cfg(test)]
#[path = "locator_test.rs"]
mod locator_test;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use viewport::geometry::{Point, ViewportGeometry};
use viewport::overlay::{LayerId, PointerEvents};

/// Host-assigned identity of a surface element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

/// A lifecycle report from the viewer surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// The page canvas exists with this size. `offset` is its position inside
    /// the scroll container.
    Canvas { id: ElementId, width_px: f64, height_px: f64, offset: Point },
    CanvasDetached,
    /// The scroll container exists with this size.
    Container { id: ElementId, width_px: f64, height_px: f64 },
    ContainerDetached,
}

/// Shape of the overlay layer the renderer paints into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayerSpec {
    pub id: LayerId,
    pub width_px: f64,
    pub height_px: f64,
    pub canvas_origin: Point,
    pub pointer_events: PointerEvents,
}

/// Both surface elements, once they exist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located {
    pub canvas: ElementId,
    pub container: ElementId,
    /// `None` while the canvas has no usable size.
    pub geometry: Option<ViewportGeometry>,
    pub layer: OverlayLayerSpec,
}

#[derive(Debug, Clone, Copy)]
struct CanvasReport {
    id: ElementId,
    width_px: f64,
    height_px: f64,
    offset: Point,
}

#[derive(Debug, Clone, Copy)]
struct ContainerReport {
    id: ElementId,
    width_px: f64,
    height_px: f64,
}

/// Folds surface events into the published [`Located`] value.
#[derive(Debug, Default)]
struct LocatorState {
    canvas: Option<CanvasReport>,
    container: Option<ContainerReport>,
    layer: Option<(ElementId, LayerId)>,
    next_layer: u64,
}

impl LocatorState {
    fn apply(&mut self, event: SurfaceEvent) -> Option<Located> {
        match event {
            SurfaceEvent::Canvas { id, width_px, height_px, offset } => {
                self.canvas = Some(CanvasReport { id, width_px, height_px, offset });
            }
            SurfaceEvent::CanvasDetached => self.canvas = None,
            SurfaceEvent::Container { id, width_px, height_px } => {
                self.container = Some(ContainerReport { id, width_px, height_px });
            }
            SurfaceEvent::ContainerDetached => {
                self.container = None;
                self.layer = None;
            }
        }
        self.located()
    }

    fn located(&mut self) -> Option<Located> {
        let canvas = self.canvas?;
        let container = self.container?;
        let layer_id = match self.layer {
            Some((owner, id)) if owner == container.id => id,
            _ => {
                let id = LayerId(self.next_layer);
                self.next_layer += 1;
                self.layer = Some((container.id, id));
                info!(layer = id.0, container = container.id.0, "overlay layer created");
                id
            }
        };
        let geometry = match ViewportGeometry::new(canvas.width_px, canvas.height_px) {
            Ok(geometry) => Some(geometry),
            Err(e) => {
                debug!(error = %e, canvas = canvas.id.0, "canvas not sized yet");
                None
            }
        };
        Some(Located {
            canvas: canvas.id,
            container: container.id,
            geometry,
            layer: OverlayLayerSpec {
                id: layer_id,
                width_px: container.width_px,
                height_px: container.height_px,
                canvas_origin: canvas.offset,
                pointer_events: PointerEvents::None,
            },
        })
    }
}

/// Cloneable sender the host uses to report surface changes.
#[derive(Debug, Clone)]
pub struct SurfaceReporter {
    tx: mpsc::UnboundedSender<SurfaceEvent>,
}

impl SurfaceReporter {
    /// Returns `false` once the locator has stopped.
    pub fn report(&self, event: SurfaceEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn canvas(&self, id: ElementId, width_px: f64, height_px: f64, offset: Point) -> bool {
        self.report(SurfaceEvent::Canvas { id, width_px, height_px, offset })
    }

    pub fn container(&self, id: ElementId, width_px: f64, height_px: f64) -> bool {
        self.report(SurfaceEvent::Container { id, width_px, height_px })
    }
}

pub struct ViewportLocator;

impl ViewportLocator {
    /// Start the locator task. Must be called inside a tokio runtime.
    ///
    /// The task ends when the handle is stopped or dropped, or when every
    /// clone of the returned reporter is gone.
    #[must_use]
    pub fn spawn() -> (SurfaceReporter, LocatorHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (published_tx, published_rx) = watch::channel(None);
        let task = tokio::spawn(run(rx, published_tx));
        (SurfaceReporter { tx }, LocatorHandle { published: published_rx, task })
    }
}

async fn run(mut events: mpsc::UnboundedReceiver<SurfaceEvent>, published: watch::Sender<Option<Located>>) {
    let mut state = LocatorState::default();
    while let Some(event) = events.recv().await {
        let next = state.apply(event);
        let changed = published.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            debug!(located = next.is_some(), "surface republished");
        }
    }
    debug!("surface reporters gone, locator stopped");
}

/// Owner of a running locator. Dropping it stops the task.
#[derive(Debug)]
pub struct LocatorHandle {
    published: watch::Receiver<Option<Located>>,
    task: JoinHandle<()>,
}

impl LocatorHandle {
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Located>> {
        self.published.clone()
    }

    /// The last published value.
    #[must_use]
    pub fn current(&self) -> Option<Located> {
        *self.published.borrow()
    }

    pub fn stop(&self) {
        self.task.abort();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for LocatorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
