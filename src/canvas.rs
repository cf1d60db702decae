//! The virtual canvas adapter.
//!
//! `VirtualCanvas` impersonates a DOM canvas element well enough that a
//! renderer library written against the browser API can target it headless:
//! attribute get/set with `width`/`height` routing, event listeners, lazy
//! once-only context binding, and serialization that reconciles GPU output
//! into the raster surface before encoding.
//!
//! Context binding is modeled as an explicit tagged state rather than a set
//! of nullable handles: a canvas is unbound, bound to a 2D context, or bound
//! to a GPU context (with a backing 2D context for pixel storage). The first
//! `get_context` call fixes the kind for the object's lifetime; requesting a
//! different kind afterwards returns `None`, matching DOM behavior.

use crate::attrs::AttrValue;
use crate::blit;
use crate::error::Result;
use crate::events::{Event, EventRegistry, EventTarget, Listener};
use crate::gpu::{ContextAttributes, GpuContext};
use crate::raster::{Context2d, EncodeFormat, RasterSurface};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CANVAS_ID: AtomicU64 = AtomicU64::new(1);

/// Context kinds a canvas can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// Plain 2D raster context.
    TwoD,
    /// WebGL-style GPU context.
    WebGl,
    /// WebGL2-style GPU context (same provider, distinct kind for
    /// conflict checks).
    WebGl2,
}

impl ContextKind {
    /// Whether this kind is backed by the GPU provider.
    pub fn is_gpu(self) -> bool {
        matches!(self, Self::WebGl | Self::WebGl2)
    }
}

impl FromStr for ContextKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "2d" => Ok(Self::TwoD),
            "webgl" => Ok(Self::WebGl),
            "webgl2" => Ok(Self::WebGl2),
            other => Err(format!("unknown context type: {other}")),
        }
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TwoD => "2d",
            Self::WebGl => "webgl",
            Self::WebGl2 => "webgl2",
        };
        write!(f, "{s}")
    }
}

/// The context handed back by `get_context`.
#[derive(Clone)]
pub enum RenderingContext {
    /// 2D raster context.
    D2(Context2d),
    /// GPU context, shared with the canvas.
    Gl(Rc<RefCell<GpuContext>>),
}

impl RenderingContext {
    /// The 2D context, if that is what was bound.
    pub fn as_2d(&self) -> Option<&Context2d> {
        match self {
            Self::D2(ctx) => Some(ctx),
            Self::Gl(_) => None,
        }
    }

    /// The GPU context, if that is what was bound.
    pub fn as_gl(&self) -> Option<&Rc<RefCell<GpuContext>>> {
        match self {
            Self::D2(_) => None,
            Self::Gl(gpu) => Some(gpu),
        }
    }
}

/// Which context, if any, the canvas is bound to.
///
/// The backing 2D context exists whenever any context does; the GPU handle
/// exists exactly when the bound kind is a GPU kind. All context-dependent
/// operations switch on this tag.
enum ContextState {
    Unbound,
    Bound2d(Context2d),
    BoundGpu {
        kind: ContextKind,
        gpu: Rc<RefCell<GpuContext>>,
        raster: Context2d,
    },
}

/// A headless, DOM-compatible canvas.
pub struct VirtualCanvas {
    id: u64,
    surface: Rc<RefCell<RasterSurface>>,
    state: ContextState,
    attributes: HashMap<String, AttrValue>,
    events: EventRegistry,
    style: HashMap<String, String>,
}

impl VirtualCanvas {
    /// Construct a canvas with the given logical size, no context bound.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: NEXT_CANVAS_ID.fetch_add(1, Ordering::Relaxed),
            surface: Rc::new(RefCell::new(RasterSurface::new(width, height))),
            state: ContextState::Unbound,
            attributes: HashMap::new(),
            events: EventRegistry::new(),
            style: HashMap::new(),
        }
    }

    /// Unique id of this canvas, stamped onto dispatched events.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Logical width in pixels.
    pub fn width(&self) -> u32 {
        self.surface.borrow().width()
    }

    /// Logical height in pixels.
    pub fn height(&self) -> u32 {
        self.surface.borrow().height()
    }

    /// The kind the canvas is bound to, if a context has been requested.
    pub fn context_kind(&self) -> Option<ContextKind> {
        match &self.state {
            ContextState::Unbound => None,
            ContextState::Bound2d(_) => Some(ContextKind::TwoD),
            ContextState::BoundGpu { kind, .. } => Some(*kind),
        }
    }

    /// Set the logical width.
    ///
    /// With a GPU context bound, the drawing buffer is resized first so the
    /// two sizes never observably disagree. Like a DOM canvas, assigning a
    /// dimension resets the raster content.
    pub fn set_width(&mut self, width: u32) {
        let height = self.height();
        if let ContextState::BoundGpu { gpu, .. } = &self.state {
            gpu.borrow_mut().resize_drawing_buffer(width, height);
        }
        self.surface.borrow_mut().resize(width, height);
    }

    /// Set the logical height. See [`VirtualCanvas::set_width`].
    pub fn set_height(&mut self, height: u32) {
        let width = self.width();
        if let ContextState::BoundGpu { gpu, .. } = &self.state {
            gpu.borrow_mut().resize_drawing_buffer(width, height);
        }
        self.surface.borrow_mut().resize(width, height);
    }

    /// Request a rendering context with default attributes.
    ///
    /// Returns `Ok(None)` if a different kind is already bound - callers
    /// must check, exactly as with DOM `getContext`.
    pub fn get_context(&mut self, kind: ContextKind) -> Result<Option<RenderingContext>> {
        self.get_context_with(kind, ContextAttributes::default())
    }

    /// Request a rendering context.
    ///
    /// The first successful call fixes the context kind for this canvas's
    /// lifetime. Repeated requests for the same kind return the same shared
    /// context; requests for a different kind return `Ok(None)`. `attrs`
    /// only applies to the first GPU request.
    pub fn get_context_with(
        &mut self,
        kind: ContextKind,
        attrs: ContextAttributes,
    ) -> Result<Option<RenderingContext>> {
        match &self.state {
            ContextState::Bound2d(ctx) => {
                if kind == ContextKind::TwoD {
                    return Ok(Some(RenderingContext::D2(ctx.clone())));
                }
                return Ok(None);
            }
            ContextState::BoundGpu {
                kind: bound, gpu, ..
            } => {
                if kind == *bound {
                    return Ok(Some(RenderingContext::Gl(Rc::clone(gpu))));
                }
                return Ok(None);
            }
            ContextState::Unbound => {}
        }

        log::debug!("canvas {}: binding {kind} context", self.id);
        if kind.is_gpu() {
            // The backing raster context comes first: it holds the pixels
            // every serialization path encodes from.
            let raster = Context2d::new(Rc::clone(&self.surface));
            let gpu = GpuContext::new(self.width(), self.height(), attrs)?;
            let gpu = Rc::new(RefCell::new(gpu));
            self.state = ContextState::BoundGpu {
                kind,
                gpu: Rc::clone(&gpu),
                raster,
            };
            Ok(Some(RenderingContext::Gl(gpu)))
        } else {
            let ctx = Context2d::new(Rc::clone(&self.surface));
            self.state = ContextState::Bound2d(ctx.clone());
            Ok(Some(RenderingContext::D2(ctx)))
        }
    }

    /// Reconcile GPU output into the raster surface, if a GPU context is
    /// bound. No-op otherwise.
    fn reconcile(&self) -> Result<()> {
        if let ContextState::BoundGpu { gpu, raster, .. } = &self.state {
            blit::reconcile(&gpu.borrow(), raster)?;
        }
        Ok(())
    }

    /// Encode the canvas contents.
    ///
    /// If a GPU context is bound, its drawing buffer is reconciled into the
    /// raster surface first. Reconciliation happens only here - call a
    /// serialization method after every render pass whose output you want.
    pub fn to_buffer(&mut self, format: EncodeFormat) -> Result<Vec<u8>> {
        self.reconcile()?;
        self.surface.borrow().encode(format)
    }

    /// Encode as PNG.
    pub fn to_png(&mut self) -> Result<Vec<u8>> {
        self.to_buffer(EncodeFormat::Png)
    }

    /// Encode as JPEG at the given quality (alpha is dropped).
    pub fn to_jpeg(&mut self, quality: u8) -> Result<Vec<u8>> {
        self.to_buffer(EncodeFormat::Jpeg { quality })
    }

    /// Encode as a `data:` URL.
    pub fn to_data_url(&mut self, format: EncodeFormat) -> Result<String> {
        let bytes = self.to_buffer(format)?;
        Ok(format!(
            "data:{};base64,{}",
            format.mime_type(),
            STANDARD.encode(bytes)
        ))
    }

    /// Set a DOM attribute.
    ///
    /// `width`/`height` are routed through the real size accessors (and
    /// still stored), so `set_attribute("width", 800)` actually resizes the
    /// surface like assigning the DOM attribute would.
    pub fn set_attribute(&mut self, key: &str, value: impl Into<AttrValue>) {
        let value = value.into();
        self.attributes.insert(key.to_string(), value.clone());

        if key == "width" {
            if let Some(width) = value.as_u32() {
                self.set_width(width);
            }
        }
        if key == "height" {
            if let Some(height) = value.as_u32() {
                self.set_height(height);
            }
        }
    }

    /// Read a DOM attribute. `width`/`height` report the live size, not the
    /// stored value.
    pub fn get_attribute(&self, key: &str) -> Option<AttrValue> {
        match key {
            "width" => Some(AttrValue::from(self.width())),
            "height" => Some(AttrValue::from(self.height())),
            other => self.attributes.get(other).cloned(),
        }
    }

    /// Drop a stored attribute. Removing `width`/`height` does not resize.
    pub fn remove_attribute(&mut self, key: &str) {
        self.attributes.remove(key);
    }

    /// Register a listener for an event type, preserving order.
    pub fn add_event_listener(&mut self, kind: &str, listener: Listener) {
        self.events.add(kind, listener);
    }

    /// Deregister a listener by reference, or all listeners for the type
    /// when `listener` is `None`.
    pub fn remove_event_listener(&mut self, kind: &str, listener: Option<&Listener>) {
        self.events.remove(kind, listener);
    }

    /// Stamp the event's target as this canvas, then synchronously invoke
    /// its listeners in registration order. Returns whether any listener ran.
    pub fn dispatch_event(&self, mut event: Event) -> bool {
        event.target = Some(EventTarget {
            canvas_id: self.id,
            width: self.width(),
            height: self.height(),
        });
        self.events.dispatch(&event) > 0
    }

    /// Inert CSS-style map, passthrough only.
    pub fn style(&self) -> &HashMap<String, String> {
        &self.style
    }

    /// Mutable access to the inert style map.
    pub fn style_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.style
    }
}
