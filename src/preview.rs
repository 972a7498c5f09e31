// ABOUTME: Preview surface controller orchestrating compiler, resolver, and tracker
// ABOUTME: Owns render state, staleness-checked compile results, and frame-coalesced viewport sync

use log::{debug, info};
use std::sync::Arc;

use crate::assets::AssetCache;
use crate::compiler::{self, CompiledDeck, SlideOutlineEntry};
use crate::project::ProjectHandle;
use crate::sync::{Direction, PreviewMode, ScrollCommand, SlideGeometry, SlideTracker, Viewport};

const MIN_ZOOM: f64 = 0.25;
const MAX_ZOOM: f64 = 4.0;

/// What the preview surface currently shows.
#[derive(Debug, Clone)]
pub enum RenderState {
    /// No document submitted yet.
    Idle,
    /// Whitespace-only document; "nothing to show", not an error.
    Empty,
    /// Compile failed; message is surfaced verbatim in place of the deck.
    Error(String),
    Ready(CompiledDeck),
}

/// Outcome of compiling one source snapshot, before it is applied.
#[derive(Debug, Clone)]
pub enum CompileResult {
    Empty,
    Failed(String),
    Ready(CompiledDeck),
}

/// Identifies the document version a compile was issued against. A result
/// whose ticket no longer matches the controller's version is stale and is
/// dropped on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileTicket {
    version: u64,
}

/// Orchestrates the preview pipeline and exposes slide count, outline, and
/// active index as observable state to the shell UI.
pub struct PreviewController {
    cache: Arc<AssetCache>,
    project: Option<ProjectHandle>,
    tracker: SlideTracker,
    state: RenderState,
    outline: Vec<SlideOutlineEntry>,
    version: u64,
    zoom: f64,
    pending_viewport: Option<(Viewport, Vec<SlideGeometry>)>,
}

impl PreviewController {
    pub fn new(cache: Arc<AssetCache>) -> Self {
        Self {
            cache,
            project: None,
            tracker: SlideTracker::new(),
            state: RenderState::Idle,
            outline: Vec::new(),
            version: 0,
            zoom: 1.0,
            pending_viewport: None,
        }
    }

    /// Switch the preview to a new project. Tears down the compiled deck
    /// and outline, resets the tracker to (List, 0), and invalidates every
    /// in-flight compile. Cached assets survive, keyed by project path.
    pub fn open_project(&mut self, project: ProjectHandle) {
        info!("Opening project {:?}", project.path);
        self.version += 1;
        self.project = Some(project);
        self.tracker.reset();
        self.outline.clear();
        self.state = RenderState::Idle;
        self.pending_viewport = None;
    }

    pub fn project(&self) -> Option<&ProjectHandle> {
        self.project.as_ref()
    }

    /// Announce that the source document changed. Any compile issued before
    /// this point becomes stale.
    pub fn begin_update(&mut self) -> CompileTicket {
        self.version += 1;
        CompileTicket {
            version: self.version,
        }
    }

    /// Compile a source snapshot against the current project. Does not
    /// mutate the controller; the result is applied separately so the
    /// staleness check happens at apply time.
    pub fn compile_source(&self, source: &str) -> CompileResult {
        let (_, body) = compiler::split_frontmatter(source);
        if body.trim().is_empty() {
            return CompileResult::Empty;
        }

        let outcome = match &self.project {
            Some(project) => {
                let cache = Arc::clone(&self.cache);
                let project = project.clone();
                compiler::compile(&body, &move |raw| cache.resolve(&project, raw))
            }
            None => compiler::compile(&body, &|raw| raw.to_string()),
        };

        match outcome {
            Ok(deck) => CompileResult::Ready(deck),
            Err(e) => CompileResult::Failed(e.to_string()),
        }
    }

    /// Apply a compile result. Returns false when the ticket is stale, in
    /// which case the result is discarded silently: rapid project switches
    /// and re-edits make this an expected, non-error path.
    pub fn apply_compile(&mut self, ticket: CompileTicket, result: CompileResult) -> bool {
        if ticket.version != self.version {
            debug!(
                "Discarding stale compile result (ticket v{}, current v{})",
                ticket.version, self.version
            );
            return false;
        }

        match result {
            CompileResult::Empty => {
                self.state = RenderState::Empty;
                self.outline.clear();
                self.tracker.set_slide_count(0);
            }
            CompileResult::Failed(message) => {
                // The previous deck never lingers behind an error banner.
                self.state = RenderState::Error(message);
                self.outline.clear();
                self.tracker.set_slide_count(0);
            }
            CompileResult::Ready(deck) => {
                self.outline = deck.outline();
                self.tracker.set_slide_count(deck.slide_count());
                self.state = RenderState::Ready(deck);
            }
        }
        true
    }

    /// Synchronous convenience path: version bump, compile, apply.
    pub fn update_source(&mut self, source: &str) -> &RenderState {
        let ticket = self.begin_update();
        let result = self.compile_source(source);
        self.apply_compile(ticket, result);
        &self.state
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn outline(&self) -> &[SlideOutlineEntry] {
        &self.outline
    }

    pub fn active_index(&self) -> usize {
        self.tracker.active_index()
    }

    pub fn mode(&self) -> PreviewMode {
        self.tracker.mode()
    }

    pub fn slide_count(&self) -> usize {
        self.tracker.slide_count()
    }

    pub fn chrome_visible(&self) -> bool {
        self.tracker.chrome_visible()
    }

    /// Queue viewport geometry for the next frame. Bursts of scroll events
    /// coalesce; only the last geometry before the frame fires is applied.
    pub fn request_viewport_sync(&mut self, viewport: Viewport, slides: Vec<SlideGeometry>) {
        self.pending_viewport = Some((viewport, slides));
    }

    /// Animation-frame tick: at most one index recomputation per frame.
    /// Returns true if a recomputation ran.
    pub fn on_frame(&mut self) -> bool {
        match self.pending_viewport.take() {
            Some((viewport, slides)) => {
                self.tracker.sync_viewport(viewport, &slides);
                true
            }
            None => false,
        }
    }

    pub fn select_slide(&mut self, index: usize) -> Option<ScrollCommand> {
        self.tracker.select(index)
    }

    pub fn toggle_mode(&mut self) -> Option<ScrollCommand> {
        self.tracker.toggle_mode()
    }

    pub fn navigate(&mut self, direction: Direction) -> Option<ScrollCommand> {
        self.tracker.navigate(direction)
    }

    /// Display multiplier only. Zoom is applied after slide geometry is
    /// computed, so changing it never triggers an index recomputation.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }
}
