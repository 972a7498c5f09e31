// ABOUTME: Slide index tracking state machine for the preview surface
// ABOUTME: Reconciles scroll position, explicit selection, and keyboard paging across modes

use log::debug;

/// How the preview presents the deck.
///
/// In `List` every slide is rendered in a scrollable column and the active
/// index is derived from viewport geometry. In `Presenter` exactly one
/// slide is visible and the index is authoritative state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewMode {
    List,
    Presenter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Rendered position of one slide inside the scroll container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideGeometry {
    pub top: f64,
    pub height: f64,
}

impl SlideGeometry {
    fn center(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Current scroll state of the host viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub height: f64,
}

impl Viewport {
    fn center(&self) -> f64 {
        self.scroll_top + self.height / 2.0
    }
}

/// Request from the tracker to the rendering layer: re-center the list view
/// on the given slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollCommand {
    pub index: usize,
}

/// Owns the authoritative "current slide index" and the List/Presenter
/// state machine.
///
/// Lives for the preview session; a project switch resets it wholesale.
#[derive(Debug)]
pub struct SlideTracker {
    mode: PreviewMode,
    active: usize,
    slide_count: usize,
}

impl Default for SlideTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideTracker {
    pub fn new() -> Self {
        Self {
            mode: PreviewMode::List,
            active: 0,
            slide_count: 0,
        }
    }

    pub fn mode(&self) -> PreviewMode {
        self.mode
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    /// Table-of-contents and mode dock are hidden entirely (not merely
    /// empty) when the deck has no slides.
    pub fn chrome_visible(&self) -> bool {
        self.slide_count > 0
    }

    fn max_index(&self) -> usize {
        self.slide_count.saturating_sub(1)
    }

    /// Unconditional reset on project switch: List mode, index 0, no deck.
    pub fn reset(&mut self) {
        self.mode = PreviewMode::List;
        self.active = 0;
        self.slide_count = 0;
    }

    /// Record the rendered slide count, clamping the index whenever the
    /// deck shrinks below it. The index is never left out of range.
    pub fn set_slide_count(&mut self, slide_count: usize) {
        self.slide_count = slide_count;
        let max = self.max_index();
        if self.active > max {
            debug!("Clamping active index {} -> {}", self.active, max);
            self.active = max;
        }
    }

    /// Derive the active index from viewport geometry: nearest slide center
    /// to viewport center, ties broken by document order. Only meaningful
    /// in List mode; Presenter ignores scroll entirely.
    pub fn sync_viewport(&mut self, viewport: Viewport, slides: &[SlideGeometry]) {
        if self.mode != PreviewMode::List || slides.is_empty() {
            return;
        }

        let target = viewport.center();
        let mut best_index = 0;
        let mut best_distance = f64::INFINITY;
        for (index, slide) in slides.iter().enumerate() {
            let distance = (slide.center() - target).abs();
            // Strict comparison keeps the first slide on ties.
            if distance < best_distance {
                best_distance = distance;
                best_index = index;
            }
        }

        self.active = best_index.min(self.max_index());
    }

    /// List -> Presenter, capturing the viewport-derived index as the
    /// authoritative one. No-op if already presenting.
    pub fn enter_presenter(&mut self) {
        if self.mode == PreviewMode::List {
            debug!("Entering presenter mode at slide {}", self.active);
            self.mode = PreviewMode::Presenter;
        }
    }

    /// Presenter -> List. Returns the scroll command that re-centers the
    /// list on the slide that was active while presenting.
    pub fn exit_presenter(&mut self) -> Option<ScrollCommand> {
        if self.mode != PreviewMode::Presenter {
            return None;
        }
        debug!("Exiting presenter mode at slide {}", self.active);
        self.mode = PreviewMode::List;
        Some(ScrollCommand { index: self.active })
    }

    pub fn toggle_mode(&mut self) -> Option<ScrollCommand> {
        match self.mode {
            PreviewMode::List => {
                self.enter_presenter();
                None
            }
            PreviewMode::Presenter => self.exit_presenter(),
        }
    }

    /// Explicit selection (table-of-contents click or slide click), clamped
    /// to the deck. In List mode the list must scroll to the selection.
    pub fn select(&mut self, index: usize) -> Option<ScrollCommand> {
        if self.slide_count == 0 {
            return None;
        }
        self.active = index.min(self.max_index());
        match self.mode {
            PreviewMode::List => Some(ScrollCommand { index: self.active }),
            PreviewMode::Presenter => None,
        }
    }

    /// Directional keyboard paging, clamped to `[0, max]` with no
    /// wraparound.
    pub fn navigate(&mut self, direction: Direction) -> Option<ScrollCommand> {
        if self.slide_count == 0 {
            return None;
        }
        let next = match direction {
            Direction::Next => (self.active + 1).min(self.max_index()),
            Direction::Previous => self.active.saturating_sub(1),
        };
        if next == self.active {
            return None;
        }
        self.active = next;
        match self.mode {
            PreviewMode::List => Some(ScrollCommand { index: self.active }),
            PreviewMode::Presenter => None,
        }
    }
}
