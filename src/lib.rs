// ABOUTME: Library module for the fastslides core engine.
// ABOUTME: Asset resolution, deck compilation, and slide synchronization for deck projects.

// Reexport modules
pub mod assets;
pub mod compiler;
pub mod errors;
pub mod hook;
pub mod paths;
pub mod preview;
pub mod project;
pub mod sync;
pub mod tokens;

// Reexport common types and functions
pub use assets::{AssetCache, AssetReader, FsAssetReader};
pub use compiler::{compile, split_frontmatter, CompiledDeck, SlideOutlineEntry};
pub use errors::{DeckError, Result};
pub use paths::sanitize;
pub use preview::{CompileResult, PreviewController, RenderState};
pub use project::{AppConfig, AppState, ProjectDetail, ProjectHandle, ProjectSummary};
pub use sync::{Direction, PreviewMode, ScrollCommand, SlideGeometry, SlideTracker, Viewport};
pub use tokens::DesignTokens;
