use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use fastslides::{
    AssetCache, Direction, PreviewController, PreviewMode, ProjectHandle, RenderState,
    SlideGeometry, Viewport,
};

const PAGE_MDX: &str = r#"<main className="deck">

<section className="slide">

# Kickoff

<img src="images/logo.png" />

</section>

<section className="slide">

# Roadmap

- Phase one
- Phase two

</section>

<section className="slide">

No heading here, just prose.

</section>

</main>
"#;

fn project_fixture() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::create_dir_all(temp_dir.path().join("images")).expect("Failed to create images dir");
    fs::write(temp_dir.path().join("images/logo.png"), [0x89u8, 0x50, 0x4e, 0x47])
        .expect("Failed to write logo");
    fs::write(temp_dir.path().join("page.mdx"), PAGE_MDX).expect("Failed to write page.mdx");
    temp_dir
}

#[test]
fn test_open_project_end_to_end() {
    let temp_dir = project_fixture();
    let cache = Arc::new(AssetCache::new());
    let mut preview = PreviewController::new(Arc::clone(&cache));

    preview.open_project(ProjectHandle::new(temp_dir.path()));
    let source = fs::read_to_string(temp_dir.path().join("page.mdx")).unwrap();
    preview.update_source(&source);

    // Document without a metadata block compiles to three slides.
    let deck = match preview.state() {
        RenderState::Ready(deck) => deck.clone(),
        other => panic!("expected ready deck, got {:?}", other),
    };
    assert_eq!(deck.slide_count(), 3);

    let outline = preview.outline();
    assert_eq!(outline.len(), 3);
    assert_eq!(outline[0].title, "Kickoff");
    assert_eq!(outline[1].title, "Roadmap");
    assert_eq!(outline[2].title, "Slide 3");

    // Initial interaction state.
    assert_eq!(preview.mode(), PreviewMode::List);
    assert_eq!(preview.active_index(), 0);
    assert!(preview.chrome_visible());

    // The project-relative image was embedded, not left as a raw path.
    assert!(deck.slides[0].html.contains("data:image/png;base64,"));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_scroll_present_navigate_cycle() {
    let temp_dir = project_fixture();
    let mut preview = PreviewController::new(Arc::new(AssetCache::new()));

    preview.open_project(ProjectHandle::new(temp_dir.path()));
    let source = fs::read_to_string(temp_dir.path().join("page.mdx")).unwrap();
    preview.update_source(&source);

    let slides: Vec<SlideGeometry> = (0..3)
        .map(|i| SlideGeometry {
            top: i as f64 * 600.0,
            height: 600.0,
        })
        .collect();

    // Scroll until slide 1 is centered.
    preview.request_viewport_sync(
        Viewport {
            scroll_top: 500.0,
            height: 800.0,
        },
        slides,
    );
    assert!(preview.on_frame());
    assert_eq!(preview.active_index(), 1);

    // Present from there, page forward, and come back.
    preview.toggle_mode();
    assert_eq!(preview.mode(), PreviewMode::Presenter);
    assert_eq!(preview.active_index(), 1);

    preview.navigate(Direction::Next);
    assert_eq!(preview.active_index(), 2);
    preview.navigate(Direction::Next);
    assert_eq!(preview.active_index(), 2, "no wraparound");

    let command = preview.toggle_mode().expect("exit presenter scrolls the list");
    assert_eq!(command.index, 2);
    assert_eq!(preview.mode(), PreviewMode::List);
}

#[test]
fn test_recompile_after_edit_clamps_index() {
    let temp_dir = project_fixture();
    let mut preview = PreviewController::new(Arc::new(AssetCache::new()));

    preview.open_project(ProjectHandle::new(temp_dir.path()));
    let source = fs::read_to_string(temp_dir.path().join("page.mdx")).unwrap();
    preview.update_source(&source);
    preview.select_slide(2);
    assert_eq!(preview.active_index(), 2);

    // Edit the deck down to one slide and recompile.
    let shorter = "<section className=\"slide\">\n\n# Solo\n\n</section>\n";
    preview.update_source(shorter);
    assert_eq!(preview.slide_count(), 1);
    assert_eq!(preview.active_index(), 0);
}
