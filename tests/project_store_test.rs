use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;
use tiny_http::Method;

use fastslides::hook;
use fastslides::project;

// Config-store tests share the process environment (FASTSLIDES_HOME), so
// they must not interleave.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const PAGE_MDX: &str = r#"---
project: demo
title: Demo Deck
---

<main className="deck">

<section className="slide">

# Demo

![chart](images/chart.png)

</section>

</main>
"#;

fn write_project(root: &Path, name: &str) -> std::path::PathBuf {
    let project_dir = root.join(name);
    fs::create_dir_all(project_dir.join("images")).expect("Failed to create images dir");
    fs::write(project_dir.join("images/chart.png"), [1u8, 2, 3]).expect("Failed to write asset");
    fs::write(project_dir.join("page.mdx"), PAGE_MDX).expect("Failed to write page.mdx");
    project_dir
}

struct HomeGuard {
    _dir: TempDir,
}

fn scoped_home() -> HomeGuard {
    let dir = TempDir::new().expect("Failed to create temp home");
    std::env::set_var("FASTSLIDES_HOME", dir.path());
    HomeGuard { _dir: dir }
}

#[test]
fn test_open_project_records_recent_and_returns_detail() {
    let _lock = ENV_LOCK.lock().unwrap();
    let _home = scoped_home();
    let workspace = TempDir::new().expect("Failed to create temp dir");
    let project_dir = write_project(workspace.path(), "demo");

    let detail =
        project::open_project(project_dir.to_str().unwrap()).expect("open should succeed");
    assert_eq!(detail.name, "demo");
    assert_eq!(detail.slide_count, 1);
    assert!(detail.page_mdx.contains("# Demo"));

    let config = project::load_config().expect("config should load");
    assert_eq!(config.recent_projects.len(), 1);
    assert!(config.recent_projects[0].ends_with("demo"));
}

#[test]
fn test_open_project_requires_page_mdx() {
    let _lock = ENV_LOCK.lock().unwrap();
    let _home = scoped_home();
    let workspace = TempDir::new().expect("Failed to create temp dir");
    let bare_dir = workspace.path().join("not-a-project");
    fs::create_dir_all(&bare_dir).unwrap();

    let err = project::open_project(bare_dir.to_str().unwrap())
        .expect_err("folder without page.mdx must be rejected");
    assert!(err.to_string().contains("page.mdx"));
}

#[test]
fn test_pinned_projects_sort_first() {
    let _lock = ENV_LOCK.lock().unwrap();
    let _home = scoped_home();
    let workspace = TempDir::new().expect("Failed to create temp dir");
    let alpha = write_project(workspace.path(), "alpha");
    let zulu = write_project(workspace.path(), "zulu");

    project::open_project(alpha.to_str().unwrap()).unwrap();
    project::open_project(zulu.to_str().unwrap()).unwrap();
    let state = project::pin_project(zulu.to_str().unwrap()).expect("pin should succeed");

    assert_eq!(state.projects.len(), 2);
    assert_eq!(state.projects[0].name, "zulu");
    assert!(state.projects[0].pinned);
    assert!(!state.projects[1].pinned);

    let state = project::unpin_project(zulu.to_str().unwrap()).expect("unpin should succeed");
    assert_eq!(state.projects[0].name, "alpha");
}

#[test]
fn test_validate_project_reports_asset_problems() {
    let _lock = ENV_LOCK.lock().unwrap();
    let _home = scoped_home();
    let workspace = TempDir::new().expect("Failed to create temp dir");
    let project_dir = write_project(workspace.path(), "audit");

    let broken = PAGE_MDX.replace("images/chart.png", "images/missing.png")
        + "\n<img src=\"../outside.png\" />\n";
    fs::write(project_dir.join("page.mdx"), broken).unwrap();

    let report = project::validate_project(project_dir.to_str().unwrap())
        .expect("validation should produce a report");
    assert_eq!(report.slide_count, 1);
    assert!(report
        .errors
        .iter()
        .any(|e| e.contains("Missing asset target")));
    assert!(report
        .errors
        .iter()
        .any(|e| e.contains("Invalid traversal asset path")));
}

#[test]
fn test_validate_project_clean_deck_has_no_errors() {
    let _lock = ENV_LOCK.lock().unwrap();
    let _home = scoped_home();
    let workspace = TempDir::new().expect("Failed to create temp dir");
    let project_dir = write_project(workspace.path(), "clean");

    let report = project::validate_project(project_dir.to_str().unwrap())
        .expect("validation should produce a report");
    assert!(report.errors.is_empty(), "unexpected errors: {:?}", report.errors);
    assert_eq!(report.assets_checked, 1);
}

#[test]
fn test_create_project_scaffolds_folders() {
    let _lock = ENV_LOCK.lock().unwrap();
    let _home = scoped_home();
    let workspace = TempDir::new().expect("Failed to create temp dir");

    let detail = project::create_project(
        workspace.path().to_str().unwrap(),
        "fresh-deck",
        Some("Fresh"),
        None,
        None,
    )
    .expect("scaffold should succeed");

    assert_eq!(detail.name, "fresh-deck");
    assert_eq!(detail.slide_count, 3);
    let project_dir = workspace.path().join("fresh-deck");
    for folder in ["images", "media", "data"] {
        assert!(project_dir.join(folder).is_dir(), "missing {}", folder);
    }

    let err = project::create_project(
        workspace.path().to_str().unwrap(),
        "bad name!",
        None,
        None,
        None,
    )
    .expect_err("invalid name must be rejected");
    assert!(err.to_string().contains("Invalid project name"));
}

#[test]
fn test_hook_health_and_routing() {
    let _lock = ENV_LOCK.lock().unwrap();
    let _home = scoped_home();

    let reply = hook::handle_request(&Method::Get, "/health", "");
    assert_eq!(reply.status, 200);
    assert!(reply.body.contains("fastslides-agent-hook"));

    let reply = hook::handle_request(&Method::Get, "/preview-url", "");
    assert_eq!(reply.status, 400);

    let reply = hook::handle_request(&Method::Get, "/preview-url?path=/tmp/deck", "");
    assert_eq!(reply.status, 200);
    assert!(reply.body.contains("deckPath"));

    let reply = hook::handle_request(&Method::Get, "/nope", "");
    assert_eq!(reply.status, 404);
}

#[test]
fn test_hook_open_project_route() {
    let _lock = ENV_LOCK.lock().unwrap();
    let _home = scoped_home();
    let workspace = TempDir::new().expect("Failed to create temp dir");
    let project_dir = write_project(workspace.path(), "hooked");

    let payload = format!(r#"{{"path":"{}"}}"#, project_dir.display());
    let reply = hook::handle_request(&Method::Post, "/open-project", &payload);
    assert_eq!(reply.status, 200, "body: {}", reply.body);
    assert!(reply.body.contains("\"name\":\"hooked\""));

    let reply = hook::handle_request(&Method::Post, "/open-project", "not json");
    assert_eq!(reply.status, 400);

    let payload = r#"{"path":"/definitely/not/here"}"#;
    let reply = hook::handle_request(&Method::Post, "/validate-project", payload);
    assert_eq!(reply.status, 400);
}
