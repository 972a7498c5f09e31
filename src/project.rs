// ABOUTME: Project store for the fastslides shell: config file, project list, open/validate
// ABOUTME: Owns the ~/.fastslides/config.json contract and the page.mdx folder layout

use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::compiler::{self, slide_count_from_source};
use crate::errors::{DeckError, Result};
use crate::paths;

const PROJECT_NAME_PATTERN: &str = r"^[A-Za-z0-9._-]+$";
const DEFAULT_TITLE: &str = "Presentation";
const DEFAULT_SUBTITLE: &str = "Project Overview";
const DEFAULT_DATE_LABEL: &str = "Month YYYY";
const MAX_RECENT_PROJECTS: usize = 50;

// Per-slide density thresholds used by validation.
const MAX_SLIDE_WORDS: usize = 140;
const MAX_SLIDE_BULLETS: usize = 8;
const MAX_PARAGRAPH_WORDS: usize = 55;

/// Absolute path of an opened project folder. Identity key for asset
/// caching; immutable for the duration of a preview session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectHandle {
    pub path: PathBuf,
}

impl ProjectHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Persisted application config (`~/.fastslides/config.json`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub projects_roots: Vec<String>,
    #[serde(default)]
    pub recent_projects: Vec<String>,
    #[serde(default)]
    pub pinned_projects: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProjectSummary {
    pub name: String,
    pub path: String,
    pub root: String,
    pub slide_count: usize,
    pub pinned: bool,
    pub updated_at: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    pub name: String,
    pub path: String,
    pub root: String,
    pub page_mdx: String,
    pub slide_count: usize,
    pub updated_at: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub path: String,
    pub slide_count: usize,
    pub assets_checked: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Resolved state handed to the shell UI and the agent hook.
#[derive(Debug, Clone, Serialize)]
pub struct AppState {
    pub config: AppConfig,
    pub projects: Vec<ProjectSummary>,
}

fn project_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PROJECT_NAME_PATTERN).expect("invalid project name regex"))
}

fn markdown_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"!\[[^\]]*\]\(([^)]+)\)|\[[^\]]*\]\(([^)]+)\)"#)
            .expect("invalid markdown link regex")
    })
}

fn attr_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:src|href|poster)\s*=\s*["']([^"']+)["']"#)
            .expect("invalid attr link regex")
    })
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[A-Za-z0-9][A-Za-z0-9'./-]*"#).expect("invalid word regex"))
}

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?m)^\s*(?:[-*+]\s+|\d+\.\s+)"#).expect("invalid bullet regex"))
}

fn use_client_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*["']use client["']\s*;?\s*$"#).expect("invalid use-client regex")
    })
}

fn import_export_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*(import|export)\s+"#).expect("invalid import/export regex")
    })
}

fn html_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<[^>]+>"#).expect("invalid html tag regex"))
}

fn now_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

fn modified_epoch_seconds(path: &Path) -> u64 {
    fs::metadata(path)
        .ok()
        .and_then(|meta| meta.modified().ok())
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|duration| duration.as_secs())
        .unwrap_or_else(now_epoch_seconds)
}

fn expand_user_path(raw: &str) -> PathBuf {
    if let Some(remainder) = raw.strip_prefix("~/") {
        if let Ok(home) = env::var("HOME") {
            return PathBuf::from(home).join(remainder);
        }
    }
    PathBuf::from(raw)
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Resolve the config folder, creating it if needed. `FASTSLIDES_HOME`
/// overrides the default `~/.fastslides`.
pub fn fastslides_home() -> Result<PathBuf> {
    let root = if let Ok(explicit) = env::var("FASTSLIDES_HOME") {
        expand_user_path(&explicit)
    } else if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".fastslides")
    } else {
        return Err(DeckError::ConfigError(
            "Unable to resolve FASTSLIDES_HOME or HOME".to_string(),
        ));
    };

    fs::create_dir_all(&root)?;
    Ok(root)
}

fn config_file_path() -> Result<PathBuf> {
    Ok(fastslides_home()?.join("config.json"))
}

/// Canonicalize a path string, requiring an existing directory.
pub fn normalize_existing_directory(path_str: &str) -> Result<PathBuf> {
    let expanded = expand_user_path(path_str);
    if !expanded.exists() {
        return Err(DeckError::PathNotFoundError(expanded));
    }
    if !expanded.is_dir() {
        return Err(DeckError::InvalidProjectPath(format!(
            "Not a directory: {}",
            expanded.display()
        )));
    }
    expanded.canonicalize().map_err(DeckError::FileReadError)
}

/// Like `normalize_existing_directory`, and additionally requires a
/// `page.mdx` inside the folder.
pub fn normalize_existing_project_directory(path_str: &str) -> Result<PathBuf> {
    let project_dir = normalize_existing_directory(path_str)?;
    let page_path = project_dir.join("page.mdx");
    if !page_path.is_file() {
        return Err(DeckError::InvalidProjectPath(format!(
            "Project folder must contain page.mdx: {}",
            page_path.display()
        )));
    }
    Ok(project_dir)
}

/// Load the persisted config. A missing file seeds from
/// `FASTSLIDES_PROJECTS_DIR` when set, otherwise yields the default.
pub fn load_config() -> Result<AppConfig> {
    let config_file = config_file_path()?;
    if !config_file.exists() {
        if let Ok(raw) = env::var("FASTSLIDES_PROJECTS_DIR") {
            if let Ok(path) = normalize_existing_directory(&raw) {
                return Ok(AppConfig {
                    projects_roots: vec![path_to_string(&path)],
                    ..AppConfig::default()
                });
            }
        }
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(&config_file)?;
    serde_json::from_str::<AppConfig>(&content).map_err(|e| {
        DeckError::ConfigError(format!(
            "Invalid config JSON in {}: {}",
            config_file.display(),
            e
        ))
    })
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    let config_file = config_file_path()?;
    let json = serde_json::to_string_pretty(config)?;
    fs::write(&config_file, json)?;
    Ok(())
}

fn dedupe_canonical<F>(entries: Vec<String>, normalize: F) -> Vec<String>
where
    F: Fn(&str) -> Result<PathBuf>,
{
    let mut deduped = Vec::<String>::new();
    let mut seen = HashSet::<String>::new();
    for entry in entries {
        if let Ok(canonical) = normalize(&entry) {
            let canonical_str = path_to_string(&canonical);
            if seen.insert(canonical_str.clone()) {
                deduped.push(canonical_str);
            }
        }
    }
    deduped
}

/// Canonicalize and dedupe every path in the config, dropping entries that
/// no longer exist on disk.
pub fn normalized_config(config: AppConfig) -> AppConfig {
    AppConfig {
        projects_roots: dedupe_canonical(config.projects_roots, |p| {
            normalize_existing_directory(p)
        }),
        recent_projects: dedupe_canonical(config.recent_projects, |p| {
            normalize_existing_project_directory(p)
        }),
        pinned_projects: dedupe_canonical(config.pinned_projects, |p| {
            normalize_existing_project_directory(p)
        }),
    }
}

fn project_root_for_path(config: &AppConfig, project_path: &Path) -> Option<String> {
    config
        .projects_roots
        .iter()
        .find(|root| project_path.starts_with(Path::new(root)))
        .cloned()
}

fn project_root_or_parent(config: &AppConfig, project_path: &Path) -> String {
    project_root_for_path(config, project_path).unwrap_or_else(|| {
        project_path
            .parent()
            .map(path_to_string)
            .unwrap_or_default()
    })
}

fn project_summary_for(config: &AppConfig, project_dir: &Path) -> Option<ProjectSummary> {
    let page_path = project_dir.join("page.mdx");
    if !page_path.is_file() {
        return None;
    }

    let page_source = fs::read_to_string(&page_path).ok()?;
    let name = project_dir.file_name()?.to_string_lossy().into_owned();
    let path = path_to_string(project_dir);
    let pinned = config.pinned_projects.iter().any(|p| p == &path);

    Some(ProjectSummary {
        name,
        root: project_root_or_parent(config, project_dir),
        path,
        slide_count: slide_count_from_source(&page_source),
        pinned,
        updated_at: modified_epoch_seconds(&page_path),
    })
}

/// List known projects: pinned first, each group sorted case-insensitively
/// by name, dead paths skipped.
pub fn list_projects(config: &AppConfig) -> Vec<ProjectSummary> {
    let mut seen_paths = HashSet::<String>::new();
    let mut projects = Vec::<ProjectSummary>::new();

    let candidates = config
        .pinned_projects
        .iter()
        .chain(config.recent_projects.iter());
    for project_path in candidates {
        if let Ok(canonical_project) = normalize_existing_project_directory(project_path) {
            let canonical_str = path_to_string(&canonical_project);
            if seen_paths.insert(canonical_str) {
                if let Some(summary) = project_summary_for(config, &canonical_project) {
                    projects.push(summary);
                }
            }
        }
    }

    projects.sort_by(|left, right| {
        right
            .pinned
            .cmp(&left.pinned)
            .then_with(|| left.name.to_lowercase().cmp(&right.name.to_lowercase()))
    });
    projects
}

pub fn read_page_mdx(project_dir: &Path) -> Result<String> {
    let page_path = project_dir.join("page.mdx");
    fs::read_to_string(&page_path).map_err(DeckError::FileReadError)
}

pub fn write_page_mdx(project_dir: &Path, content: &str) -> Result<()> {
    let page_path = project_dir.join("page.mdx");
    fs::write(&page_path, content).map_err(DeckError::FileReadError)
}

fn project_detail_for_path(config: &AppConfig, project_path: &Path) -> Result<ProjectDetail> {
    let canonical_project = normalize_existing_directory(&path_to_string(project_path))?;
    let page_mdx = read_page_mdx(&canonical_project)?;
    let slide_count = slide_count_from_source(&page_mdx);
    let page_path = canonical_project.join("page.mdx");

    let root = project_root_for_path(config, &canonical_project).unwrap_or_default();
    let name = canonical_project
        .file_name()
        .map(|item| item.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string());

    Ok(ProjectDetail {
        name,
        path: path_to_string(&canonical_project),
        root,
        page_mdx,
        slide_count,
        updated_at: modified_epoch_seconds(&page_path),
    })
}

fn remember_recent_project(config: &mut AppConfig, project_path: &Path) {
    let project_path_str = path_to_string(project_path);
    config
        .recent_projects
        .retain(|existing| existing != &project_path_str);
    config.recent_projects.insert(0, project_path_str);
    if config.recent_projects.len() > MAX_RECENT_PROJECTS {
        config.recent_projects.truncate(MAX_RECENT_PROJECTS);
    }
}

/// Build the resolved app state handed to the shell and the agent hook.
pub fn build_state() -> Result<AppState> {
    let config = normalized_config(load_config()?);
    let projects = list_projects(&config);
    Ok(AppState { config, projects })
}

/// Open a project: canonicalize, remember as recent, return its detail.
pub fn open_project(path: &str) -> Result<ProjectDetail> {
    let project_path = normalize_existing_project_directory(path)?;
    let mut config = normalized_config(load_config()?);
    remember_recent_project(&mut config, &project_path);
    save_config(&config)?;
    project_detail_for_path(&config, &project_path)
}

/// Overwrite the project's `page.mdx` and return the refreshed detail.
pub fn save_project(path: &str, page_mdx: &str) -> Result<ProjectDetail> {
    let project_path = normalize_existing_project_directory(path)?;
    write_page_mdx(&project_path, page_mdx)?;
    let mut config = normalized_config(load_config()?);
    remember_recent_project(&mut config, &project_path);
    save_config(&config)?;
    project_detail_for_path(&config, &project_path)
}

pub fn add_projects_root(path: &str) -> Result<AppState> {
    let canonical = normalize_existing_directory(path)?;
    let canonical_str = path_to_string(&canonical);

    let mut config = normalized_config(load_config()?);
    if !config.projects_roots.iter().any(|root| root == &canonical_str) {
        config.projects_roots.push(canonical_str);
    }
    let config = normalized_config(config);
    save_config(&config)?;

    Ok(AppState {
        projects: list_projects(&config),
        config,
    })
}

fn retain_excluding(entries: &mut Vec<String>, path: &str) {
    let expanded = path_to_string(&expand_user_path(path));
    let canonical = normalize_existing_directory(path)
        .ok()
        .map(|item| path_to_string(&item));

    entries.retain(|entry| {
        let matches_input = entry == &expanded;
        let matches_canonical = canonical
            .as_ref()
            .map(|resolved| entry == resolved)
            .unwrap_or(false);
        !(matches_input || matches_canonical)
    });
}

pub fn remove_projects_root(path: &str) -> Result<AppState> {
    let mut config = normalized_config(load_config()?);
    retain_excluding(&mut config.projects_roots, path);
    save_config(&config)?;

    Ok(AppState {
        projects: list_projects(&config),
        config,
    })
}

pub fn remove_project(path: &str) -> Result<AppState> {
    let mut config = normalized_config(load_config()?);
    retain_excluding(&mut config.recent_projects, path);
    retain_excluding(&mut config.pinned_projects, path);
    save_config(&config)?;

    Ok(AppState {
        projects: list_projects(&config),
        config,
    })
}

pub fn pin_project(path: &str) -> Result<AppState> {
    let project_path = normalize_existing_project_directory(path)?;
    let project_str = path_to_string(&project_path);

    let mut config = normalized_config(load_config()?);
    if !config.pinned_projects.iter().any(|p| p == &project_str) {
        config.pinned_projects.push(project_str);
    }
    save_config(&config)?;

    Ok(AppState {
        projects: list_projects(&config),
        config,
    })
}

pub fn unpin_project(path: &str) -> Result<AppState> {
    let mut config = normalized_config(load_config()?);
    retain_excluding(&mut config.pinned_projects, path);
    save_config(&config)?;

    Ok(AppState {
        projects: list_projects(&config),
        config,
    })
}

fn yaml_quote(value: &str) -> String {
    let escaped = value.replace('\\', r#"\\"#).replace('"', r#"\""#);
    format!(r#""{escaped}""#)
}

fn build_starter_page(project: &str, title: &str, subtitle: &str, date_label: &str) -> String {
    format!(
        r#"---
project: {project}
title: {title}
subtitle: {subtitle}
date: {date_label}
---

<main className="deck">

<section className="slide">

# {title}

</section>

<section className="slide">

# Problem

- Current process is fragmented across inboxes and handoffs.
- Ownership is unclear for time-sensitive messages.

</section>

<section className="slide">

# Proposal

1. Classify incoming messages by intent and urgency.
2. Route each message to a clear owner.
3. Track response timing and outcomes.

</section>

</main>
"#,
        project = yaml_quote(project),
        title = yaml_quote(title),
        subtitle = yaml_quote(subtitle),
        date_label = yaml_quote(date_label)
    )
}

/// Scaffold a new project folder with asset subfolders and a starter deck.
pub fn create_project(
    root: &str,
    name: &str,
    title: Option<&str>,
    subtitle: Option<&str>,
    date_label: Option<&str>,
) -> Result<ProjectDetail> {
    if !project_name_re().is_match(name) {
        return Err(DeckError::ValidationError(
            "Invalid project name. Use letters, numbers, dot, underscore, and dash.".to_string(),
        ));
    }

    let root_path = normalize_existing_directory(root)?;
    let project_path = root_path.join(name);
    if project_path.exists() {
        return Err(DeckError::ValidationError(format!(
            "Project folder already exists: {}",
            project_path.display()
        )));
    }

    fs::create_dir_all(project_path.join("images"))?;
    fs::create_dir_all(project_path.join("media"))?;
    fs::create_dir_all(project_path.join("data"))?;

    let starter = build_starter_page(
        name,
        title.unwrap_or(DEFAULT_TITLE),
        subtitle.unwrap_or(DEFAULT_SUBTITLE),
        date_label.unwrap_or(DEFAULT_DATE_LABEL),
    );
    write_page_mdx(&project_path, &starter)?;
    info!("Created project {:?}", project_path);

    let mut config = normalized_config(load_config()?);
    remember_recent_project(&mut config, &project_path);
    save_config(&config)?;
    project_detail_for_path(&config, &project_path)
}

fn words_in_text(text: &str) -> usize {
    let plain = html_tag_re().replace_all(text, " ");
    word_re().find_iter(&plain).count()
}

fn max_paragraph_words(text: &str) -> usize {
    let plain = html_tag_re().replace_all(text, " ");
    plain
        .split("\n\n")
        .map(|chunk| word_re().find_iter(chunk.trim()).count())
        .max()
        .unwrap_or(0)
}

fn audit_asset(
    project_dir: &Path,
    raw: &str,
    seen: &mut HashSet<String>,
    errors: &mut Vec<String>,
    assets_checked: &mut usize,
) {
    let Some(relative_path) = paths::sanitize(raw) else {
        return;
    };
    if !seen.insert(relative_path.clone()) {
        return;
    }

    let Some(resolved) = paths::resolve_relative_path(project_dir, &relative_path) else {
        errors.push(format!("Asset path escapes project folder: {raw}"));
        return;
    };
    if !resolved.exists() {
        errors.push(format!(
            "Missing asset target: {raw} -> {}",
            resolved.display()
        ));
        return;
    }
    *assets_checked += 1;
}

/// Validate a project folder: frontmatter hygiene, per-slide density
/// thresholds, and an asset audit against the filesystem.
pub fn validate_project(path: &str) -> Result<ValidationReport> {
    let canonical_project = normalize_existing_directory(path)?;
    let page_path = canonical_project.join("page.mdx");
    if !page_path.exists() {
        return Err(DeckError::PathNotFoundError(page_path));
    }

    let source = read_page_mdx(&canonical_project)?;
    let (frontmatter, body) = compiler::split_frontmatter(&source);
    let mut errors = Vec::<String>::new();
    let mut warnings = Vec::<String>::new();

    if let Some(frontmatter_values) = &frontmatter {
        if frontmatter_values
            .get("project")
            .map(|item| item.trim().is_empty())
            .unwrap_or(true)
        {
            warnings.push("Frontmatter is missing `project`.".to_string());
        }
        if frontmatter_values
            .get("title")
            .map(|item| item.trim().is_empty())
            .unwrap_or(true)
        {
            warnings.push("Frontmatter is missing `title`.".to_string());
        }

        let declared_project = frontmatter_values
            .get("project")
            .map(|item| item.trim())
            .unwrap_or_default();
        let folder_name = canonical_project
            .file_name()
            .map(|item| item.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !declared_project.is_empty() && declared_project != folder_name {
            warnings.push(format!(
                "Frontmatter project `{declared_project}` does not match folder name `{folder_name}`."
            ));
        }
    } else {
        warnings.push(
            "Missing YAML frontmatter in page.mdx. Add metadata block with project/title/subtitle/date."
                .to_string(),
        );
    }

    if import_export_re().is_match(&body) {
        errors.push(
            "Detected import/export statements in page.mdx; runtime decks should be content-only."
                .to_string(),
        );
    }
    if use_client_re().is_match(&body) {
        warnings.push(
            r#"Found "use client" directive in page.mdx; this is usually unnecessary."#.to_string(),
        );
    }

    let slides = compiler::extract_slide_sources(&body);
    if slides.is_empty() {
        errors.push(r#"No `<section className="slide">` blocks were found."#.to_string());
    }

    for (index, slide) in slides.iter().enumerate() {
        let words = words_in_text(slide);
        let bullets = bullet_re().find_iter(slide).count();
        let paragraph_words = max_paragraph_words(slide);
        let human_index = index + 1;

        if words > MAX_SLIDE_WORDS {
            warnings.push(format!(
                "Slide {human_index} has {words} words (threshold: {MAX_SLIDE_WORDS})."
            ));
        }
        if bullets > MAX_SLIDE_BULLETS {
            warnings.push(format!(
                "Slide {human_index} has {bullets} bullets/list items (threshold: {MAX_SLIDE_BULLETS})."
            ));
        }
        if paragraph_words > MAX_PARAGRAPH_WORDS {
            warnings.push(format!(
                "Slide {human_index} has a paragraph with {paragraph_words} words (threshold: {MAX_PARAGRAPH_WORDS})."
            ));
        }
    }

    let mut seen = HashSet::<String>::new();
    let mut assets_checked = 0usize;

    for captures in markdown_link_re().captures_iter(&body) {
        let raw = captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|item| item.as_str())
            .unwrap_or_default();
        // Traversal attempts never make it past the sanitizer; flag the
        // obvious ones explicitly so the report names them.
        if raw.trim_start().starts_with("../") {
            errors.push(format!("Invalid traversal asset path: {raw}"));
            continue;
        }
        audit_asset(
            &canonical_project,
            raw,
            &mut seen,
            &mut errors,
            &mut assets_checked,
        );
    }

    for captures in attr_link_re().captures_iter(&body) {
        let raw = captures.get(1).map(|item| item.as_str()).unwrap_or_default();
        if raw.trim_start().starts_with("../") {
            errors.push(format!("Invalid traversal asset path: {raw}"));
            continue;
        }
        audit_asset(
            &canonical_project,
            raw,
            &mut seen,
            &mut errors,
            &mut assets_checked,
        );
    }

    if !errors.is_empty() {
        warn!(
            "Validation found {} error(s) in {:?}",
            errors.len(),
            canonical_project
        );
    }

    Ok(ValidationReport {
        path: path_to_string(&canonical_project),
        slide_count: slides.len(),
        assets_checked,
        errors,
        warnings,
    })
}
