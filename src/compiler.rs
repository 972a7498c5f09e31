// ABOUTME: Deck compilation module wrapping the external markdown engine
// ABOUTME: Strips frontmatter, extracts slide units, compiles HTML, and derives the outline

use comrak::{markdown_to_html, ComrakOptions};
use log::info;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::errors::{DeckError, Result};

/// Fence language routed to the diagram dispatcher instead of the
/// syntax-highlight path.
pub const DIAGRAM_LANGUAGE: &str = "mermaid";

/// Content loader injected into compilation: maps a raw `src`/`href` value
/// to a loadable source string. The identity function disables embedding.
pub type AssetSource<'a> = dyn Fn(&str) -> String + 'a;

fn slide_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<section\s+className=["']slide["']\s*>"#).expect("invalid slide regex")
    })
}

fn attr_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:src|href|poster)\s*=\s*["']([^"']+)["']"#)
            .expect("invalid attr link regex")
    })
}

fn import_export_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*(import|export)\s+"#).expect("invalid import/export regex")
    })
}

fn frontmatter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)\A---\s*\n(.*?)\n---\s*(?:\n|$)"#).expect("invalid frontmatter regex")
    })
}

fn frontmatter_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*([A-Za-z0-9_-]+)\s*:\s*(.*?)\s*$"#)
            .expect("invalid frontmatter line regex")
    })
}

fn diagram_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)```mermaid[ \t]*\n(.*?)\n```"#).expect("invalid diagram fence regex")
    })
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<h[1-6][^>]*>(.*?)</h[1-6]>"#).expect("invalid heading regex")
    })
}

fn html_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<[^>]+>"#).expect("invalid html tag regex"))
}

/// One entry of the deck's table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideOutlineEntry {
    pub index: usize,
    pub title: String,
}

/// One rendered slide unit.
#[derive(Debug, Clone)]
pub struct CompiledSlide {
    pub html: String,
    pub title: String,
}

/// A successfully compiled deck.
#[derive(Debug, Clone, Default)]
pub struct CompiledDeck {
    pub slides: Vec<CompiledSlide>,
}

impl CompiledDeck {
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Derive the table of contents from the compiled slides.
    pub fn outline(&self) -> Vec<SlideOutlineEntry> {
        self.slides
            .iter()
            .enumerate()
            .map(|(index, slide)| SlideOutlineEntry {
                index,
                title: slide.title.clone(),
            })
            .collect()
    }
}

fn normalize_frontmatter_value(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 {
        let first = trimmed.as_bytes()[0] as char;
        let last = trimmed.as_bytes()[trimmed.len() - 1] as char;
        if (first == '"' && last == '"') || (first == '\'' && last == '\'') {
            let inner = &trimmed[1..trimmed.len() - 1];
            let escaped_quote = format!(r#"\{first}"#);
            return inner
                .replace("\\\\", "\\")
                .replace(escaped_quote.as_str(), first.to_string().as_str())
                .trim()
                .to_string();
        }
    }
    trimmed.to_string()
}

/// Split a leading `---`-delimited metadata block from the document body.
///
/// Only the first such block is recognized; its absence is not an error.
/// Keys are lowercased, values unquoted. The keys themselves are opaque to
/// the preview beyond strip-and-ignore.
pub fn split_frontmatter(source: &str) -> (Option<HashMap<String, String>>, String) {
    let Some(captures) = frontmatter_re().captures(source) else {
        return (None, source.to_string());
    };
    let Some(full_match) = captures.get(0) else {
        return (None, source.to_string());
    };
    let block = captures.get(1).map(|item| item.as_str()).unwrap_or_default();

    let mut values = HashMap::<String, String>::new();
    for raw_line in block.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(parsed) = frontmatter_line_re().captures(line) {
            let key = parsed
                .get(1)
                .map(|item| item.as_str().to_ascii_lowercase())
                .unwrap_or_default();
            let value = parsed
                .get(2)
                .map(|item| normalize_frontmatter_value(item.as_str()))
                .unwrap_or_default();
            values.insert(key, value);
        }
    }

    (Some(values), source[full_match.end()..].to_string())
}

/// Extract the raw markdown body of each slide unit.
///
/// Units start at `<section className="slide">` and run to the matching
/// `</section>` or, if the author forgot to close, to the next section
/// start (or end of input).
pub fn extract_slide_sources(body: &str) -> Vec<String> {
    let matches: Vec<_> = slide_start_re().find_iter(body).collect();
    if matches.is_empty() {
        return Vec::new();
    }

    let mut slides = Vec::new();
    for (index, hit) in matches.iter().enumerate() {
        let start = hit.end();
        let explicit_end = body[start..].find("</section>").map(|offset| start + offset);
        let fallback_end = if index + 1 < matches.len() {
            matches[index + 1].start()
        } else {
            body.len()
        };
        let end = explicit_end.unwrap_or(fallback_end);
        slides.push(body[start..end].to_string());
    }
    slides
}

/// Count slide units without compiling, for project summaries.
pub fn slide_count_from_source(source: &str) -> usize {
    slide_start_re().find_iter(source).count()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Replace diagram-tagged fences with a placeholder node before the
/// markdown engine sees them; all other fences stay on the highlight path.
fn dispatch_diagram_fences(markdown: &str) -> String {
    diagram_fence_re()
        .replace_all(markdown, |captures: &regex::Captures| {
            let body = captures.get(1).map(|item| item.as_str()).unwrap_or_default();
            format!(
                "<div class=\"diagram\" data-lang=\"{}\">{}</div>",
                DIAGRAM_LANGUAGE,
                escape_html(body)
            )
        })
        .into_owned()
}

/// Rewrite `src`/`href`/`poster` attribute values through the injected
/// asset loader.
fn rewrite_asset_references(html: &str, resolve: &AssetSource) -> String {
    attr_link_re()
        .replace_all(html, |captures: &regex::Captures| {
            let whole = captures.get(0).map(|item| item.as_str()).unwrap_or_default();
            let raw = captures.get(1).map(|item| item.as_str()).unwrap_or_default();
            let resolved = resolve(raw);
            if resolved == raw {
                whole.to_string()
            } else {
                whole.replace(raw, &resolved)
            }
        })
        .into_owned()
}

fn slide_title(html: &str, index: usize) -> String {
    if let Some(captures) = heading_re().captures(html) {
        let inner = captures.get(1).map(|item| item.as_str()).unwrap_or_default();
        let text = html_tag_re().replace_all(inner, "");
        let text = text.trim();
        if !text.is_empty() {
            return text.to_string();
        }
    }
    format!("Slide {}", index + 1)
}

/// Compile a frontmatter-stripped document body into a renderable deck.
///
/// The markdown engine itself is an external collaborator; this layer owns
/// the slide-unit boundaries, the diagram dispatch, and the asset-loader
/// injection point. The caller is responsible for rejecting empty bodies
/// before calling in.
pub fn compile(body: &str, resolve: &AssetSource) -> Result<CompiledDeck> {
    if import_export_re().is_match(body) {
        return Err(DeckError::CompileError(
            "Detected import/export statements; runtime decks must be content-only markup."
                .to_string(),
        ));
    }

    let sources = extract_slide_sources(body);
    if sources.is_empty() {
        return Err(DeckError::CompileError(
            r#"No <section className="slide"> blocks were found."#.to_string(),
        ));
    }

    let mut options = ComrakOptions::default();
    options.render.unsafe_ = true; // Author components are raw HTML

    let mut slides = Vec::with_capacity(sources.len());
    for (index, source) in sources.iter().enumerate() {
        let prepared = dispatch_diagram_fences(source);
        let html = markdown_to_html(&prepared, &options);
        let html = rewrite_asset_references(&html, resolve);
        let title = slide_title(&html, index);
        slides.push(CompiledSlide { html, title });
    }

    info!("Compiled deck with {} slides", slides.len());
    Ok(CompiledDeck { slides })
}
