// ABOUTME: Path sanitization for user-authored asset references
// ABOUTME: Maps raw src/href values to safe project-relative paths, rejecting traversal

use std::path::{Component, Path, PathBuf};

/// Top-level project folders an absolute reference is allowed to point into.
/// `/images/logo.png` is rewritten to `images/logo.png`; anything else
/// absolute is rejected.
const PROJECT_ASSET_ROOTS: [&str; 4] = ["assets", "images", "media", "data"];

/// Clean up a markdown-style link target: trim whitespace, drop angle
/// brackets, and cut at the first space (markdown titles).
fn clean_markdown_target(raw: &str) -> &str {
    let trimmed = raw.trim().trim_matches('<').trim_matches('>');
    match trimmed.find(' ') {
        Some(index) => &trimmed[..index],
        None => trimmed,
    }
}

/// True if the value is something the resolver must never touch: external
/// URLs, data/blob payloads, protocol-relative links, mail/tel schemes.
fn is_external_reference(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("data:")
        || lower.starts_with("blob:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("//")
}

/// Map a raw asset reference to a normalized project-relative path.
///
/// Returns `None` for anything that must not reach the resolver: empty or
/// fragment-only input, external references, absolute paths outside the
/// recognized asset roots, and any path whose `..` segments would escape
/// the project folder. Pure function, no I/O.
pub fn sanitize(raw: &str) -> Option<String> {
    let value = clean_markdown_target(raw);
    if value.is_empty() || value.starts_with('#') {
        return None;
    }
    if is_external_reference(value) {
        return None;
    }

    // Query string and fragment never participate in path resolution.
    let no_hash = value.split('#').next().unwrap_or_default();
    let no_query = no_hash.split('?').next().unwrap_or_default();
    if no_query.is_empty() {
        return None;
    }

    let normalized = no_query.replace('\\', "/");
    let relative = if let Some(stripped) = normalized.strip_prefix('/') {
        let allowed = PROJECT_ASSET_ROOTS.iter().any(|root| {
            stripped == *root || stripped.starts_with(&format!("{}/", root))
        });
        if !allowed {
            return None;
        }
        stripped
    } else {
        normalized.as_str()
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                // A pop past the project root is a traversal attempt.
                if segments.pop().is_none() {
                    return None;
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

/// Resolve a sanitized relative path against a project folder, refusing any
/// component that would step outside it.
pub fn resolve_relative_path(base_dir: &Path, relative: &str) -> Option<PathBuf> {
    let mut output = base_dir.to_path_buf();

    for component in Path::new(relative).components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => output.push(part),
            Component::ParentDir => {
                if !output.pop() {
                    return None;
                }
                if !output.starts_with(base_dir) {
                    return None;
                }
            }
            _ => return None,
        }
    }

    Some(output)
}
