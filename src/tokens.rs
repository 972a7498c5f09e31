// ABOUTME: Design-token handling for the project stylesheet (slides.css)
// ABOUTME: Round-trip-safe parsing between named tokens and CSS custom properties

use regex::{NoExpand, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Fixed token-name to CSS-variable mapping. Settings UI fields map onto
/// these names; everything else in the stylesheet is opaque.
pub const TOKEN_VARIABLES: [(&str, &str); 9] = [
    ("accent_color", "--accent-color"),
    ("background_color", "--background-color"),
    ("surface_color", "--surface-color"),
    ("heading_color", "--heading-color"),
    ("body_color", "--body-color"),
    ("heading_font", "--font-heading"),
    ("body_font", "--font-body"),
    ("base_font_size", "--base-font-size"),
    ("slide_padding", "--slide-padding"),
];

fn css_var_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(--[A-Za-z0-9-]+)\s*:\s*([^;{}]+);"#).expect("invalid css var regex")
    })
}

fn root_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?s):root\s*\{.*?\}"#).expect("invalid root block regex"))
}

/// CSS variable for a token name, if the token is recognized.
pub fn variable_for_token(token: &str) -> Option<&'static str> {
    TOKEN_VARIABLES
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, var)| *var)
}

/// Token name for a CSS variable, if the variable is recognized.
pub fn token_for_variable(variable: &str) -> Option<&'static str> {
    TOKEN_VARIABLES
        .iter()
        .find(|(_, var)| *var == variable)
        .map(|(name, _)| *name)
}

/// The recognized design tokens of a project stylesheet.
///
/// Only tokens from the fixed table are held; `parse(serialize(t)) == t`
/// for every populated field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesignTokens {
    values: BTreeMap<&'static str, String>,
}

impl DesignTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract recognized `--token-name: value;` pairs from stylesheet
    /// text. Unknown variables and all other CSS are ignored.
    pub fn parse(css: &str) -> Self {
        let mut values = BTreeMap::new();
        for captures in css_var_re().captures_iter(css) {
            let variable = captures.get(1).map(|item| item.as_str()).unwrap_or_default();
            let value = captures
                .get(2)
                .map(|item| item.as_str().trim())
                .unwrap_or_default();
            if let Some(token) = token_for_variable(variable) {
                values.insert(token, value.to_string());
            }
        }
        Self { values }
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(String::as_str)
    }

    /// Set a token value. Returns false (and stores nothing) for names
    /// outside the fixed table.
    pub fn set(&mut self, token: &str, value: &str) -> bool {
        match TOKEN_VARIABLES.iter().find(|(name, _)| *name == token) {
            Some((name, _)) => {
                self.values.insert(name, value.trim().to_string());
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Serialize as a `:root` block, variables in table order. Parsing the
    /// output yields an equal token set.
    pub fn serialize(&self) -> String {
        let mut css = String::from(":root {\n");
        for (name, variable) in TOKEN_VARIABLES {
            if let Some(value) = self.values.get(name) {
                css.push_str(&format!("  {}: {};\n", variable, value));
            }
        }
        css.push_str("}\n");
        css
    }

    /// Replace the stylesheet's `:root` block wholesale with this token
    /// set, or prepend one if the stylesheet has none. The block is never
    /// partially patched.
    pub fn apply_to_stylesheet(&self, css: &str) -> String {
        let block = self.serialize();
        let block = block.trim_end();
        if root_block_re().is_match(css) {
            root_block_re().replace(css, NoExpand(block)).into_owned()
        } else if css.trim().is_empty() {
            format!("{}\n", block)
        } else {
            format!("{}\n\n{}", block, css)
        }
    }
}
