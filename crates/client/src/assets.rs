//! Critical asset discovery from the root document.
//!
//! The scan is textual: double-quoted `href="…css"` and `src="…js"`
//! attributes, in document order. Anything fancier (preload hints, module
//! graphs) is picked up lazily by the fetch strategies instead.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static STYLESHEET_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]+\.css)""#).expect("valid stylesheet pattern"));

static SCRIPT_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"src="([^"]+\.js)""#).expect("valid script pattern"));

/// Stylesheet and script references found in `html`, stylesheets first.
pub fn discover_assets(html: &str) -> Vec<String> {
    let styles = STYLESHEET_REF.captures_iter(html).map(|c| c[1].to_string());
    let scripts = SCRIPT_REF.captures_iter(html).map(|c| c[1].to_string());
    styles.chain(scripts).collect()
}

/// Seed list followed by discovered assets, de-duplicated in first-seen order.
pub fn critical_assets(seed: &[String], html: Option<&str>) -> Vec<String> {
    let discovered = html.map(discover_assets).unwrap_or_default();

    let mut seen = HashSet::new();
    seed.iter()
        .cloned()
        .chain(discovered)
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
