use super::{Asset, AssetVersion, AssetVersionItem, CdnProvider};
use crate::error::{CdnupError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// CDN origins checked in order; the first matching prefix wins.
const CDN_PREFIXES: &[(&str, CdnProvider)] = &[
    ("https://cdnjs.cloudflare.com/ajax/", CdnProvider::Cdnjs),
    ("https://cdn.jsdelivr.net/", CdnProvider::Jsdelivr),
];

/// Finds CDN-hosted scripts and stylesheets in markup files.
///
/// Markup is scanned at the tag level rather than parsed into a full tree, so
/// broken or partial documents (templates, fragments) still yield whatever
/// well-formed `<script>` and `<link>` tags they contain.
pub struct AssetExtractor {
    /// A comment, or the opening tag of an element we care about. Quoted
    /// attribute values are consumed whole so a `>` inside them does not end
    /// the tag.
    markup_pattern: Regex,
    attribute_pattern: Regex,
    script_end: Regex,
    style_end: Regex,
}

impl AssetExtractor {
    pub fn new() -> Result<Self> {
        let markup_pattern = Self::compile(
            r#"(?is)<!--.*?(?:-->|\z)|<(script|link|style)\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#,
        )?;
        let attribute_pattern = Self::compile(
            r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#,
        )?;

        Ok(Self {
            markup_pattern,
            attribute_pattern,
            script_end: Self::compile(r"(?i)</script\s*>")?,
            style_end: Self::compile(r"(?i)</style\s*>")?,
        })
    }

    fn compile(pattern: &str) -> Result<Regex> {
        Regex::new(pattern).map_err(|e| {
            CdnupError::ProjectValidation(format!("Invalid markup pattern '{}': {}", pattern, e))
        })
    }

    /// Extract every CDN asset referenced by the file at `path`.
    ///
    /// Never fails: an unreadable file is logged and contributes nothing.
    pub fn extract(&self, path: &Path) -> impl Iterator<Item = AssetVersionItem> + use<> {
        let items = match fs::read_to_string(path) {
            Ok(content) => self.extract_from_str(&content),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable markup file");
                Vec::new()
            }
        };

        items.into_iter()
    }

    pub fn extract_from_str(&self, content: &str) -> Vec<AssetVersionItem> {
        self.references(content)
            .into_iter()
            .filter_map(|reference| parse_asset_url(&reference.url, reference.integrity))
            .collect()
    }

    /// Script sources and stylesheet hrefs in document order. Comments and
    /// the raw text of `<script>` and `<style>` elements are skipped.
    fn references(&self, content: &str) -> Vec<Reference> {
        let mut references = Vec::new();
        let mut position = 0;

        while let Some(captures) = self.markup_pattern.captures_at(content, position) {
            let Some(whole) = captures.get(0) else {
                break;
            };
            position = whole.end();

            // Comment
            let Some(tag) = captures.get(1).map(|m| m.as_str().to_ascii_lowercase()) else {
                continue;
            };
            let attributes = self.parse_attributes(captures.get(2).map_or("", |m| m.as_str()));

            let raw_text_end = match tag.as_str() {
                "script" => Some(&self.script_end),
                "style" => Some(&self.style_end),
                _ => None,
            };
            if let Some(end) = raw_text_end.and_then(|pattern| pattern.find_at(content, position)) {
                position = end.end();
            }

            let url = match tag.as_str() {
                "script" => attributes.get("src"),
                "link" if is_stylesheet(&attributes) => attributes.get("href"),
                _ => None,
            };

            let Some(url) = url.map(|u| u.trim()).filter(|u| !u.is_empty()) else {
                continue;
            };

            references.push(Reference {
                url: url.to_string(),
                integrity: attributes
                    .get("integrity")
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty()),
            });
        }

        references
    }

    fn parse_attributes(&self, raw: &str) -> HashMap<String, String> {
        let mut attributes = HashMap::new();

        for captures in self.attribute_pattern.captures_iter(raw) {
            let Some(name) = captures.get(1) else {
                continue;
            };
            let value = captures
                .get(2)
                .or_else(|| captures.get(3))
                .or_else(|| captures.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();

            // Duplicate attributes: the first one counts
            attributes
                .entry(name.as_str().to_ascii_lowercase())
                .or_insert(value);
        }

        attributes
    }
}

struct Reference {
    url: String,
    integrity: Option<String>,
}

fn is_stylesheet(attributes: &HashMap<String, String>) -> bool {
    attributes.get("rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
}

/// Decompose a CDN URL into an asset occurrence, or `None` when the URL is
/// not hosted on a known CDN or does not follow the provider's layout.
pub fn parse_asset_url(url: &str, integrity: Option<String>) -> Option<AssetVersionItem> {
    let (prefix, cdn) = CDN_PREFIXES
        .iter()
        .find(|(prefix, _)| url.starts_with(*prefix))?;

    let path = url[prefix.len()..].split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').collect();

    let (name, version, file_name) = match cdn {
        CdnProvider::Cdnjs => parse_cdnjs_path(&segments)?,
        CdnProvider::Jsdelivr => parse_jsdelivr_path(&segments)?,
    };

    Some(AssetVersionItem {
        asset_version: AssetVersion::new(Asset::new(*cdn, name), version),
        url: url.to_string(),
        integrity,
        file_name,
    })
}

/// `libs/<name>/<version>/<path...>`
fn parse_cdnjs_path(segments: &[&str]) -> Option<(String, String, String)> {
    if segments.len() < 4 {
        return None;
    }

    let name = segments[1];
    let version = segments[2];
    if name.is_empty() || version.is_empty() {
        return None;
    }

    Some((
        name.to_string(),
        version.to_string(),
        segments[3..].join("/"),
    ))
}

/// `npm/<name>@<version>/<path...>`
fn parse_jsdelivr_path(segments: &[&str]) -> Option<(String, String, String)> {
    if segments.len() < 2 {
        return None;
    }

    let parts: Vec<&str> = segments[1].split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }

    Some((
        parts[0].to_string(),
        parts[1].to_string(),
        format!("/{}", segments[2..].join("/")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn extractor() -> AssetExtractor {
        AssetExtractor::new().unwrap()
    }

    #[test]
    fn ignores_markup_without_cdn_urls() {
        let html = r#"<html><head>
            <script src="/js/app.js"></script>
            <link rel="stylesheet" href="https://example.com/site.css">
        </head></html>"#;
        assert!(extractor().extract_from_str(html).is_empty());
    }

    #[test]
    fn extracts_cdnjs_script_with_integrity() {
        let html = r#"<script src="https://cdnjs.cloudflare.com/ajax/libs/jquery/3.6.0/jquery.min.js"
            integrity="sha512-abc" crossorigin="anonymous"></script>"#;
        let items = extractor().extract_from_str(html);

        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.asset().cdn, CdnProvider::Cdnjs);
        assert_eq!(item.asset().name, "jquery");
        assert_eq!(item.version(), "3.6.0");
        assert_eq!(item.file_name, "jquery.min.js");
        assert_eq!(item.integrity.as_deref(), Some("sha512-abc"));
    }

    #[test]
    fn extracts_nested_cdnjs_file_path() {
        let item = parse_asset_url(
            "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css",
            None,
        )
        .unwrap();
        assert_eq!(item.file_name, "css/all.min.css");
    }

    #[test]
    fn extracts_jsdelivr_stylesheet() {
        let html = r#"<LINK REL='Stylesheet' HREF='https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css'>"#;
        let items = extractor().extract_from_str(html);

        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.asset().cdn, CdnProvider::Jsdelivr);
        assert_eq!(item.asset().name, "bootstrap");
        assert_eq!(item.version(), "5.3.0");
        assert_eq!(item.file_name, "/dist/css/bootstrap.min.css");
        assert_eq!(item.integrity, None);
    }

    #[test]
    fn ignores_non_stylesheet_links() {
        let html = r#"<link rel="preload" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css">"#;
        assert!(extractor().extract_from_str(html).is_empty());
    }

    #[test]
    fn empty_integrity_is_treated_as_missing() {
        let html = r#"<script src="https://cdnjs.cloudflare.com/ajax/libs/lodash.js/4.17.21/lodash.min.js" integrity=""></script>"#;
        let items = extractor().extract_from_str(html);
        assert_eq!(items[0].integrity, None);
    }

    #[test]
    fn discards_short_cdnjs_paths() {
        assert!(parse_asset_url("https://cdnjs.cloudflare.com/ajax/libs/jquery/3.6.0", None).is_none());
        assert!(parse_asset_url("https://cdnjs.cloudflare.com/ajax/libs/jquery", None).is_none());
    }

    #[test]
    fn discards_jsdelivr_without_single_at() {
        assert!(parse_asset_url("https://cdn.jsdelivr.net/npm/bootstrap/dist/js/bootstrap.js", None).is_none());
        assert!(parse_asset_url("https://cdn.jsdelivr.net/npm/@popperjs/core@2.11.8/dist/umd/popper.min.js", None).is_none());
        assert!(parse_asset_url("https://cdn.jsdelivr.net/npm", None).is_none());
    }

    #[test]
    fn keeps_document_order_and_skips_empty_sources() {
        let html = r#"
            <script></script>
            <script src=""></script>
            <script src="https://cdn.jsdelivr.net/npm/vue@3.3.4/dist/vue.global.js"></script>
            <link href="https://cdnjs.cloudflare.com/ajax/libs/normalize/8.0.1/normalize.min.css" rel="stylesheet">
        "#;
        let items = extractor().extract_from_str(html);
        let names: Vec<_> = items.iter().map(|i| i.asset().name.as_str()).collect();
        assert_eq!(names, vec!["vue", "normalize"]);
    }

    #[test]
    fn tolerates_broken_markup() {
        let html = r#"<div><script src="https://cdnjs.cloudflare.com/ajax/libs/foo/1.0.0/foo.js"><p <<>"#;
        assert_eq!(extractor().extract_from_str(html).len(), 1);
    }

    #[test]
    fn quoted_angle_bracket_keeps_later_attributes() {
        let html = r#"<script src="https://cdnjs.cloudflare.com/ajax/libs/foo/1.0.0/foo.min.js"
            onerror="if (a > b) fallback()" integrity="sha256-OLD"></script>"#;
        let items = extractor().extract_from_str(html);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].integrity.as_deref(), Some("sha256-OLD"));
    }

    #[test]
    fn skips_comments_and_script_bodies() {
        let html = r#"
            <!-- <script src="https://cdnjs.cloudflare.com/ajax/libs/old/1.0.0/old.js"></script> -->
            <script>
                document.write('<script src="https://cdnjs.cloudflare.com/ajax/libs/inline/1.0.0/inline.js"><\/script>');
                var tag = '<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/css@1.0.0/a.css">';
            </script>
            <style>/* <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/styled@1.0.0/a.css"> */</style>
            <script src="https://cdn.jsdelivr.net/npm/vue@3.3.4/dist/vue.global.js"></script>
        "#;
        let items = extractor().extract_from_str(html);
        let names: Vec<_> = items.iter().map(|i| i.asset().name.as_str()).collect();
        assert_eq!(names, vec!["vue"]);
    }

    #[test]
    fn unterminated_comment_hides_the_rest() {
        let html = r#"<!-- <script src="https://cdnjs.cloudflare.com/ajax/libs/foo/1.0.0/foo.js"></script>"#;
        assert!(extractor().extract_from_str(html).is_empty());
    }

    #[test]
    fn missing_file_yields_nothing() {
        let dir = tempdir().unwrap();
        let items: Vec<_> = extractor().extract(&dir.path().join("missing.html")).collect();
        assert!(items.is_empty());
    }

    #[test]
    fn extracts_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(
            &path,
            r#"<script src="https://cdnjs.cloudflare.com/ajax/libs/foo/1.0.0/foo.min.js"></script>"#,
        )
        .unwrap();

        let items: Vec<_> = extractor().extract(&path).collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://cdnjs.cloudflare.com/ajax/libs/foo/1.0.0/foo.min.js");
    }
}
