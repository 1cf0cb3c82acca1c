//! Rewriting a single Doxygen page for offline use.
//!
//! The page is first inspected with `scraper` to decide which member cells
//! get a TOC anchor, then streamed through `lol_html` which applies the
//! attribute rewrites and prepends the anchors. Everything else in the
//! document passes through untouched.

use std::cell::Cell;

use lol_html::html_content::{ContentType, Element};
use lol_html::{RewriteStrSettings, element, rewrite_str};
use scraper::{Html, Selector};
use thiserror::Error;

/// Script sources that must not load in the offline copy.
const BLOCKED_SCRIPTS: &[&str] = &["www.microsofttranslator.com", "adsk.redirect.js"];

/// Hash-bang redirect prefix the vendor site puts in front of page links.
pub const REDIRECT_MARKER: &str = "#!/url=./cpp_ref/";

/// Prefix of the TOC anchor name understood by docset viewers.
pub const ANCHOR_PREFIX: &str = "//apple_ref/cpp/Function/";

/// What happened while transforming one page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransformResult {
    /// Script tags whose `src` was blanked.
    pub scripts_blocked: usize,
    /// `href`/`src` attributes whose value changed.
    pub attributes_rewritten: usize,
    /// TOC anchors inserted.
    pub anchors_inserted: usize,
    /// Member cell texts that could not be turned into an anchor.
    pub skipped_members: Vec<String>,
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to rewrite HTML: {0}")]
    Rewrite(#[from] lol_html::errors::RewritingError),
}

/// New `src` for a `<script>`: blocked scripts get an empty source.
pub fn rewrite_script_src(src: &str) -> String {
    if BLOCKED_SCRIPTS.iter().any(|blocked| src.contains(blocked)) {
        String::new()
    } else {
        src.replace("../scripts", "./scripts")
    }
}

pub fn rewrite_img_src(src: &str) -> String {
    src.replace("cpp_ref/", "./")
}

/// New `href` for `<a>` and `<link>`.
pub fn rewrite_href(href: &str) -> String {
    let href = href.replace("style/", "./");
    if href.contains(REDIRECT_MARKER) {
        href.replace(REDIRECT_MARKER, "./")
    } else {
        href.replace("cpp_ref/", "./")
    }
}

/// Member name from the trailing text of a `memname` cell.
///
/// Doxygen ends the cell with `"<type> <scope>::<name> "`; the name is the
/// second-to-last space separated piece. Returns `Err` with the text when it
/// has fewer than two pieces.
pub fn member_name(text: &str) -> Result<&str, &str> {
    let pieces: Vec<&str> = text.split(' ').collect();
    if pieces.len() < 2 {
        return Err(text);
    }
    Ok(pieces[pieces.len() - 2])
}

/// Anchor planned for one `td.memname` cell, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CellAnchor {
    Insert(String),
    Skip(String),
    Untouched,
}

fn plan_anchors(html: &str) -> Vec<CellAnchor> {
    let document = Html::parse_document(html);
    let cells = Selector::parse("td.memname").expect("valid selector");
    let links = Selector::parse("a").expect("valid selector");

    document
        .select(&cells)
        .map(|cell| {
            if cell.select(&links).next().is_none() {
                return CellAnchor::Untouched;
            }
            let Some(text) = cell.last_child().and_then(|n| n.value().as_text()) else {
                return CellAnchor::Untouched;
            };
            let text: &str = text;
            if text.chars().count() <= 2 {
                return CellAnchor::Untouched;
            }
            match member_name(text) {
                Ok(name) => CellAnchor::Insert(name.to_string()),
                Err(text) => CellAnchor::Skip(text.to_string()),
            }
        })
        .collect()
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Set `attr` to `value`, returning whether it changed.
fn replace_attribute(
    el: &mut Element<'_, '_>,
    attr: &str,
    value: &str,
) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    if el.get_attribute(attr).as_deref() == Some(value) {
        return Ok(false);
    }
    el.set_attribute(attr, value)?;
    Ok(true)
}

/// HTML for the TOC anchor of `name`.
pub fn anchor_tag(name: &str) -> String {
    format!(
        r#"<a name="{}" class="dashAnchor"></a>"#,
        escape_attribute(&format!("{ANCHOR_PREFIX}{name}"))
    )
}

/// Rewrite one page, returning the new document and what changed.
pub fn transform_html(html: &str) -> Result<(String, TransformResult), TransformError> {
    let plan = plan_anchors(html);

    let mut result = TransformResult::default();
    for cell in &plan {
        if let CellAnchor::Skip(text) = cell {
            result.skipped_members.push(text.clone());
        }
    }

    let scripts_blocked = Cell::new(0usize);
    let rewritten = Cell::new(0usize);
    let anchors = Cell::new(0usize);
    let cell_index = Cell::new(0usize);
    let count_change = |changed: bool| {
        if changed {
            rewritten.set(rewritten.get() + 1);
        }
    };

    let output = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("script[src]", |el| {
                    let src = el.get_attribute("src").unwrap_or_default();
                    let new_src = rewrite_script_src(&src);
                    if new_src.is_empty() && !src.is_empty() {
                        scripts_blocked.set(scripts_blocked.get() + 1);
                    }
                    count_change(replace_attribute(el, "src", &new_src)?);
                    Ok(())
                }),
                element!("img[src]", |el| {
                    let src = el.get_attribute("src").unwrap_or_default();
                    count_change(replace_attribute(el, "src", &rewrite_img_src(&src))?);
                    Ok(())
                }),
                element!("a[href]", |el| {
                    let href = el.get_attribute("href").unwrap_or_default();
                    count_change(replace_attribute(el, "href", &rewrite_href(&href))?);
                    Ok(())
                }),
                element!("link[href]", |el| {
                    let href = el.get_attribute("href").unwrap_or_default();
                    count_change(replace_attribute(el, "href", &rewrite_href(&href))?);
                    Ok(())
                }),
                element!("td.memname", |el| {
                    let index = cell_index.get();
                    cell_index.set(index + 1);
                    if let Some(CellAnchor::Insert(name)) = plan.get(index) {
                        el.prepend(&anchor_tag(name), ContentType::Html);
                        anchors.set(anchors.get() + 1);
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )?;

    result.scripts_blocked = scripts_blocked.get();
    result.attributes_rewritten = rewritten.get();
    result.anchors_inserted = anchors.get();

    Ok((output, result))
}
