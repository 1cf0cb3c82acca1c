//! Member extraction from Doxygen class pages.
//!
//! A class page lists its members in `memberdecls` tables, one table per
//! section, each headed by `<h2 class="groupheader"><a name="pub-methods">`.
//! Member links live in `td.memItemRight` cells.

use scraper::{ElementRef, Html, Selector};

use crate::html::REDIRECT_MARKER;
use crate::index::EntryType;

/// A member section of a class page and how its rows are indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberSection {
    /// `name` of the anchor inside the section header.
    pub anchor: &'static str,
    pub entry_type: EntryType,
    /// Drop rows whose `tr` carries the `inherit` class.
    pub skip_inherited: bool,
}

pub const MEMBER_SECTIONS: [MemberSection; 4] = [
    MemberSection {
        anchor: "pub-types",
        entry_type: EntryType::Type,
        skip_inherited: true,
    },
    MemberSection {
        anchor: "pub-methods",
        entry_type: EntryType::Method,
        skip_inherited: true,
    },
    MemberSection {
        anchor: "pub-static-methods",
        entry_type: EntryType::Function,
        skip_inherited: true,
    },
    // Inherited protected methods are kept; the vendor pages have always been
    // indexed this way.
    MemberSection {
        anchor: "pro-methods",
        entry_type: EntryType::Method,
        skip_inherited: false,
    },
];

/// A documented member found on a class page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub entry_type: EntryType,
    pub href: String,
}

fn has_class(element: &ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// The text of `element` when it holds exactly one string, directly or through
/// a chain of single-child elements. Links wrapping mixed markup have none.
fn sole_string(element: ElementRef<'_>) -> Option<String> {
    let mut children = element.children();
    let child = children.next()?;
    if children.next().is_some() {
        return None;
    }
    match child.value().as_text() {
        Some(text) => Some(text.to_string()),
        None => ElementRef::wrap(child).and_then(sole_string),
    }
}

fn is_inherited_row(cell: &ElementRef<'_>) -> bool {
    cell.parent()
        .and_then(ElementRef::wrap)
        .is_some_and(|row| has_class(&row, "inherit"))
}

/// Documented members of a class page, in document order.
pub fn class_members(html: &str) -> Vec<Member> {
    let document = Html::parse_document(html);
    let headers = Selector::parse("h2.groupheader").expect("valid selector");
    let links = Selector::parse("a").expect("valid selector");
    let cells = Selector::parse("td.memItemRight").expect("valid selector");

    let mut members = Vec::new();
    for header in document.select(&headers) {
        let Some(anchor) = header.select(&links).next() else {
            continue;
        };
        let Some(section) = MEMBER_SECTIONS
            .iter()
            .find(|s| anchor.value().attr("name") == Some(s.anchor))
        else {
            continue;
        };
        let Some(table) = header
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "table")
        else {
            continue;
        };

        for cell in table.select(&cells) {
            let Some(link) = cell.select(&links).next() else {
                continue;
            };
            if !has_class(&link, "el") {
                continue;
            }
            if section.skip_inherited && is_inherited_row(&cell) {
                continue;
            }
            let Some(name) = sole_string(link) else {
                continue;
            };
            let href = link.value().attr("href").unwrap_or_default();
            if name.is_empty() || href.is_empty() {
                continue;
            }
            members.push(Member {
                name,
                entry_type: section.entry_type,
                href: href.replace(REDIRECT_MARKER, ""),
            });
        }
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(anchor: &str, title: &str, rows: &str) -> String {
        format!(
            r#"<table class="memberdecls">
<tr class="heading"><td colspan="2"><h2 class="groupheader"><a name="{anchor}"></a>{title}</h2></td></tr>
{rows}
</table>"#
        )
    }

    fn row(class: &str, link_class: &str, name: &str, href: &str) -> String {
        format!(
            r#"<tr class="{class}"><td class="memItemLeft" align="right" valign="top">void </td><td class="memItemRight" valign="bottom"><a class="{link_class}" href="{href}">{name}</a> ()</td></tr>"#
        )
    }

    fn page(sections: &[String]) -> String {
        format!("<html><body>{}</body></html>", sections.concat())
    }

    #[test]
    fn test_sections_map_to_entry_types() {
        let html = page(&[
            section(
                "pub-types",
                "Public Types",
                &row("memitem:a", "el", "Flags", "class_x.html#a1"),
            ),
            section(
                "pub-methods",
                "Public Member Functions",
                &row("memitem:b", "el", "doThing", "class_x.html#a2"),
            ),
            section(
                "pub-static-methods",
                "Static Public Member Functions",
                &row("memitem:c", "el", "create", "class_x.html#a3"),
            ),
            section(
                "pro-methods",
                "Protected Member Functions",
                &row("memitem:d", "el", "init", "class_x.html#a4"),
            ),
        ]);
        let members = class_members(&html);
        let got: Vec<_> = members
            .iter()
            .map(|m| (m.name.as_str(), m.entry_type, m.href.as_str()))
            .collect();
        assert_eq!(
            got,
            [
                ("Flags", EntryType::Type, "class_x.html#a1"),
                ("doThing", EntryType::Method, "class_x.html#a2"),
                ("create", EntryType::Function, "class_x.html#a3"),
                ("init", EntryType::Method, "class_x.html#a4"),
            ]
        );
    }

    #[test]
    fn test_undocumented_and_inherited_rows_are_dropped() {
        let rows = [
            row("memitem:a", "el", "kept", "class_x.html#a"),
            row("memitem:b", "code", "external", "http://example.com"),
            row("inherit pub_methods_class_base", "el", "inherited", "class_base.html#c"),
        ]
        .concat();
        let html = page(&[section("pub-methods", "Public Member Functions", &rows)]);
        let members = class_members(&html);
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["kept"]);
    }

    #[test]
    fn test_protected_methods_keep_inherited_rows() {
        let rows = [
            row("memitem:a", "el", "own", "class_x.html#a"),
            row("inherit pro_methods_class_base", "el", "fromBase", "class_base.html#b"),
        ]
        .concat();
        let html = page(&[section("pro-methods", "Protected Member Functions", &rows)]);
        let members = class_members(&html);
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["own", "fromBase"]);
    }

    #[test]
    fn test_links_with_nested_markup_are_dropped() {
        let rows = [
            row("memitem:a", "el", "<b>bold</b>", "class_x.html#a"),
            row("memitem:b", "el", "<b>op</b>erator", "class_x.html#b"),
            row("memitem:c", "el", "", "class_x.html#c"),
        ]
        .concat();
        let html = page(&[section("pub-methods", "Public Member Functions", &rows)]);
        let names: Vec<_> = class_members(&html).into_iter().map(|m| m.name).collect();
        assert_eq!(names, ["bold"]);
    }

    #[test]
    fn test_redirect_marker_is_stripped() {
        let html = page(&[section(
            "pub-methods",
            "Public Member Functions",
            &row("memitem:a", "el", "run", "#!/url=./cpp_ref/class_x.html#a9"),
        )]);
        assert_eq!(class_members(&html)[0].href, "class_x.html#a9");
    }

    #[test]
    fn test_unknown_sections_are_ignored() {
        let html = page(&[section(
            "pub-attribs",
            "Public Attributes",
            &row("memitem:a", "el", "value", "class_x.html#a"),
        )]);
        assert!(class_members(&html).is_empty());
    }
}
