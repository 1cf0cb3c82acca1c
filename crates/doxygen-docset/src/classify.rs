//! Page classification from Doxygen file names.
//!
//! Doxygen encodes what a page documents in its file name: `class_m_object.html`,
//! `struct_point.html`, `group___animation.html`, `m_object_8h.html` and so on.
//! Underscores separate words, and a doubled underscore stands for a literal
//! underscore in the symbol.

use crate::index::EntryType;

/// What a documentation file describes, with the symbol name derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    Class(String),
    Struct(String),
    Namespace(String),
    Example(String),
    Header(String),
    Module(String),
    Union(String),
    /// Not indexed: not HTML, an inherited-members listing, or unrecognised.
    Skip,
}

impl PageKind {
    /// Entry type of the page's own index row.
    pub fn entry_type(&self) -> Option<EntryType> {
        Some(match self {
            PageKind::Class(_) => EntryType::Class,
            PageKind::Struct(_) => EntryType::Struct,
            PageKind::Namespace(_) => EntryType::Namespace,
            PageKind::Example(_) => EntryType::Sample,
            PageKind::Header(_) => EntryType::File,
            PageKind::Module(_) => EntryType::Module,
            PageKind::Union(_) => EntryType::Union,
            PageKind::Skip => return None,
        })
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            PageKind::Class(name)
            | PageKind::Struct(name)
            | PageKind::Namespace(name)
            | PageKind::Example(name)
            | PageKind::Header(name)
            | PageKind::Module(name)
            | PageKind::Union(name) => Some(name.as_str()),
            PageKind::Skip => None,
        }
    }
}

/// Classify a bare file name (no directory).
pub fn classify(file_name: &str) -> PageKind {
    let Some(stem) = file_name.strip_suffix(".html") else {
        return PageKind::Skip;
    };
    if file_name.contains("-members") {
        return PageKind::Skip;
    }

    if let Some(rest) = stem.strip_prefix("class_") {
        PageKind::Class(class_name(rest))
    } else if file_name.starts_with("struct_") {
        let rest = stem.rsplit("struct_").next().unwrap_or_default();
        PageKind::Struct(join_capitalized(rest, ""))
    } else if file_name.starts_with("namespace") {
        PageKind::Namespace(join_capitalized(&stem.replace("namespace", ""), ""))
    } else if let Some((before, _)) = stem.split_once("-example") {
        PageKind::Example(join_capitalized(before, "") + "Example")
    } else if let Some(rest) = file_name.strip_suffix("_8h.html") {
        PageKind::Header(join_capitalized(rest, ""))
    } else if let Some(rest) = stem.strip_prefix("group___") {
        PageKind::Module(join_capitalized(rest, " "))
    } else if let Some(rest) = stem.strip_prefix("union_") {
        PageKind::Union(join_capitalized(rest, ""))
    } else {
        PageKind::Skip
    }
}

/// Upper-case the first character of `segment`.
pub fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Capitalise every non-empty `_`-separated segment and join with `sep`.
fn join_capitalized(encoded: &str, sep: &str) -> String {
    encoded
        .split('_')
        .filter(|segment| !segment.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(sep)
}

/// Class name from the part of the stem after `class_`.
///
/// Two consecutive empty segments (`___` between words) encode a literal
/// underscore.
pub fn class_name(encoded: &str) -> String {
    let segments: Vec<&str> = encoded.split('_').collect();
    let mut name = String::with_capacity(encoded.len());
    for (idx, segment) in segments.iter().enumerate() {
        if !segment.is_empty() {
            name.push_str(&capitalize(segment));
        } else if segments.get(idx + 1).is_some_and(|next| next.is_empty()) {
            name.push('_');
        }
    }
    name
}
