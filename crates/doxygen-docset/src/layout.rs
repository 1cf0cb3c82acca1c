//! Docset directory layout and default path resolution.
//!
//! A docset is a bundle directory:
//!
//! ```text
//! max-2017-cpp.docset/
//!   Contents/
//!     Info.plist
//!     Resources/
//!       docSet.dsidx
//!       Documents/
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Version tag used by the index builder when none is given.
pub const DEFAULT_VERSION: &str = "2017";

/// Name of the SQLite index file inside `Contents/Resources`.
pub const INDEX_FILE_NAME: &str = "docSet.dsidx";

/// Paths of a docset bundle rooted at `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsetLayout {
    root: PathBuf,
}

impl DocsetLayout {
    /// Layout rooted at an explicit `.docset` directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default layout for a version tag, relative to `base`.
    pub fn for_version(base: &Path, version: &str) -> Self {
        Self::new(base.join(format!("max-{version}-cpp.docset")))
    }

    /// Recover the bundle root from a `Contents/Resources/Documents` path.
    ///
    /// Returns `None` when `documents` is not laid out that way.
    pub fn from_documents_dir(documents: &Path) -> Option<Self> {
        let resources = documents.parent()?;
        let contents = resources.parent()?;
        let named = |p: &Path, name: &str| p.file_name().is_some_and(|n| n == name);
        if named(documents, "Documents")
            && named(resources, "Resources")
            && named(contents, "Contents")
        {
            contents.parent().map(Self::new)
        } else {
            None
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn contents_dir(&self) -> PathBuf {
        self.root.join("Contents")
    }

    pub fn resources_dir(&self) -> PathBuf {
        self.contents_dir().join("Resources")
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.resources_dir().join("Documents")
    }

    pub fn index_path(&self) -> PathBuf {
        self.resources_dir().join(INDEX_FILE_NAME)
    }

    pub fn info_plist_path(&self) -> PathBuf {
        self.contents_dir().join("Info.plist")
    }
}

/// Default location of the vendor HTML for a version tag.
pub fn default_sources(base: &Path, version: &str) -> PathBuf {
    base.join("resources").join(version).join("cpp_ref")
}

/// Errors raised while validating input and output locations.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("the source and output directories are the same: {}", .0.display())]
    SameDirectory(PathBuf),

    #[error("the directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error("the parent directory of {} does not exist", .0.display())]
    MissingParent(PathBuf),

    #[error(
        "the output directory {} contains the sources {}",
        .output.display(),
        .sources.display()
    )]
    SourcesInsideOutput { sources: PathBuf, output: PathBuf },

    #[error("failed to resolve {}: {source}", .path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn resolve(path: &Path) -> Result<PathBuf, LayoutError> {
    fs::canonicalize(path).map_err(|source| LayoutError::Resolve {
        path: path.to_path_buf(),
        source,
    })
}

/// Ensure `sources` is an existing directory that clearing `output` leaves
/// intact.
///
/// Paths are compared after resolving symlinks and `..`, so two spellings of
/// one directory are rejected, as is an output that contains the sources.
pub fn validate_sources(sources: &Path, output: &Path) -> Result<(), LayoutError> {
    if sources == output {
        return Err(LayoutError::SameDirectory(sources.to_path_buf()));
    }
    if !sources.is_dir() {
        return Err(LayoutError::MissingDirectory(sources.to_path_buf()));
    }
    if !output.exists() {
        return Ok(());
    }

    let resolved_sources = resolve(sources)?;
    let resolved_output = resolve(output)?;
    if resolved_sources == resolved_output {
        return Err(LayoutError::SameDirectory(output.to_path_buf()));
    }
    if resolved_sources.starts_with(&resolved_output) {
        return Err(LayoutError::SourcesInsideOutput {
            sources: sources.to_path_buf(),
            output: output.to_path_buf(),
        });
    }
    Ok(())
}

/// Ensure the directory that will hold `path` exists.
pub fn validate_parent(path: &Path) -> Result<(), LayoutError> {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() || parent.is_dir() => Ok(()),
        _ => Err(LayoutError::MissingParent(path.to_path_buf())),
    }
}

/// List the entry names of `dir`, sorted so batches are deterministic.
pub fn list_file_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Identity written into a docset's `Info.plist`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub id: String,
    pub name: String,
}

impl Bundle {
    pub fn for_version(version: &str) -> Self {
        Self {
            id: format!("max-{version}-cpp"),
            name: format!("3ds Max {version} C++ SDK"),
        }
    }

    pub fn info_plist(&self) -> String {
        info_plist(&self.id, &self.name)
    }
}

/// Minimal `Info.plist` describing a docset bundle.
pub fn info_plist(bundle_id: &str, bundle_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>CFBundleIdentifier</key>
	<string>{bundle_id}</string>
	<key>CFBundleName</key>
	<string>{bundle_name}</string>
	<key>DocSetPlatformFamily</key>
	<string>{bundle_id}</string>
	<key>dashIndexFilePath</key>
	<string>index.html</string>
	<key>isDashDocset</key>
	<true/>
</dict>
</plist>
"#
    )
}
