//! Turns a vendor Doxygen tree into the `Documents` directory of a docset.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::batch::{BatchOutcome, Schedule, run_batches};
use crate::html::{TransformError, transform_html};
use crate::layout::{Bundle, DocsetLayout, LayoutError, list_file_names, validate_sources};
use crate::report::{Reporter, progress_bar, spinner};

/// Options for the cleaner.
#[derive(Debug, Clone)]
pub struct CleanOptions {
    /// Directory holding the vendor HTML (usually `.../cpp_ref`).
    pub sources: PathBuf,
    /// Directory to (re)create; normally a docset `Documents` directory.
    pub output: PathBuf,
    pub schedule: Schedule,
    /// Written to `Info.plist` when the output sits inside a docset bundle.
    pub bundle: Option<Bundle>,
}

impl CleanOptions {
    pub fn new(sources: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            sources: sources.into(),
            output: output.into(),
            schedule: Schedule::Sequential,
            bundle: None,
        }
    }
}

/// Counters from one clean batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanStats {
    pub pages_rewritten: usize,
    /// Non-HTML files copied unchanged.
    pub files_copied: usize,
    pub dirs_copied: usize,
    pub scripts_blocked: usize,
    pub attributes_rewritten: usize,
    pub anchors_inserted: usize,
    /// Member cells whose signature could not be split.
    pub members_skipped: usize,
}

impl CleanStats {
    fn merge(&mut self, other: &CleanStats) {
        self.pages_rewritten += other.pages_rewritten;
        self.files_copied += other.files_copied;
        self.dirs_copied += other.dirs_copied;
        self.scripts_blocked += other.scripts_blocked;
        self.attributes_rewritten += other.attributes_rewritten;
        self.anchors_inserted += other.anchors_inserted;
        self.members_skipped += other.members_skipped;
    }
}

/// Outcome of a whole clean run.
#[derive(Debug)]
pub struct CleanSummary {
    pub files: usize,
    pub outcomes: Vec<BatchOutcome<CleanStats, CleanError>>,
    /// Files copied from the sibling `style/` and `scripts/` directories.
    pub assets_copied: usize,
    /// `Info.plist` written by this run, if any.
    pub info_plist: Option<PathBuf>,
}

impl CleanSummary {
    /// Totals across the batches that succeeded.
    pub fn totals(&self) -> CleanStats {
        let mut totals = CleanStats::default();
        for outcome in &self.outcomes {
            if let Ok(stats) = &outcome.result {
                totals.merge(stats);
            }
        }
        totals
    }

    pub fn failures(&self) -> impl Iterator<Item = (usize, &CleanError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.batch, e)))
    }
}

/// Errors from cleaning a documentation tree.
#[derive(Debug, Error)]
pub enum CleanError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rewrite {}: {source}", .path.display())]
    Transform {
        path: PathBuf,
        #[source]
        source: TransformError,
    },

    #[error("failed to copy directory {}: {message}", .path.display())]
    Clone { path: PathBuf, message: String },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CleanError + '_ {
    move |source| CleanError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Copy the directory tree `src` to `dst`, which must not exist yet.
fn clone_dir(src: &Path, dst: &Path) -> Result<(), CleanError> {
    clonetree::clone_tree(src, dst, &clonetree::Options::new()).map_err(|e| CleanError::Clone {
        path: src.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(())
}

/// Copy every file under `src` into `dst`, keeping relative paths.
fn copy_contents(src: &Path, dst: &Path) -> Result<usize, CleanError> {
    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| CleanError::Io {
            path: src.to_path_buf(),
            source: e.into(),
        })?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(io_error(&target))?;
        } else {
            fs::copy(entry.path(), &target).map_err(io_error(entry.path()))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Rewrite one page from `src` into `dst`.
pub fn clean_page(
    src: &Path,
    dst: &Path,
    file: &str,
    reporter: &Reporter,
) -> Result<CleanStats, CleanError> {
    let html = fs::read_to_string(src).map_err(io_error(src))?;
    let (output, result) = transform_html(&html).map_err(|source| CleanError::Transform {
        path: src.to_path_buf(),
        source,
    })?;
    for member in &result.skipped_members {
        reporter.member_skipped(file, member);
    }
    fs::write(dst, output).map_err(io_error(dst))?;

    Ok(CleanStats {
        pages_rewritten: 1,
        scripts_blocked: result.scripts_blocked,
        attributes_rewritten: result.attributes_rewritten,
        anchors_inserted: result.anchors_inserted,
        members_skipped: result.skipped_members.len(),
        ..CleanStats::default()
    })
}

/// Clean one batch of entries of `sources` into `output`.
pub fn clean_batch(
    files: &[String],
    sources: &Path,
    output: &Path,
    reporter: &Reporter,
) -> Result<CleanStats, CleanError> {
    let mut stats = CleanStats::default();
    for file in files {
        reporter.file_started(file);
        let src = sources.join(file);
        let dst = output.join(file);
        let metadata = fs::metadata(&src).map_err(io_error(&src))?;

        if metadata.is_dir() {
            if dst.exists() {
                debug!(file, "directory already present in output");
            } else {
                clone_dir(&src, &dst)?;
                stats.dirs_copied += 1;
            }
        } else if file.ends_with(".html") {
            stats.merge(&clean_page(&src, &dst, file, reporter)?);
        } else {
            fs::copy(&src, &dst).map_err(io_error(&src))?;
            stats.files_copied += 1;
        }
        reporter.file_done();
    }
    Ok(stats)
}

/// Cleaner for a vendor documentation tree.
pub struct Cleaner {
    options: CleanOptions,
}

impl Cleaner {
    pub fn new(options: CleanOptions) -> Self {
        Self { options }
    }

    /// Recreate the output directory and fill it from the sources.
    pub fn run(&self) -> Result<CleanSummary, CleanError> {
        let options = &self.options;
        let output = &options.output;
        validate_sources(&options.sources, output)?;

        if output.is_dir() {
            debug!(path = %output.display(), "removing existing directory");
            fs::remove_dir_all(output).map_err(io_error(output))?;
        }
        fs::create_dir_all(output).map_err(io_error(output))?;

        let assets_copied = self.copy_assets()?;

        let files = list_file_names(&options.sources).map_err(io_error(&options.sources))?;
        info!(files = files.len(), "formatting documentation");

        let progress = progress_bar(files.len() as u64);
        let outcomes = run_batches(&files, options.schedule, &progress, |batch, reporter| {
            clean_batch(batch, &options.sources, output, reporter)
        });
        progress.finish_and_clear();

        let info_plist = self.write_info_plist()?;

        Ok(CleanSummary {
            files: files.len(),
            outcomes,
            assets_copied,
            info_plist,
        })
    }

    /// Copy the `style/` and `scripts/` directories that sit beside the
    /// sources. Pages link styles as `./x.css`, so `style/` is flattened into
    /// the output root; scripts keep their directory.
    fn copy_assets(&self) -> Result<usize, CleanError> {
        let Some(parent) = self.options.sources.parent() else {
            return Ok(0);
        };
        let output = &self.options.output;
        let mut copied = 0;

        let style = parent.join("style");
        if style.is_dir() {
            copied += copy_contents(&style, output)?;
        } else {
            warn!(path = %style.display(), "no style directory beside sources");
        }

        let scripts = parent.join("scripts");
        if scripts.is_dir() {
            let spinner = spinner("Copying scripts...");
            clone_dir(&scripts, &output.join("scripts"))?;
            spinner.finish_and_clear();
            copied += WalkDir::new(output.join("scripts"))
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .count();
        } else {
            warn!(path = %scripts.display(), "no scripts directory beside sources");
        }

        Ok(copied)
    }

    fn write_info_plist(&self) -> Result<Option<PathBuf>, CleanError> {
        let Some(bundle) = &self.options.bundle else {
            return Ok(None);
        };
        let Some(layout) = DocsetLayout::from_documents_dir(&self.options.output) else {
            debug!("output is not a docset Documents directory, skipping Info.plist");
            return Ok(None);
        };
        let path = layout.info_plist_path();
        if path.exists() {
            return Ok(None);
        }
        fs::write(&path, bundle.info_plist()).map_err(io_error(&path))?;
        Ok(Some(path))
    }
}
