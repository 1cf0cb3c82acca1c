//! Builds the docset search index from a directory of Doxygen pages.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::batch::{BatchOutcome, Schedule, run_batches};
use crate::classify::{PageKind, classify};
use crate::extract::class_members;
use crate::index::{
    DEFAULT_BUSY_TIMEOUT, DEFAULT_COMMIT_RETRY_DELAY, IndexError, SearchEntry, SearchIndex,
};
use crate::layout::{list_file_names, validate_parent, validate_sources};
use crate::report::{Reporter, progress_bar};

/// Options for the index builder.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Directory of (cleaned) HTML pages.
    pub sources: PathBuf,
    /// Index file to write.
    pub database: PathBuf,
    pub schedule: Schedule,
    /// Per-connection wait on a locked database.
    pub busy_timeout: Duration,
    /// Pause before the single commit retry.
    pub commit_retry_delay: Duration,
}

impl IndexOptions {
    pub fn new(sources: impl Into<PathBuf>, database: impl Into<PathBuf>) -> Self {
        Self {
            sources: sources.into(),
            database: database.into(),
            schedule: Schedule::Sequential,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            commit_retry_delay: DEFAULT_COMMIT_RETRY_DELAY,
        }
    }
}

/// Counters from one index batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    /// Pages that produced at least one entry.
    pub pages_indexed: usize,
    /// Rows actually inserted.
    pub entries_inserted: usize,
    /// Rows dropped because the triple already existed.
    pub duplicates_ignored: usize,
}

impl IndexStats {
    fn merge(&mut self, other: &IndexStats) {
        self.pages_indexed += other.pages_indexed;
        self.entries_inserted += other.entries_inserted;
        self.duplicates_ignored += other.duplicates_ignored;
    }
}

/// Outcome of a whole index build.
#[derive(Debug)]
pub struct IndexSummary {
    pub files: usize,
    pub outcomes: Vec<BatchOutcome<IndexStats, IndexError>>,
}

impl IndexSummary {
    /// Totals across the batches that succeeded.
    pub fn totals(&self) -> IndexStats {
        let mut totals = IndexStats::default();
        for outcome in &self.outcomes {
            if let Ok(stats) = &outcome.result {
                totals.merge(stats);
            }
        }
        totals
    }

    pub fn failures(&self) -> impl Iterator<Item = (usize, &IndexError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.batch, e)))
    }
}

/// Index rows for one page: the page's own entry, plus members for classes.
pub fn page_entries(file_name: &str, sources: &Path) -> Result<Vec<SearchEntry>, IndexError> {
    let kind = classify(file_name);
    let (Some(name), Some(entry_type)) = (kind.name(), kind.entry_type()) else {
        return Ok(Vec::new());
    };

    let mut entries = vec![SearchEntry::new(name, entry_type, file_name)];

    if let PageKind::Class(class) = &kind {
        let path = sources.join(file_name);
        let html = fs::read_to_string(&path).map_err(|source| IndexError::Read { path, source })?;
        entries.extend(class_members(&html).into_iter().map(|member| {
            SearchEntry::new(
                format!("{class}::{}", member.name),
                member.entry_type,
                member.href,
            )
        }));
    }

    Ok(entries)
}

/// Insert the entries of `files` inside one transaction.
pub fn index_batch(
    index: &SearchIndex,
    files: &[String],
    sources: &Path,
    commit_retry_delay: Duration,
    reporter: &Reporter,
) -> Result<IndexStats, IndexError> {
    let mut stats = IndexStats::default();
    index.begin()?;
    for file in files {
        let entries = page_entries(file, sources)?;
        if !entries.is_empty() {
            reporter.file_started(file);
            stats.pages_indexed += 1;
        }
        for entry in &entries {
            if index.insert(entry)? {
                stats.entries_inserted += 1;
            } else {
                stats.duplicates_ignored += 1;
            }
        }
        reporter.file_done();
    }
    index.commit_with_retry(commit_retry_delay)?;
    debug!(batch = reporter.batch(), "closing connection to database");
    Ok(stats)
}

/// Index builder for a directory of pages.
pub struct Indexer {
    options: IndexOptions,
}

impl Indexer {
    pub fn new(options: IndexOptions) -> Self {
        Self { options }
    }

    /// Reset the index table and fill it from the source directory.
    ///
    /// Fails early if the sources or the index location are unusable; after
    /// that, failures are per batch and reported in the summary.
    pub fn run(&self) -> Result<IndexSummary, IndexError> {
        let options = &self.options;
        validate_parent(&options.database)?;
        validate_sources(&options.sources, &options.database)?;

        if !options.database.exists() {
            debug!(path = %options.database.display(), "creating database file");
        }
        SearchIndex::open(&options.database, options.busy_timeout)?.reset()?;

        let files = list_file_names(&options.sources).map_err(|source| IndexError::List {
            path: options.sources.clone(),
            source,
        })?;
        info!(files = files.len(), "inserting entries into database");

        let progress = progress_bar(files.len() as u64);
        let outcomes = run_batches(&files, options.schedule, &progress, |batch, reporter| {
            let index = SearchIndex::open(&options.database, options.busy_timeout)?;
            index_batch(
                &index,
                batch,
                &options.sources,
                options.commit_retry_delay,
                reporter,
            )
        });
        progress.finish_and_clear();

        Ok(IndexSummary {
            files: files.len(),
            outcomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::EntryType;

    const CLASS_PAGE: &str = r#"<html><body>
<table class="memberdecls">
<tr class="heading"><td colspan="2"><h2 class="groupheader"><a name="pub-methods"></a>Public Member Functions</h2></td></tr>
<tr class="memitem:a1"><td class="memItemLeft">void </td><td class="memItemRight"><a class="el" href="class_my_class.html#a1">doThing</a> ()</td></tr>
<tr class="inherit pub_methods_class_base"><td class="memItemLeft">void </td><td class="memItemRight"><a class="el" href="class_base.html#b1">baseThing</a> ()</td></tr>
</table>
</body></html>"#;

    fn write_docs(dir: &Path) {
        fs::write(dir.join("class_my_class.html"), CLASS_PAGE).unwrap();
        fs::write(dir.join("class_my_class-members.html"), CLASS_PAGE).unwrap();
        fs::write(dir.join("struct_point.html"), "<html></html>").unwrap();
        fs::write(dir.join("index.html"), "<html></html>").unwrap();
        fs::write(dir.join("adsk.cpp.css"), "body {}").unwrap();
    }

    fn options(sources: &Path, database: &Path, schedule: Schedule) -> IndexOptions {
        IndexOptions {
            schedule,
            commit_retry_delay: Duration::from_millis(10),
            ..IndexOptions::new(sources, database)
        }
    }

    #[test]
    fn test_end_to_end_rows() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("Documents");
        fs::create_dir(&docs).unwrap();
        write_docs(&docs);
        let db = dir.path().join("docSet.dsidx");

        let summary = Indexer::new(options(&docs, &db, Schedule::Sequential))
            .run()
            .unwrap();
        assert_eq!(summary.outcomes.len(), 1);
        assert_eq!(summary.failures().count(), 0);
        assert_eq!(summary.totals().entries_inserted, 3);

        let entries = SearchIndex::open(&db, DEFAULT_BUSY_TIMEOUT)
            .unwrap()
            .entries()
            .unwrap();
        assert_eq!(
            entries,
            [
                SearchEntry::new("MyClass", EntryType::Class, "class_my_class.html"),
                SearchEntry::new("MyClass::doThing", EntryType::Method, "class_my_class.html#a1"),
                SearchEntry::new("Point", EntryType::Struct, "struct_point.html"),
            ]
        );
    }

    #[test]
    fn test_parallel_batches_and_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("Documents");
        fs::create_dir(&docs).unwrap();
        write_docs(&docs);
        fs::write(docs.join("union_value.html"), "").unwrap();
        fs::write(docs.join("group___animation.html"), "").unwrap();
        let db = dir.path().join("docSet.dsidx");

        let schedule = Schedule::Parallel { batch_size: 2 };
        let first = Indexer::new(options(&docs, &db, schedule)).run().unwrap();
        assert_eq!(first.outcomes.len(), 4);
        assert_eq!(first.failures().count(), 0);

        // A second run starts from an empty table.
        let second = Indexer::new(options(&docs, &db, schedule)).run().unwrap();
        assert_eq!(second.totals(), first.totals());

        let count = SearchIndex::open(&db, DEFAULT_BUSY_TIMEOUT)
            .unwrap()
            .count()
            .unwrap();
        assert_eq!(count, 5);
    }

    #[test]
    fn test_unreadable_class_page_fails_only_its_batch() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("Documents");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("a_8h.html"), "").unwrap();
        // A directory named like a class page cannot be read as a file.
        fs::create_dir(docs.join("class_broken.html")).unwrap();
        fs::write(docs.join("struct_point.html"), "").unwrap();
        let db = dir.path().join("docSet.dsidx");

        let summary = Indexer::new(options(&docs, &db, Schedule::Parallel { batch_size: 1 }))
            .run()
            .unwrap();
        let failed: Vec<_> = summary.failures().map(|(batch, _)| batch).collect();
        assert_eq!(failed, [1]);
        assert_eq!(summary.totals().entries_inserted, 2);
    }

    #[test]
    fn test_index_batch_counts_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        write_docs(dir.path());
        let index = SearchIndex::in_memory().unwrap();
        index.reset().unwrap();

        let files = ["class_my_class.html".to_string(), "struct_point.html".to_string()];
        let reporter = Reporter::hidden(0);
        let first = index_batch(&index, &files, dir.path(), Duration::ZERO, &reporter).unwrap();
        let second = index_batch(&index, &files, dir.path(), Duration::ZERO, &reporter).unwrap();

        assert_eq!(
            first,
            IndexStats {
                pages_indexed: 2,
                entries_inserted: 3,
                duplicates_ignored: 0,
            }
        );
        assert_eq!(second.entries_inserted, 0);
        assert_eq!(second.duplicates_ignored, 3);
        assert_eq!(index.count().unwrap(), 3);
    }

    #[test]
    fn test_missing_sources_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = Indexer::new(IndexOptions::new(
            dir.path().join("missing"),
            dir.path().join("docSet.dsidx"),
        ))
        .run();
        assert!(matches!(result, Err(IndexError::Layout(_))));
    }

    #[test]
    fn test_page_entries_for_plain_pages() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            page_entries("maxapi_8h.html", dir.path()).unwrap(),
            [SearchEntry::new("Maxapi", EntryType::File, "maxapi_8h.html")]
        );
        assert!(page_entries("index.html", dir.path()).unwrap().is_empty());
    }
}
