//! Convert Doxygen HTML reference documentation into an offline docset.
//!
//! Two passes, each with its own binary:
//!
//! ```bash
//! docset-clean -m 2017
//! docset-index -m 2017
//! ```
//!
//! # How it works
//!
//! 1. **Cleaning**: every page of the vendor tree is streamed through
//!    lol_html. Links and script/image sources are rewritten so the pages
//!    work from a local directory, online-only scripts are blanked, and each
//!    member signature cell gets a TOC anchor
//!    (`<a name="//apple_ref/cpp/Function/..." class="dashAnchor">`).
//!
//! 2. **Indexing**: page file names are classified (class, struct, header,
//!    module and so on) and class pages are scanned for their documented
//!    members. Each symbol becomes a row of the SQLite `searchIndex` table.
//!
//! Both passes can split the file list into batches and run them on the
//! rayon pool; every batch reports its own outcome.

pub mod batch;
pub mod classify;
pub mod cleaner;
pub mod extract;
pub mod html;
pub mod index;
pub mod indexer;
pub mod layout;
pub mod report;

pub use batch::{BatchOutcome, DEFAULT_BATCH_SIZE, Schedule};
pub use classify::{PageKind, classify};
pub use cleaner::{CleanError, CleanOptions, CleanStats, CleanSummary, Cleaner};
pub use html::{TransformError, TransformResult, transform_html};
pub use index::{EntryType, IndexError, SearchEntry, SearchIndex};
pub use indexer::{IndexOptions, IndexStats, IndexSummary, Indexer};
pub use layout::{Bundle, DEFAULT_VERSION, DocsetLayout, LayoutError};
