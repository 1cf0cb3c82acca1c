//! docset-index CLI - Build the search index of a docset.

use anyhow::{Result, bail};
use doxygen_docset::report::init_logging;
use doxygen_docset::{DEFAULT_VERSION, DocsetLayout, IndexOptions, Indexer, Schedule};
use facet::Facet;
use facet_args as args;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::time::Instant;

/// Generate the docset search index from the formatted documentation.
#[derive(Debug, Facet)]
struct Args {
    /// Directory holding the formatted documentation
    /// (defaults to the Documents directory beside the index)
    #[facet(args::named, args::short = 's', default)]
    sources: Option<PathBuf>,

    /// Index file to write
    /// (defaults to max-<version>-cpp.docset/Contents/Resources/docSet.dsidx)
    #[facet(args::named, args::short = 'o', default)]
    output: Option<PathBuf>,

    /// 3ds Max version of the docset (default 2017)
    #[facet(args::named, args::short = 'm', default)]
    max_version: Option<String>,

    /// Index files in parallel batches
    #[facet(args::named, args::short = 'p', default)]
    parallel: bool,

    /// Files per batch in parallel mode (default 500)
    #[facet(args::named, default)]
    batch_size: Option<usize>,

    /// Show debug logging
    #[facet(args::named, args::short = 'v', default)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args: Args = facet_args::from_std_args().unwrap_or_else(|e| {
        if let Some(text) = e.help_text() {
            eprintln!("{text}");
        } else {
            eprintln!("{:?}", e);
        }
        std::process::exit(1);
    });
    init_logging(args.verbose);

    let version = args.max_version.as_deref().unwrap_or(DEFAULT_VERSION);
    let database = args
        .output
        .unwrap_or_else(|| DocsetLayout::for_version(&PathBuf::new(), version).index_path());
    let sources = args.sources.unwrap_or_else(|| {
        database
            .parent()
            .map(|dir| dir.join("Documents"))
            .unwrap_or_else(|| PathBuf::from("Documents"))
    });

    let options = IndexOptions {
        schedule: Schedule::new(args.parallel, args.batch_size),
        ..IndexOptions::new(&sources, &database)
    };

    eprintln!(
        "{} Indexing documentation: {}",
        "docset-index".green().bold(),
        sources.display()
    );
    eprintln!("  Database: {}", database.display());
    if let Schedule::Parallel { batch_size } = options.schedule {
        eprintln!("  {} batches of {batch_size} files", "Parallel:".yellow());
    }
    eprintln!();

    let start = Instant::now();
    let summary = Indexer::new(options).run()?;
    let elapsed = start.elapsed();
    let totals = summary.totals();

    eprintln!("{}", "Results:".bold());
    eprintln!(
        "  {} of {} files indexed",
        totals.pages_indexed.to_string().cyan(),
        summary.files
    );
    eprintln!(
        "  {} entries inserted",
        totals.entries_inserted.to_string().green()
    );
    if totals.duplicates_ignored > 0 {
        eprintln!(
            "  {} duplicate entries ignored",
            totals.duplicates_ignored.to_string().yellow()
        );
    }

    let failures: Vec<_> = summary.failures().collect();
    for (batch, error) in &failures {
        eprintln!("  {} batch {batch}: {error}", "✗".red());
    }

    eprintln!("\n  Completed in {:.2}s", elapsed.as_secs_f64());

    if !failures.is_empty() {
        bail!(
            "{} of {} batches failed",
            failures.len(),
            summary.outcomes.len()
        );
    }
    Ok(())
}
