//! docset-clean CLI - Rewrite vendor Doxygen HTML for use inside a docset.

use anyhow::{Result, bail};
use doxygen_docset::layout::default_sources;
use doxygen_docset::report::init_logging;
use doxygen_docset::{Bundle, CleanOptions, Cleaner, DocsetLayout, Schedule};
use facet::Facet;
use facet_args as args;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::time::Instant;

/// Format the HTML documentation so that it is usable in the docset.
///
/// Pages are rewritten to link locally, online-only scripts are disabled and
/// member signatures get table-of-contents anchors.
#[derive(Debug, Facet)]
struct Args {
    /// Directory holding the vendor documentation
    /// (defaults to resources/<version>/cpp_ref)
    #[facet(args::named, args::short = 's', default)]
    sources: Option<PathBuf>,

    /// Directory the formatted documentation is written to; it is deleted first
    /// (defaults to max-<version>-cpp.docset/Contents/Resources/Documents)
    #[facet(args::named, args::short = 'o', default)]
    output: Option<PathBuf>,

    /// 3ds Max version of the docset to generate
    #[facet(args::named, args::short = 'm')]
    max_version: String,

    /// Process files in parallel batches
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

    let version = args.max_version;
    let sources = args
        .sources
        .unwrap_or_else(|| default_sources(&PathBuf::new(), &version));
    let output = args
        .output
        .unwrap_or_else(|| DocsetLayout::for_version(&PathBuf::new(), &version).documents_dir());

    let options = CleanOptions {
        schedule: Schedule::new(args.parallel, args.batch_size),
        bundle: Some(Bundle::for_version(&version)),
        ..CleanOptions::new(&sources, &output)
    };

    eprintln!(
        "{} Formatting documentation: {}",
        "docset-clean".green().bold(),
        sources.display()
    );
    eprintln!("  Output: {}", output.display());
    if let Schedule::Parallel { batch_size } = options.schedule {
        eprintln!("  {} batches of {batch_size} files", "Parallel:".yellow());
    }
    eprintln!();

    let start = Instant::now();
    let summary = Cleaner::new(options).run()?;
    let elapsed = start.elapsed();
    let totals = summary.totals();

    eprintln!("{}", "Results:".bold());
    eprintln!(
        "  {} HTML pages rewritten",
        totals.pages_rewritten.to_string().cyan()
    );
    eprintln!(
        "  {} files and {} directories copied",
        totals.files_copied.to_string().cyan(),
        totals.dirs_copied.to_string().cyan()
    );
    eprintln!(
        "  {} style and script assets copied",
        summary.assets_copied.to_string().cyan()
    );
    eprintln!(
        "  {} TOC anchors inserted",
        totals.anchors_inserted.to_string().green()
    );
    eprintln!(
        "  {} scripts disabled",
        totals.scripts_blocked.to_string().green()
    );
    if totals.members_skipped > 0 {
        eprintln!(
            "  {} members skipped (malformed signature)",
            totals.members_skipped.to_string().yellow()
        );
    }
    if let Some(plist) = &summary.info_plist {
        eprintln!("  {} Info.plist written: {}", "✓".green(), plist.display());
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
