//! Splitting file lists into batches and running them.
//!
//! Batches share nothing but the progress bar. In parallel mode each batch is
//! a rayon task; a failing batch does not affect the others, and every batch
//! reports back through a [`BatchOutcome`].

use indicatif::ProgressBar;
use rayon::prelude::*;

use crate::report::Reporter;

/// Number of files per batch unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// How a list of files is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// All files in one batch on the calling thread.
    Sequential,
    /// Contiguous batches of `batch_size` files on the rayon pool.
    Parallel { batch_size: usize },
}

impl Schedule {
    pub fn new(parallel: bool, batch_size: Option<usize>) -> Self {
        if parallel {
            Schedule::Parallel {
                batch_size: batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1),
            }
        } else {
            Schedule::Sequential
        }
    }
}

/// Result of running one batch.
#[derive(Debug)]
pub struct BatchOutcome<T, E> {
    /// Zero-based batch index, in file-list order.
    pub batch: usize,
    /// Number of files handed to the batch.
    pub files: usize,
    pub result: Result<T, E>,
}

/// Run `job` over `files` according to `schedule`.
///
/// Outcomes come back ordered by batch index regardless of completion order.
pub fn run_batches<T, E, F>(
    files: &[String],
    schedule: Schedule,
    progress: &ProgressBar,
    job: F,
) -> Vec<BatchOutcome<T, E>>
where
    T: Send,
    E: Send,
    F: Fn(&[String], &Reporter) -> Result<T, E> + Sync,
{
    let run_one = |(batch, files): (usize, &[String])| {
        let reporter = Reporter::new(batch, progress.clone());
        let result = job(files, &reporter);
        reporter.batch_done(files.len());
        BatchOutcome {
            batch,
            files: files.len(),
            result,
        }
    };

    match schedule {
        Schedule::Sequential => vec![run_one((0, files))],
        Schedule::Parallel { batch_size } => files
            .chunks(batch_size.max(1))
            .enumerate()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(run_one)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}.html")).collect()
    }

    #[test]
    fn test_batch_sizes() {
        let outcomes = run_batches(
            &names(1201),
            Schedule::Parallel { batch_size: 500 },
            &ProgressBar::hidden(),
            |f, _| Ok::<_, ()>(f.len()),
        );
        let sizes: Vec<_> = outcomes.iter().map(|o| o.files).collect();
        assert_eq!(sizes, [500, 500, 201]);

        let empty = run_batches(
            &[],
            Schedule::Parallel { batch_size: 500 },
            &ProgressBar::hidden(),
            |f, _| Ok::<_, ()>(f.len()),
        );
        assert!(empty.is_empty());
    }

    #[test]
    fn test_schedule_defaults() {
        assert_eq!(Schedule::new(false, Some(10)), Schedule::Sequential);
        assert_eq!(
            Schedule::new(true, None),
            Schedule::Parallel { batch_size: 500 }
        );
        assert_eq!(
            Schedule::new(true, Some(0)),
            Schedule::Parallel { batch_size: 1 }
        );
    }

    #[test]
    fn test_sequential_is_single_batch() {
        let files = names(7);
        let outcomes = run_batches(
            &files,
            Schedule::Sequential,
            &ProgressBar::hidden(),
            |f, _| Ok::<_, ()>(f.len()),
        );
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].files, 7);
        assert_eq!(outcomes[0].result, Ok(7));
    }

    #[test]
    fn test_parallel_outcomes_are_ordered_and_isolated() {
        let files = names(10);
        let outcomes = run_batches(
            &files,
            Schedule::Parallel { batch_size: 3 },
            &ProgressBar::hidden(),
            |f, reporter| {
                if reporter.batch() == 1 {
                    Err(format!("batch {} failed", reporter.batch()))
                } else {
                    Ok(f.first().cloned())
                }
            },
        );

        let batches: Vec<_> = outcomes.iter().map(|o| o.batch).collect();
        assert_eq!(batches, [0, 1, 2, 3]);
        assert_eq!(outcomes[0].result, Ok(Some("f0.html".to_string())));
        assert!(outcomes[1].result.is_err());
        assert_eq!(outcomes[2].result, Ok(Some("f6.html".to_string())));
        assert_eq!(outcomes[3].files, 1);
    }
}
