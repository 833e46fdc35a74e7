use std::ops::Range;

use log::warn;

use crate::error::{Result, WorkerErr};

/// A contiguous range of dataset rows, `high` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkRange {
    pub low: usize,
    pub high: usize,
}

impl WorkRange {
    pub fn new(low: usize, high: usize) -> Self {
        Self { low, high }
    }

    pub fn len(&self) -> usize {
        self.high - self.low
    }

    pub fn is_empty(&self) -> bool {
        self.high == self.low
    }

    pub fn rows(&self) -> Range<usize> {
        self.low..self.high
    }
}

/// Splits `rows` into ordered, disjoint and contiguous ranges.
///
/// The sizes of the ranges differ by at most one, the leading ranges carry the remainder.
/// If there are more workers than rows, every row gets a range of its own.
///
/// # Errors
/// `WorkerErr::NoRows` or `WorkerErr::NoWorkers` if either is zero.
pub fn partition(rows: usize, workers: usize) -> Result<Vec<WorkRange>> {
    if rows == 0 {
        return Err(WorkerErr::NoRows);
    }

    if workers == 0 {
        return Err(WorkerErr::NoWorkers);
    }

    if workers > rows {
        warn!(rows = rows, workers = workers; "more workers than rows, collapsing to one row each");
    }

    let workers = workers.min(rows);
    let base = rows / workers;
    let extra = rows % workers;

    let mut low = 0;
    let ranges = (0..workers)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let range = WorkRange::new(low, low + len);
            low += len;
            range
        })
        .collect();

    Ok(ranges)
}
