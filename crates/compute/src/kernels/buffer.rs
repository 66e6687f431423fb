use std::sync::{Mutex, MutexGuard};

use crate::scheduler::ScheduleError;

/// Output storage shared by concurrently running kernel chunks.
///
/// Each row sits behind its own mutex. Schedulers hand out disjoint chunks,
/// so a row is only ever touched by one worker per pass and the locks are
/// never contended.
#[derive(Debug)]
pub struct RowBuffer {
    rows: Box<[Mutex<Vec<f64>>]>,
    width: usize,
}

impl RowBuffer {
    pub fn zeroed(rows: usize, width: usize) -> Self {
        Self {
            rows: (0..rows).map(|_| Mutex::new(vec![0.0; width])).collect(),
            width,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Run `f` with exclusive access to row `row`.
    pub fn with_row<R, F>(&self, row: usize, f: F) -> Result<R, ScheduleError>
    where
        F: FnOnce(&mut [f64]) -> R,
    {
        let mut guard = self.lock(row)?;
        Ok(f(&mut guard))
    }

    pub fn fill(&self, value: f64) -> Result<(), ScheduleError> {
        for row in 0..self.rows() {
            self.lock(row)?.fill(value);
        }
        Ok(())
    }

    /// Sum of every entry, accumulated in row-major order.
    pub fn sum(&self) -> Result<f64, ScheduleError> {
        let mut total = 0.0;
        for row in 0..self.rows() {
            total += self.lock(row)?.iter().sum::<f64>();
        }
        Ok(total)
    }

    /// Copy of row `row`.
    pub fn row(&self, row: usize) -> Result<Vec<f64>, ScheduleError> {
        Ok(self.lock(row)?.clone())
    }

    fn lock(&self, row: usize) -> Result<MutexGuard<'_, Vec<f64>>, ScheduleError> {
        let cell = self.rows.get(row).ok_or_else(|| {
            let rows = self.rows.len();
            ScheduleError::KernelFailed(format!("row {} out of range ({} rows)", row, rows))
        })?;
        cell.lock()
            .map_err(|e| ScheduleError::LockPoisoned(format!("RowBuffer row {}: {}", row, e)))
    }
}
