use crate::scheduler::{Chunk, Kernel, ScheduleError};

use super::buffer::RowBuffer;

/// Irregular triangular log-weighted summation.
///
/// Row `i` sums over `j < jmax[i]` and `k < j`. `jmax[i]` is `n` for a sparse,
/// thinning set of rows and `1` everywhere else, so the cost is concentrated
/// in a few rows near the start of the space.
pub struct IrregularLogSum {
    n: usize,
    jmax: Vec<usize>,
    /// Read-only input, row-major `n x n`.
    b: Vec<f64>,
    c: RowBuffer,
}

impl IrregularLogSum {
    pub fn new(n: usize) -> Self {
        let jmax = (0..n)
            .map(|i| if i % (3 * (i / 30) + 1) == 0 { n } else { 1 })
            .collect();

        let denom = (n * n) as f64;
        let mut b = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                b.push((i * j + 1) as f64 / denom);
            }
        }

        Self { n, jmax, b, c: RowBuffer::zeroed(n, 1) }
    }

    /// Inner trip bound for row `i`.
    pub fn jmax(&self, i: usize) -> usize {
        self.jmax[i]
    }
}

impl Kernel for IrregularLogSum {
    fn name(&self) -> &str {
        "logsum"
    }

    fn iterations(&self) -> usize {
        self.n
    }

    fn execute(&self, chunk: Chunk) -> Result<(), ScheduleError> {
        if chunk.upper > self.n {
            return Err(ScheduleError::KernelFailed(format!(
                "chunk {} exceeds {} rows",
                chunk, self.n
            )));
        }
        let n = self.n;
        let rn2 = 1.0 / (n * n) as f64;
        for i in chunk.range() {
            let b_row = &self.b[i * n..(i + 1) * n];
            let jmax = self.jmax[i];
            self.c.with_row(i, |c| {
                for (j, b) in b_row.iter().enumerate().take(jmax) {
                    let log_b = b.ln();
                    for k in 0..j {
                        c[0] += (k + 1) as f64 * log_b * rn2;
                    }
                }
            })?;
        }
        Ok(())
    }

    fn output(&self) -> &RowBuffer {
        &self.c
    }
}
