use crate::scheduler::{Chunk, Kernel, ScheduleError};

use super::buffer::RowBuffer;

/// Triangular cosine accumulation.
///
/// Row `i` adds `cos(b[i][j])` into `a[i][j]` for every column `j > i`, so
/// early rows are far more expensive than late ones.
pub struct TriangularCosine {
    n: usize,
    /// Read-only input, row-major `n x n`.
    b: Vec<f64>,
    a: RowBuffer,
}

impl TriangularCosine {
    pub fn new(n: usize) -> Self {
        let mut b = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                b.push(3.142 * (i + j) as f64);
            }
        }
        Self { n, b, a: RowBuffer::zeroed(n, n) }
    }
}

impl Kernel for TriangularCosine {
    fn name(&self) -> &str {
        "cosine"
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
        for i in chunk.range() {
            let b_row = &self.b[i * n..(i + 1) * n];
            self.a.with_row(i, |a_row| {
                for j in (i + 1..n).rev() {
                    a_row[j] += b_row[j].cos();
                }
            })?;
        }
        Ok(())
    }

    fn output(&self) -> &RowBuffer {
        &self.a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_upper_triangle_is_written() {
        let k = TriangularCosine::new(4);
        k.execute(Chunk::new(0, 4)).unwrap();

        for i in 0..4 {
            let row = k.output().row(i).unwrap();
            for (j, v) in row.iter().enumerate() {
                if j > i {
                    let expected = (3.142 * (i + j) as f64).cos();
                    assert!((v - expected).abs() < 1e-12, "a[{i}][{j}] = {v}");
                } else {
                    assert_eq!(*v, 0.0, "a[{i}][{j}] should be untouched");
                }
            }
        }
    }

    #[test]
    fn repeated_passes_accumulate() {
        let k = TriangularCosine::new(3);
        k.execute(Chunk::new(0, 3)).unwrap();
        let once = k.output().sum().unwrap();
        k.execute(Chunk::new(0, 3)).unwrap();
        let twice = k.output().sum().unwrap();
        assert!((twice - 2.0 * once).abs() < 1e-12);
    }

    #[test]
    fn chunks_touch_only_their_rows() {
        let k = TriangularCosine::new(5);
        k.execute(Chunk::new(1, 2)).unwrap();
        assert!(k.output().row(0).unwrap().iter().all(|v| *v == 0.0));
        assert!(k.output().row(1).unwrap().iter().any(|v| *v != 0.0));
        assert!(k.output().row(2).unwrap().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn reset_clears_output() {
        let k = TriangularCosine::new(3);
        k.execute(Chunk::new(0, 3)).unwrap();
        k.reset().unwrap();
        assert_eq!(k.output().sum().unwrap(), 0.0);
    }

    #[test]
    fn out_of_range_chunk_fails() {
        let k = TriangularCosine::new(3);
        assert!(matches!(k.execute(Chunk::new(2, 4)), Err(ScheduleError::KernelFailed(_))));
    }
}
