//! Reference workloads with triangular and irregular per-iteration cost.

pub mod buffer;
pub mod cosine;
pub mod logsum;

use affinity_core::KernelKind;

pub use buffer::RowBuffer;
pub use cosine::TriangularCosine;
pub use logsum::IrregularLogSum;

use crate::scheduler::Kernel;

/// Build the kernel for `kind` over an iteration space of `n` rows.
pub fn build_kernel(kind: KernelKind, n: usize) -> Box<dyn Kernel> {
    match kind {
        KernelKind::Cosine => Box::new(TriangularCosine::new(n)),
        KernelKind::Logsum => Box::new(IrregularLogSum::new(n)),
    }
}
