//! Post-pass checksums used to compare scheduling strategies.

use serde::Serialize;

use crate::scheduler::{Kernel, ScheduleError};

/// Agreement required between a strategy and the static block reference.
pub const REFERENCE_DIGITS: u32 = 6;

/// Sum of a kernel's output after a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Checksum {
    pub kernel: String,
    pub value: f64,
}

impl Checksum {
    /// Whether `self` and `other` agree to `digits` significant digits.
    pub fn agrees_with(&self, other: &Checksum, digits: u32) -> bool {
        let scale = self.value.abs().max(other.value.abs());
        if scale == 0.0 {
            return true;
        }
        let tolerance = scale * 10f64.powi(-(digits as i32));
        (self.value - other.value).abs() <= tolerance
    }

    /// Fail with [`ScheduleError::ChecksumMismatch`] unless `self` matches `reference`.
    pub fn verify_against(&self, reference: &Checksum, digits: u32) -> Result<(), ScheduleError> {
        if self.agrees_with(reference, digits) {
            Ok(())
        } else {
            Err(ScheduleError::ChecksumMismatch {
                kernel: self.kernel.clone(),
                expected: reference.value,
                actual: self.value,
            })
        }
    }
}

/// Sum every output entry of `kernel` in row order.
///
/// Independent of which worker ran which chunk: each entry's value depends
/// only on how many passes covered its row.
pub fn checksum(kernel: &dyn Kernel) -> Result<Checksum, ScheduleError> {
    Ok(Checksum {
        kernel: kernel.name().to_string(),
        value: kernel.output().sum()?,
    })
}
