//! The bank synchronizer (C4): collapses the fission bank back down (or
//! up) to the source-bank size.
//!
//! Draws come from a single stream ([`Stream::Other`]) in a fixed order,
//! so the result is reproducible given the same fission-bank content,
//! independent of worker count.

use crate::bank::Bank;
use crate::error::{Error, Result};
use crate::rng::{Rng, Stream};

/// Resamples `fission_bank` (length `n_f`) into a new bank of exactly
/// `n_s` particles, leaving `fission_bank` empty.
///
/// * `n_f >= n_s`: reservoir sampling without replacement (case A).
/// * `n_f < n_s`: the fission bank is used in full, and the deficit is
///   filled by sampling with replacement from it (case B).
/// * `n_f == 0` is population extinction, a fatal error.
pub fn synchronize_bank(fission_bank: &mut Bank, n_s: usize, rng: &mut Rng) -> Result<Bank> {
    let n_f = fission_bank.len();
    if n_f == 0 {
        return Err(Error::General(
            "fission bank is empty: population extinct".to_string(),
        ));
    }

    rng.stream(Stream::Other);
    let mut source_bank = Bank::new(n_s);

    if n_f >= n_s {
        source_bank.copy_from_slice(&fission_bank.particles()[..n_s]);
        for i in n_s..n_f {
            let j = rng.rni(0, (i + 1) as u64) as usize;
            if j < n_s {
                source_bank[j] = fission_bank[i];
            }
        }
    } else {
        for k in 0..(n_s - n_f) {
            let j = rng.rni(0, n_f as u64) as usize;
            source_bank.append(fission_bank[j]);
        }
        for i in 0..n_f {
            source_bank.append(fission_bank[i]);
        }
    }

    fission_bank.clear();
    Ok(source_bank)
}
