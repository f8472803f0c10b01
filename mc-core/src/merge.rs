//! The fission-bank merger (C5): concatenates per-worker fission banks
//! into a single, deterministic master bank.
//!
//! The merge is two ordered reductions over the worker index — never an
//! atomic append — so the result is a pure function of each worker's local
//! bank and the worker indexing, not of thread scheduling.

use crate::bank::Bank;

/// Concatenates `worker_banks` in worker-index order into worker 0's bank,
/// leaving all other workers empty. Mirrors `merge_fission_banks`:
/// worker 0 is resized to hold the total before the copy, then every
/// worker's particles are placed at a running offset in index order.
pub fn merge_fission_banks(worker_banks: &mut [Bank]) {
    let n_total: usize = worker_banks.iter().map(Bank::len).sum();

    let mut master: Vec<_> = Vec::with_capacity(n_total);
    for bank in worker_banks.iter() {
        master.extend_from_slice(bank.particles());
    }
    debug_assert_eq!(master.len(), n_total);

    if let Some((first, rest)) = worker_banks.split_first_mut() {
        first.copy_from_slice(&master);
        for bank in rest {
            bank.clear();
        }
    }
}
