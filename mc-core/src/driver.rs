//! The eigenvalue driver (C8): the batch/generation/particle loop nest
//! that orchestrates every other component in this crate.

use crate::bank::Bank;
use crate::diagnostics::{mean_squared_distance, shannon_entropy};
use crate::error::Result;
use crate::geometry::Geometry;
use crate::keff::mean_and_std;
use crate::material::Material;
use crate::merge::merge_fission_banks;
use crate::rng::{Rng, Stream};
use crate::sync::synchronize_bank;
use crate::transport::{Tally, TransportKernel};
use rayon::prelude::*;

/// The parameters the driver itself needs: population and loop sizes, the
/// RNG seed, and which of the optional per-generation/per-batch products
/// to compute at all. Whether (and where) a product is *written* is a
/// concern of the caller, surfaced through [`Reporter`].
#[derive(Clone, Debug)]
pub struct Parameters {
    /// Number of source particles, `N`. Fixed for the whole run.
    pub n_particles: usize,
    /// Number of batches.
    pub n_batches: usize,
    /// Generations per batch.
    pub n_generations: usize,
    /// Number of trailing batches whose k_eff contributes to statistics.
    pub n_active: usize,
    /// Initial RNG seed.
    pub seed: u64,
    /// Whether to accumulate the flux tally during active batches.
    pub tally: bool,
    /// Whether to report the source bank at the top of every batch.
    pub write_bank: bool,
    /// Whether to report Shannon entropy every generation.
    pub write_entropy: bool,
    /// Whether to report mean-squared distance every generation.
    pub write_msd: bool,
    /// Whether to report the source density grid every generation.
    pub write_source: bool,
    /// Whether to report the flux tally at the end of an active batch.
    pub write_tally: bool,
    /// Whether to report the final k_eff vector after the run.
    pub write_keff: bool,
    /// Whether to report the final source bank after the run.
    pub save_source: bool,
}

/// Callbacks the driver invokes for every optional product. A no-op
/// default is provided for each so implementers only override what they
/// need; `mc-cli` implements this to perform the actual file writes.
///
/// Every product-writing method returns a [`Result`] so a failure (an I/O
/// error, most often) stops the run at the point it happened instead of
/// being discovered only after the rest of the batch/generation loop has
/// already run to completion.
pub trait Reporter {
    /// Called once per batch with the source bank as it stood before that
    /// batch's generations ran, when [`Parameters::write_bank`] is set.
    fn bank(&mut self, _batch: usize, _source_bank: &Bank) -> Result<()> {
        Ok(())
    }
    /// Called once per generation with the Shannon entropy of the new
    /// source bank, when [`Parameters::write_entropy`] is set.
    fn entropy(&mut self, _h: f64) -> Result<()> {
        Ok(())
    }
    /// Called once per generation with the mean-squared distance of the
    /// new source bank, when [`Parameters::write_msd`] is set.
    fn msd(&mut self, _msd: f64) -> Result<()> {
        Ok(())
    }
    /// Called once per generation with the new source bank, when
    /// [`Parameters::write_source`] is set.
    fn source_distribution(&mut self, _source_bank: &Bank) -> Result<()> {
        Ok(())
    }
    /// Called once per active batch with the accumulated tally, before it
    /// is zeroed, when [`Parameters::write_tally`] is set.
    fn tally(&mut self, _tally: &Tally) -> Result<()> {
        Ok(())
    }
    /// Called once per batch with the console status line's ingredients.
    fn batch_status(&mut self, batch: usize, h: f64, keff_batch: f64, active: Option<(f64, f64)>);
    /// Called once at the end of the run with the active-batch k_eff
    /// vector, when [`Parameters::write_keff`] is set.
    fn final_keff(&mut self, _keff: &[f64]) -> Result<()> {
        Ok(())
    }
    /// Called once at the end of the run with the final source bank, when
    /// [`Parameters::save_source`] is set.
    fn final_source(&mut self, _source_bank: &Bank) -> Result<()> {
        Ok(())
    }
}

/// Splits `[0, n)` into `workers` contiguous, nearly-equal chunks (the last
/// chunks absorb the remainder), mirroring the static schedule an
/// OpenMP `parallel for` would use. Every chunk's particles are processed
/// in ascending index order, so determinism within a chunk never depends
/// on how many chunks there are.
fn chunk_ranges(n: usize, workers: usize) -> Vec<(usize, usize)> {
    let workers = workers.max(1);
    let base = n / workers;
    let rem = n % workers;
    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for w in 0..workers {
        let len = base + usize::from(w < rem);
        let end = start + len;
        if len > 0 {
            ranges.push((start, end));
        }
        start = end;
    }
    ranges
}

/// Runs the data-parallel transport sweep for one generation and merges
/// the resulting per-worker fission banks.
///
/// Each worker processes a contiguous range of particle indices. For
/// particle `i_p`, the RNG is seeded by skipping
/// `draw_base + i_p` draws of the `Track` stream from the initial `seed` —
/// a pure function of `(seed, draw_base, i_p)`, never of which worker (or
/// how many workers) actually executes the iteration.
#[allow(clippy::too_many_arguments)]
fn transport_generation(
    source_bank: &Bank,
    geometry: &Geometry,
    material: &Material,
    kernel: &dyn TransportKernel,
    seed: u64,
    draw_base: u64,
    tally_bins: usize,
    tallies_on: bool,
) -> (Bank, Vec<f64>) {
    let num_workers = rayon::current_num_threads();
    let ranges = chunk_ranges(source_bank.len(), num_workers);

    let results: Vec<(Bank, Vec<f64>)> = ranges
        .par_iter()
        .map(|&(start, end)| {
            let mut local_fission = Bank::new((end - start) / 2 + 1);
            let mut local_tally = Tally::new(tally_bins);
            local_tally.tallies_on = tallies_on;

            for i_p in start..end {
                let mut rng = Rng::new(seed);
                rng.stream(Stream::Track);
                rng.skip(draw_base + i_p as u64);

                let mut p = source_bank[i_p];
                kernel.transport(geometry, material, &mut local_tally, &mut local_fission, &mut rng, &mut p);
            }

            (local_fission, local_tally.flux().to_vec())
        })
        .collect();

    let mut worker_banks: Vec<Bank> = Vec::with_capacity(results.len());
    let mut flux = vec![0.0; tally_bins * tally_bins];
    for (bank, worker_flux) in results {
        for (total, local) in flux.iter_mut().zip(&worker_flux) {
            *total += local;
        }
        worker_banks.push(bank);
    }

    merge_fission_banks(&mut worker_banks);
    let fission_bank = worker_banks.into_iter().next().unwrap_or_else(|| Bank::new(0));
    (fission_bank, flux)
}

/// Runs `params.n_batches` batches of `params.n_generations` generations
/// each, tallies k_eff on the last `params.n_active` batches, and returns
/// them in order.
#[allow(clippy::too_many_arguments)]
pub fn run_eigenvalue(
    params: &Parameters,
    geometry: &Geometry,
    material: &Material,
    kernel: &dyn TransportKernel,
    mut source_bank: Bank,
    tally_bins: usize,
    reporter: &mut dyn Reporter,
) -> Result<Vec<f64>> {
    let mut keff = vec![0.0; params.n_active];
    let mut i_a: Option<usize> = None;
    let mut tally = Tally::new(tally_bins);
    let mut other_rng = Rng::new(params.seed);

    for i_b in 0..params.n_batches {
        let mut keff_batch = 0.0;

        if params.write_bank {
            reporter.bank(i_b, &source_bank)?;
        }

        if i_b >= params.n_batches - params.n_active {
            i_a = Some(i_a.map_or(0, |i| i + 1));
            tally.tallies_on = params.tally;
        }

        for i_g in 0..params.n_generations {
            let draw_base = ((i_b * params.n_generations + i_g) * params.n_particles) as u64;

            let (mut fission_bank, flux) = transport_generation(
                &source_bank,
                geometry,
                material,
                kernel,
                params.seed,
                draw_base,
                tally_bins,
                tally.tallies_on,
            );
            tally.accumulate(&flux);

            let keff_gen = fission_bank.len() as f64 / source_bank.len() as f64;
            keff_batch += keff_gen;

            other_rng.stream(Stream::Other);
            source_bank = synchronize_bank(&mut fission_bank, params.n_particles, &mut other_rng)?;

            let h = shannon_entropy(geometry, &source_bank);
            if params.write_entropy {
                reporter.entropy(h)?;
            }
            if params.write_msd {
                reporter.msd(mean_squared_distance(&source_bank))?;
            }
            if params.write_source {
                reporter.source_distribution(&source_bank)?;
            }
        }

        keff_batch /= params.n_generations as f64;
        if let Some(i) = i_a {
            keff[i] = keff_batch;
        }

        if tally.tallies_on {
            if params.write_tally {
                reporter.tally(&tally)?;
            }
            tally.zero();
        }

        let active_stats = i_a.map(|i| mean_and_std(&keff[..=i]));
        let h = shannon_entropy(geometry, &source_bank);
        reporter.batch_status(i_b, h, keff_batch, active_stats);
    }

    if params.write_keff {
        reporter.final_keff(&keff)?;
    }
    if params.save_source {
        reporter.final_source(&source_bank)?;
    }

    Ok(keff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundaryCondition;
    use crate::particle::Particle;

    struct NullReporter;
    impl Reporter for NullReporter {
        fn batch_status(&mut self, _batch: usize, _h: f64, _keff_batch: f64, _active: Option<(f64, f64)>) {}
    }

    /// Copies every particle straight into the fission bank: a pass-through
    /// kernel used to test the driver's loop structure in isolation from
    /// any physics model.
    struct IdentityKernel;
    impl TransportKernel for IdentityKernel {
        fn transport(
            &self,
            _geometry: &Geometry,
            _material: &Material,
            _tally: &mut Tally,
            fission_bank: &mut Bank,
            _rng: &mut Rng,
            p: &mut Particle,
        ) {
            fission_bank.append(*p);
            p.alive = false;
        }
    }

    /// Never produces offspring: drives the fission bank to extinction.
    struct AbsorberKernel;
    impl TransportKernel for AbsorberKernel {
        fn transport(
            &self,
            _geometry: &Geometry,
            _material: &Material,
            _tally: &mut Tally,
            _fission_bank: &mut Bank,
            _rng: &mut Rng,
            p: &mut Particle,
        ) {
            p.alive = false;
        }
    }

    fn source_bank_of(n: usize) -> Bank {
        let mut bank = Bank::new(n);
        for i in 0..n {
            bank.append(Particle::new(i as f64 * 0.1, 0.0, 0.0, 1.0, 0.0, 0.0));
        }
        bank
    }

    #[test]
    fn trivial_pass_through_gives_keff_one() {
        let params = Parameters {
            n_particles: 4,
            n_batches: 1,
            n_generations: 1,
            n_active: 1,
            seed: 1,
            tally: false,
            write_bank: false,
            write_entropy: false,
            write_msd: false,
            write_source: false,
            write_tally: false,
            write_keff: false,
            save_source: false,
        };
        let geometry = Geometry::new(1.0, 1.0, 1.0, BoundaryCondition::Vacuum);
        let material = Material {
            nu: 0.0,
            xs_f: 0.0,
            xs_a: 0.0,
            xs_s: 0.0,
        };
        let mut reporter = NullReporter;

        let keff = run_eigenvalue(
            &params,
            &geometry,
            &material,
            &IdentityKernel,
            source_bank_of(4),
            1,
            &mut reporter,
        )
        .unwrap();

        assert_eq!(keff, vec![1.0]);
    }

    #[test]
    fn extinction_is_a_fatal_error() {
        let params = Parameters {
            n_particles: 4,
            n_batches: 1,
            n_generations: 1,
            n_active: 1,
            seed: 1,
            tally: false,
            write_bank: false,
            write_entropy: false,
            write_msd: false,
            write_source: false,
            write_tally: false,
            write_keff: false,
            save_source: false,
        };
        let geometry = Geometry::new(1.0, 1.0, 1.0, BoundaryCondition::Vacuum);
        let material = Material {
            nu: 0.0,
            xs_f: 0.0,
            xs_a: 1.0,
            xs_s: 0.0,
        };
        let mut reporter = NullReporter;

        let result = run_eigenvalue(
            &params,
            &geometry,
            &material,
            &AbsorberKernel,
            source_bank_of(4),
            1,
            &mut reporter,
        );

        assert!(result.is_err());
    }

    #[test]
    fn population_is_conserved_across_generations() {
        let params = Parameters {
            n_particles: 8,
            n_batches: 2,
            n_generations: 3,
            n_active: 1,
            seed: 42,
            tally: false,
            write_bank: false,
            write_entropy: false,
            write_msd: false,
            write_source: false,
            write_tally: false,
            write_keff: false,
            save_source: false,
        };
        let geometry = Geometry::new(1.0, 1.0, 1.0, BoundaryCondition::Reflective);
        let material = Material {
            nu: 2.0,
            xs_f: 0.3,
            xs_a: 0.2,
            xs_s: 0.5,
        };
        let mut reporter = NullReporter;

        let keff = run_eigenvalue(
            &params,
            &geometry,
            &material,
            &crate::transport::SingleSpeedKernel,
            source_bank_of(8),
            1,
            &mut reporter,
        )
        .unwrap();

        assert_eq!(keff.len(), 1);
        assert!(keff[0] > 0.0);
    }

    #[test]
    fn chunking_splits_evenly_and_covers_the_whole_range() {
        let ranges = chunk_ranges(10, 3);
        let total: usize = ranges.iter().map(|&(s, e)| e - s).sum();
        assert_eq!(total, 10);
        assert_eq!(ranges.first().unwrap().0, 0);
        assert_eq!(ranges.last().unwrap().1, 10);
    }
}
