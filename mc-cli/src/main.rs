//! Command-line front end for the Monte Carlo eigenvalue driver.
//!
//! Wires [`config`] (CLI flags + config file), [`init`] (initial source
//! bank), [`io`] (persisted files) and [`console`] (status reporting)
//! together around `mc_core::driver::run_eigenvalue`.

mod config;
mod console;
mod init;
mod io;

use anyhow::{Context, Result};
use clap::Parser;
use config::{apply_cli, apply_config_file, Cli, RunConfig};
use mc_core::bank::Bank;
use mc_core::driver::{run_eigenvalue, Parameters, Reporter};
use mc_core::transport::{SingleSpeedKernel, Tally};
use std::process::ExitCode;

/// Translates [`Parameters`] gates + [`RunConfig`] file paths into actual
/// writes. Each write opens and closes its file; a failure is returned to
/// the driver immediately, so it can stop the run instead of continuing
/// past an I/O error that `main` will report anyway.
struct FileReporter<'a> {
    config: &'a RunConfig,
}

impl<'a> FileReporter<'a> {
    fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }
}

impl Reporter for FileReporter<'_> {
    fn bank(&mut self, _batch: usize, source_bank: &Bank) -> mc_core::Result<()> {
        Ok(io::write_bank(source_bank, &self.config.bank_file)?)
    }

    fn entropy(&mut self, h: f64) -> mc_core::Result<()> {
        Ok(io::write_scalar(h, &self.config.entropy_file)?)
    }

    fn msd(&mut self, msd: f64) -> mc_core::Result<()> {
        Ok(io::write_scalar(msd, &self.config.msd_file)?)
    }

    fn source_distribution(&mut self, source_bank: &Bank) -> mc_core::Result<()> {
        Ok(io::write_source(
            source_bank,
            &self.config.geometry(),
            self.config.bins,
            &self.config.source_file,
        )?)
    }

    fn tally(&mut self, tally: &Tally) -> mc_core::Result<()> {
        Ok(io::write_tally(tally, &self.config.tally_file)?)
    }

    fn batch_status(&mut self, batch: usize, h: f64, keff_batch: f64, active: Option<(f64, f64)>) {
        console::print_batch_status(batch, h, keff_batch, active);
    }

    fn final_keff(&mut self, keff: &[f64]) -> mc_core::Result<()> {
        Ok(io::write_keff(keff, &self.config.keff_file)?)
    }

    fn final_source(&mut self, source_bank: &Bank) -> mc_core::Result<()> {
        Ok(io::save_source(source_bank)?)
    }
}

fn load_config() -> Result<RunConfig> {
    let cli = Cli::parse();
    let mut config = RunConfig::default();

    if let Some(path) = &cli.config {
        apply_config_file(&mut config, path)?;
    }
    apply_cli(&mut config, &cli);
    config.fill_default_file_paths();
    config.validate()?;
    Ok(config)
}

fn run(config: &RunConfig) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .context("unable to start the transport thread pool")?;

    let geometry = config.geometry();
    let material = config.material();

    let source_bank = if config.load_source {
        io::load_source(config.particles)?
    } else {
        init::uniform_source_bank(config.particles, &geometry, config.seed)
    };

    let params = Parameters {
        n_particles: config.particles,
        n_batches: config.batches,
        n_generations: config.generations,
        n_active: config.active,
        seed: config.seed,
        tally: config.tally,
        write_bank: config.write_bank,
        write_entropy: config.write_entropy,
        write_msd: config.write_msd,
        write_source: config.write_source,
        write_tally: config.write_tally,
        write_keff: config.write_keff,
        save_source: config.save_source,
    };

    console::print_run_summary(config);

    let mut reporter = FileReporter::new(config);
    pool.install(|| {
        run_eigenvalue(
            &params,
            &geometry,
            &material,
            &SingleSpeedKernel,
            source_bank,
            config.bins,
            &mut reporter,
        )
    })
    .map(|_| ())
    .map_err(anyhow::Error::from)
}

fn main() -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            console::print_error(&format!("{e:#}"));
            return ExitCode::FAILURE;
        }
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            console::print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
