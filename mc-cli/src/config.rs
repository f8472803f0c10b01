//! Run configuration: built-in defaults, `key=value` config-file parsing,
//! CLI-flag overrides, and input validation.
//!
//! Layering order is: defaults first, then an optional config file, then
//! command-line flags, which win on conflict.

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use mc_core::geometry::BoundaryCondition;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

/// Every run parameter in one place: the single source of truth the driver,
/// console, and file writers all read from.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub particles: usize,
    pub batches: usize,
    pub active: usize,
    pub generations: usize,
    pub nuclides: usize,
    pub tally: bool,
    pub bins: usize,
    pub seed: u64,
    pub nu: f64,
    pub xs_f: f64,
    pub xs_a: f64,
    pub xs_s: f64,
    pub x: f64,
    pub y: f64,
    pub bc: BoundaryCondition,
    pub load_source: bool,
    pub save_source: bool,
    pub write_tally: bool,
    pub write_entropy: bool,
    pub write_keff: bool,
    pub write_bank: bool,
    pub write_source: bool,
    pub write_msd: bool,
    pub tally_file: PathBuf,
    pub entropy_file: PathBuf,
    pub keff_file: PathBuf,
    pub bank_file: PathBuf,
    pub source_file: PathBuf,
    pub msd_file: PathBuf,
    pub threads: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            particles: 1000,
            batches: 20,
            active: 10,
            generations: 1,
            nuclides: 1,
            tally: false,
            bins: 10,
            seed: 1,
            nu: 2.5,
            xs_f: 0.012,
            xs_a: 0.02,
            xs_s: 0.34,
            x: 100.0,
            y: 100.0,
            bc: BoundaryCondition::Reflective,
            load_source: false,
            save_source: false,
            write_tally: false,
            write_entropy: false,
            write_keff: false,
            write_bank: false,
            write_source: false,
            write_msd: false,
            tally_file: PathBuf::new(),
            entropy_file: PathBuf::new(),
            keff_file: PathBuf::new(),
            bank_file: PathBuf::new(),
            source_file: PathBuf::new(),
            msd_file: PathBuf::new(),
            threads: thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

impl RunConfig {
    /// Builds the box geometry this config describes. The CLI only exposes
    /// `x` and `y`; the 3-D extent `z` needed by the entropy grid reuses
    /// `y`, so the box is a square prism rather than inventing an
    /// unconfigurable third dimension.
    #[must_use]
    pub fn geometry(&self) -> mc_core::geometry::Geometry {
        mc_core::geometry::Geometry::new(self.x, self.y, self.y, self.bc)
    }

    #[must_use]
    pub fn material(&self) -> mc_core::material::Material {
        mc_core::material::Material {
            nu: self.nu,
            xs_f: self.xs_f,
            xs_a: self.xs_a,
            xs_s: self.xs_s,
        }
    }

    /// Fills in default `*.dat` file names for any writer that is enabled
    /// but was never given an explicit path. Must run after every layer
    /// (config file, then CLI flags) has been applied.
    pub fn fill_default_file_paths(&mut self) {
        let mut fill = |enabled: bool, path: &mut PathBuf, default: &str| {
            if enabled && path.as_os_str().is_empty() {
                *path = PathBuf::from(default);
            }
        };
        fill(self.write_tally, &mut self.tally_file, "tally.dat");
        fill(self.write_entropy, &mut self.entropy_file, "entropy.dat");
        fill(self.write_keff, &mut self.keff_file, "keff.dat");
        fill(self.write_bank, &mut self.bank_file, "bank.dat");
        fill(self.write_source, &mut self.source_file, "source.dat");
        fill(self.write_msd, &mut self.msd_file, "msd.dat");
    }

    /// Validates numeric and combination invariants. A negative
    /// `particles`/`batches`/`generations`/`bins` value needs no explicit
    /// check: all four are `usize`, so it is unrepresentable rather than
    /// merely rejected at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.particles < 1 {
            bail!("Number of particles must be greater than 0");
        }
        if self.batches < 1 && self.generations < 1 {
            bail!("Must have at least one batch or one generation");
        }
        if self.active > self.batches {
            bail!("Number of active batches cannot be greater than number of batches");
        }
        if self.nu < 0.0 {
            bail!("Average number of fission neutrons produced cannot be negative");
        }
        if self.x <= 0.0 || self.y <= 0.0 {
            bail!("Length of domain must be positive in x and y dimension");
        }
        if self.xs_f < 0.0 || self.xs_a < 0.0 || self.xs_s < 0.0 {
            bail!("Macroscopic cross section values cannot be negative");
        }
        Ok(())
    }
}

/// Applies every `key=value` line of a config file to `config`. `#` and
/// blank lines are comments.
pub fn apply_config_file(config: &mut RunConfig, path: &Path) -> Result<()> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("unable to open '{}'", path.display()))?;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| anyhow!("malformed config line: '{line}'"))?;
        apply_key(config, key.trim(), value.trim())
            .with_context(|| format!("in config file '{}'", path.display()))?;
    }

    Ok(())
}

fn apply_key(config: &mut RunConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "particles" => config.particles = parse_num(key, value)?,
        "batches" => config.batches = parse_num(key, value)?,
        "generations" => config.generations = parse_num(key, value)?,
        "active" => config.active = parse_num(key, value)?,
        "nuclides" => config.nuclides = parse_num(key, value)?,
        "tally" => config.tally = parse_bool(key, value)?,
        "bins" => config.bins = parse_num(key, value)?,
        "seed" => config.seed = parse_num(key, value)?,
        "nu" => config.nu = parse_num(key, value)?,
        "xs_f" => config.xs_f = parse_num(key, value)?,
        "xs_a" => config.xs_a = parse_num(key, value)?,
        "xs_s" => config.xs_s = parse_num(key, value)?,
        "x" => config.x = parse_num(key, value)?,
        "y" => config.y = parse_num(key, value)?,
        "bc" => config.bc = parse_bc(value)?,
        "load_source" => config.load_source = parse_bool(key, value)?,
        "save_source" => config.save_source = parse_bool(key, value)?,
        "write_tally" => config.write_tally = parse_bool(key, value)?,
        "write_entropy" => config.write_entropy = parse_bool(key, value)?,
        "write_keff" => config.write_keff = parse_bool(key, value)?,
        "write_bank" => config.write_bank = parse_bool(key, value)?,
        "write_source" => config.write_source = parse_bool(key, value)?,
        "write_msd" => config.write_msd = parse_bool(key, value)?,
        "tally_file" => config.tally_file = PathBuf::from(value),
        "entropy_file" => config.entropy_file = PathBuf::from(value),
        "keff_file" => config.keff_file = PathBuf::from(value),
        "bank_file" => config.bank_file = PathBuf::from(value),
        "source_file" => config.source_file = PathBuf::from(value),
        "msd_file" => config.msd_file = PathBuf::from(value),
        _ => bail!("Unknown option in config file: '{key}'"),
    }
    Ok(())
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("invalid value '{value}' for parameter '{key}'"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Invalid option for parameter '{key}': must be 'true' or 'false'"),
    }
}

fn parse_bc(value: &str) -> Result<BoundaryCondition> {
    match value.to_ascii_lowercase().as_str() {
        "vacuum" => Ok(BoundaryCondition::Vacuum),
        "reflective" => Ok(BoundaryCondition::Reflective),
        "periodic" => Ok(BoundaryCondition::Periodic),
        _ => bail!("Invalid boundary condition"),
    }
}

/// Command-line flags. Every flag is optional so the config-file/default
/// layers are only overridden where the user actually passed something.
#[derive(Parser, Debug)]
#[command(
    about = "Batch/generation/particle eigenvalue driver for a Monte Carlo neutron transport code",
    author,
    version = git_version::git_version!(args = ["--always", "--dirty", "--long", "--tags"], cargo_prefix = "", fallback = "unknown")
)]
pub struct Cli {
    /// Path to a `key=value` config file, applied before CLI flags.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub particles: Option<usize>,
    #[arg(long)]
    pub batches: Option<usize>,
    #[arg(long)]
    pub active: Option<usize>,
    #[arg(long)]
    pub generations: Option<usize>,
    #[arg(long)]
    pub nuclides: Option<usize>,
    #[arg(long)]
    pub tally: Option<bool>,
    #[arg(long)]
    pub bins: Option<usize>,
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long)]
    pub nu: Option<f64>,
    #[arg(long)]
    pub xs_f: Option<f64>,
    #[arg(long)]
    pub xs_a: Option<f64>,
    #[arg(long)]
    pub xs_s: Option<f64>,
    #[arg(long)]
    pub x: Option<f64>,
    #[arg(long)]
    pub y: Option<f64>,
    #[arg(long, value_parser = parse_bc)]
    pub bc: Option<BoundaryCondition>,
    #[arg(long)]
    pub load_source: Option<bool>,
    #[arg(long)]
    pub save_source: Option<bool>,
    #[arg(long)]
    pub write_tally: Option<bool>,
    #[arg(long)]
    pub write_entropy: Option<bool>,
    #[arg(long)]
    pub write_keff: Option<bool>,
    #[arg(long)]
    pub write_bank: Option<bool>,
    #[arg(long)]
    pub write_source: Option<bool>,
    #[arg(long)]
    pub write_msd: Option<bool>,
    #[arg(long, value_name = "FILE")]
    pub tally_file: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    pub entropy_file: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    pub keff_file: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    pub bank_file: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    pub source_file: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    pub msd_file: Option<PathBuf>,
    /// Number of worker threads for the particle transport loop.
    #[arg(long)]
    pub threads: Option<usize>,
}

/// Overrides every field of `config` that was actually set on the command
/// line. Unset (`None`) fields leave the config-file/default value intact.
pub fn apply_cli(config: &mut RunConfig, cli: &Cli) {
    macro_rules! over {
        ($field:ident) => {
            if let Some(v) = cli.$field.clone() {
                config.$field = v;
            }
        };
    }
    over!(particles);
    over!(batches);
    over!(active);
    over!(generations);
    over!(nuclides);
    over!(tally);
    over!(bins);
    over!(seed);
    over!(nu);
    over!(xs_f);
    over!(xs_a);
    over!(xs_s);
    over!(x);
    over!(y);
    over!(bc);
    over!(load_source);
    over!(save_source);
    over!(write_tally);
    over!(write_entropy);
    over!(write_keff);
    over!(write_bank);
    over!(write_source);
    over!(write_msd);
    over!(tally_file);
    over!(entropy_file);
    over!(keff_file);
    over!(bank_file);
    over!(source_file);
    over!(msd_file);
    over!(threads);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        RunConfig::default().validate().unwrap();
    }

    #[test]
    fn negative_cross_section_is_rejected() {
        let mut config = RunConfig::default();
        config.xs_a = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn active_greater_than_batches_is_rejected() {
        let mut config = RunConfig::default();
        config.active = config.batches + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_file_keys_apply_in_order() {
        let mut config = RunConfig::default();
        apply_key(&mut config, "particles", "500").unwrap();
        apply_key(&mut config, "bc", "Periodic").unwrap();
        apply_key(&mut config, "tally", "true").unwrap();
        assert_eq!(config.particles, 500);
        assert_eq!(config.bc, BoundaryCondition::Periodic);
        assert!(config.tally);
    }

    #[test]
    fn unknown_config_key_is_rejected() {
        let mut config = RunConfig::default();
        assert!(apply_key(&mut config, "not_a_real_key", "1").is_err());
    }

    #[test]
    fn default_file_paths_are_filled_only_when_enabled_and_empty() {
        let mut config = RunConfig::default();
        config.write_tally = true;
        config.fill_default_file_paths();
        assert_eq!(config.tally_file, PathBuf::from("tally.dat"));
        assert!(config.entropy_file.as_os_str().is_empty());
    }

    #[test]
    fn explicit_file_path_is_not_overwritten() {
        let mut config = RunConfig::default();
        config.write_tally = true;
        config.tally_file = PathBuf::from("custom.dat");
        config.fill_default_file_paths();
        assert_eq!(config.tally_file, PathBuf::from("custom.dat"));
    }
}
