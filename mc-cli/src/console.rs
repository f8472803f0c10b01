//! Console reporting: the "INPUT SUMMARY" banner and per-batch status
//! lines, formatted as a plain bordered `printf`-style banner rather than
//! a rendered table.

use crate::config::RunConfig;
use mc_core::geometry::BoundaryCondition;

const BORDER_WIDTH: usize = 90;

fn border() -> String {
    "=".repeat(BORDER_WIDTH)
}

fn centered(title: &str) -> String {
    let pad = (BORDER_WIDTH.saturating_sub(title.len())) / 2;
    format!("{}{}", " ".repeat(pad), title)
}

/// Groups `n` with `,` every three digits, e.g. `1000000` -> `1,000,000`.
fn grouped(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn bc_name(bc: BoundaryCondition) -> &'static str {
    match bc {
        BoundaryCondition::Vacuum => "Vacuum",
        BoundaryCondition::Reflective => "Reflective",
        BoundaryCondition::Periodic => "Periodic",
    }
}

/// Prints the bordered run-parameter banner to stdout.
pub fn print_run_summary(config: &RunConfig) {
    println!("{}", border());
    println!("{}", centered("INPUT SUMMARY"));
    println!("{}", border());
    println!();
    println!("Number of particles:          {}", grouped(config.particles));
    println!("Number of batches:             {}", config.batches);
    println!("Number of active batches:      {}", config.active);
    println!("Number of generations/batch:   {}", config.generations);
    println!("Boundary condition:            {}", bc_name(config.bc));
    println!("Number of nuclides:            {}", config.nuclides);
    println!("RNG seed:                      {}", config.seed);
    println!();
    println!("{}", border());
}

/// Prints one batch's status line: inactive batches print the batch
/// number, entropy, and k_eff; active batches append the running mean and
/// standard deviation.
pub fn print_batch_status(batch: usize, h: f64, keff_batch: f64, active: Option<(f64, f64)>) {
    match active {
        None => println!("{:<15} {:<15.6} {:<15.6}", batch + 1, h, keff_batch),
        Some((mean, std)) => println!(
            "{:<15} {:<15.6} {:<15.6} {:.6} +/- {:<15.6}",
            batch + 1,
            h,
            keff_batch,
            mean,
            std
        ),
    }
}

/// Prints a fatal `ERROR: <message>` line to stdout.
pub fn print_error(message: &str) {
    println!("ERROR: {message}");
}
