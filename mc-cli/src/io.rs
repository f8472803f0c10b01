//! Plain-text and binary file writers for the run's persisted products.
//!
//! Every writer opens its file in append mode and closes it again on
//! return: there is no long-lived file handle kept across the batch loop,
//! and no concurrent writes. `save_source`/`load_source` are the
//! exception: they always target the fixed name `source.dat`, never
//! `source_file` (which is the ASCII source-density grid written by
//! `write_source`).

use anyhow::{bail, Context, Result};
use mc_core::bank::Bank;
use mc_core::geometry::Geometry;
use mc_core::particle::Particle;
use mc_core::transport::Tally;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

fn append(path: &Path) -> Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("unable to open '{}' for append", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Appends one row per tally line, `n x n` flux values, space-separated.
pub fn write_tally(tally: &Tally, path: &Path) -> Result<()> {
    let n = tally.bins();
    let flux = tally.flux();
    let mut w = append(path)?;
    for i in 0..n {
        for j in 0..n {
            write!(w, "{:e} ", flux[i + n * j])?;
        }
        writeln!(w)?;
    }
    Ok(w.flush()?)
}

/// Appends one `%.10f`-formatted decimal value.
pub fn write_scalar(value: f64, path: &Path) -> Result<()> {
    let mut w = append(path)?;
    writeln!(w, "{value:.10}")?;
    Ok(w.flush()?)
}

/// Appends one `%.10f`-formatted decimal value per active-batch k_eff.
pub fn write_keff(keff: &[f64], path: &Path) -> Result<()> {
    let mut w = append(path)?;
    for value in keff {
        writeln!(w, "{value:.10}")?;
    }
    Ok(w.flush()?)
}

/// Appends every particle's `(x, y)` pair on a single line.
pub fn write_bank(bank: &Bank, path: &Path) -> Result<()> {
    let mut w = append(path)?;
    for p in bank.particles() {
        write!(w, "{:.10} {:.10} ", p.x, p.y)?;
    }
    writeln!(w)?;
    Ok(w.flush()?)
}

/// Appends a normalized `n x n` 2-D source-density grid, one row per line.
/// Uses the `x, y` box extent directly, independent of the 3-D entropy
/// grid's own cell count: the two diagnostics are intentionally kept on
/// separate grids.
pub fn write_source(bank: &Bank, geometry: &Geometry, n: usize, path: &Path) -> Result<()> {
    if n == 0 {
        bail!("source distribution grid needs at least one bin");
    }
    let dx = geometry.lx / n as f64;
    let dy = geometry.ly / n as f64;

    let mut dist = vec![0.0f64; n * n];
    for p in bank.particles() {
        let (x, y, _) = geometry.clamp_into_box((p.x, p.y, 0.0));
        let ix = ((x / dx) as usize).min(n - 1);
        let iy = ((y / dy) as usize).min(n - 1);
        dist[ix + n * iy] += 1.0;
    }
    let count = bank.len().max(1) as f64;
    for v in &mut dist {
        *v /= count;
    }

    let mut w = append(path)?;
    for i in 0..n {
        for j in 0..n {
            write!(w, "{:e} ", dist[i + n * j])?;
        }
        writeln!(w)?;
    }
    Ok(w.flush()?)
}

const RECORD_LEN: usize = 8 * 7 + 4 + 1;

fn encode_particle(p: &Particle, out: &mut Vec<u8>) {
    out.extend_from_slice(&p.x.to_le_bytes());
    out.extend_from_slice(&p.y.to_le_bytes());
    out.extend_from_slice(&p.z.to_le_bytes());
    out.extend_from_slice(&p.u.to_le_bytes());
    out.extend_from_slice(&p.v.to_le_bytes());
    out.extend_from_slice(&p.w.to_le_bytes());
    out.extend_from_slice(&p.weight.to_le_bytes());
    out.extend_from_slice(&p.group.to_le_bytes());
    out.push(u8::from(p.alive));
}

fn decode_particle(buf: &[u8]) -> Particle {
    let f = |i: usize| f64::from_le_bytes(buf[i * 8..i * 8 + 8].try_into().unwrap());
    Particle {
        x: f(0),
        y: f(1),
        z: f(2),
        u: f(3),
        v: f(4),
        w: f(5),
        weight: f(6),
        group: u32::from_le_bytes(buf[56..60].try_into().unwrap()),
        alive: buf[60] != 0,
    }
}

/// Dumps every live particle of `bank` as a fixed-layout binary record to
/// `source.dat`, overwriting any previous dump.
pub fn save_source(bank: &Bank) -> Result<()> {
    let mut out = Vec::with_capacity(bank.len() * RECORD_LEN);
    for p in bank.particles() {
        encode_particle(p, &mut out);
    }
    let mut file = File::create("source.dat").context("unable to open 'source.dat' for write")?;
    file.write_all(&out).context("Error saving source")?;
    Ok(())
}

/// Loads exactly `capacity` particle records from `source.dat`. A freshly
/// loaded bank has `n = capacity`, not the original live count at save
/// time.
pub fn load_source(capacity: usize) -> Result<Bank> {
    let file = File::open("source.dat").context("Couldn't open source file.")?;
    let mut reader = BufReader::new(file);
    let mut buf = vec![0u8; capacity * RECORD_LEN];
    reader.read_exact(&mut buf).context("Error loading source.")?;

    let mut bank = Bank::new(capacity);
    for chunk in buf.chunks_exact(RECORD_LEN) {
        bank.append(decode_particle(chunk));
    }
    Ok(bank)
}
