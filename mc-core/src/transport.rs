//! The transport-kernel trait boundary and a concrete single-speed,
//! isotropic-scattering kernel for a homogeneous rectangular box.
//!
//! The physics of a single particle history is treated as an external
//! collaborator, reachable only through a `transport(p)` contract: it
//! advances `p` to its terminal event and may append fission offspring to
//! the calling worker's fission bank, drawing random numbers only from the
//! [`Stream::Track`] substream. [`TransportKernel`] is that contract as a
//! Rust trait; [`SingleSpeedKernel`] is the one concrete implementation
//! this crate ships, so the driver is runnable end to end.

use crate::bank::Bank;
use crate::geometry::{BoundaryCondition, Geometry};
use crate::material::Material;
use crate::particle::Particle;
use crate::rng::{Rng, Stream};
use std::f64::consts::PI;

/// A flux tally on the `n x n` cell grid spanning the box's x-y face,
/// accumulated with a collision estimator.
#[derive(Clone, Debug)]
pub struct Tally {
    n: usize,
    flux: Vec<f64>,
    /// Whether collisions should be scored this batch. The driver turns
    /// this on once the active-batch window is reached.
    pub tallies_on: bool,
}

impl Tally {
    /// Constructs a zeroed `n x n` tally grid.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            n,
            flux: vec![0.0; n * n],
            tallies_on: false,
        }
    }

    /// Number of cells per dimension.
    #[must_use]
    pub fn bins(&self) -> usize {
        self.n
    }

    /// The raw accumulated flux grid, row-major as `flux[ix + n*iy]`.
    #[must_use]
    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    /// Zeros the tally. The driver does this after every write of an
    /// active batch: tallies are per-batch, not cumulative across them.
    pub fn zero(&mut self) {
        self.flux.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Adds a worker-local flux grid (same layout) into this one. Used by
    /// the driver to reduce per-worker tallies after a parallel generation.
    pub fn accumulate(&mut self, worker_flux: &[f64]) {
        for (total, local) in self.flux.iter_mut().zip(worker_flux) {
            *total += local;
        }
    }

    fn score(&mut self, x: f64, y: f64, geometry: &Geometry, value: f64) {
        if !self.tallies_on || self.n == 0 {
            return;
        }
        let (x, y, _) = geometry.clamp_into_box((x, y, 0.0));
        let ix = ((x / geometry.lx) * self.n as f64) as usize;
        let iy = ((y / geometry.ly) * self.n as f64) as usize;
        self.flux[ix.min(self.n - 1) + self.n * iy.min(self.n - 1)] += value;
    }
}

/// Advances one particle to its terminal event (leakage or absorption),
/// appending fission offspring to `fission_bank` and scoring `tally`.
pub trait TransportKernel: Sync {
    /// Runs one particle history. Must draw random numbers only from
    /// [`Stream::Track`].
    fn transport(
        &self,
        geometry: &Geometry,
        material: &Material,
        tally: &mut Tally,
        fission_bank: &mut Bank,
        rng: &mut Rng,
        p: &mut Particle,
    );
}

/// Single-speed, isotropic-scattering analog transport in a homogeneous
/// rectangular box.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleSpeedKernel;

impl SingleSpeedKernel {
    fn sample_isotropic_direction(rng: &mut Rng) -> (f64, f64, f64) {
        use rand::Rng as _;
        let mu = 2.0 * rng.gen::<f64>() - 1.0;
        let phi = 2.0 * PI * rng.gen::<f64>();
        let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();
        (mu, sin_theta * phi.cos(), sin_theta * phi.sin())
    }

    /// Distance along `(u, v, w)` from `(x, y, z)` to the nearest face of
    /// the box, and which axis it is on.
    fn distance_to_boundary(p: &Particle, geometry: &Geometry) -> (f64, usize) {
        let axis = [
            (p.x, p.u, geometry.lx),
            (p.y, p.v, geometry.ly),
            (p.z, p.w, geometry.lz),
        ];
        axis.iter()
            .enumerate()
            .map(|(i, &(pos, dir, extent))| {
                let d = if dir > 0.0 {
                    (extent - pos) / dir
                } else if dir < 0.0 {
                    -pos / dir
                } else {
                    f64::INFINITY
                };
                (d.max(0.0), i)
            })
            .fold((f64::INFINITY, 0), |acc, cur| if cur.0 < acc.0 { cur } else { acc })
    }

    fn cross_boundary(p: &mut Particle, geometry: &Geometry, axis: usize) {
        match geometry.bc {
            BoundaryCondition::Vacuum => p.alive = false,
            BoundaryCondition::Reflective => match axis {
                0 => p.u = -p.u,
                1 => p.v = -p.v,
                _ => p.w = -p.w,
            },
            BoundaryCondition::Periodic => match axis {
                0 => p.x = p.x.rem_euclid(geometry.lx),
                1 => p.y = p.y.rem_euclid(geometry.ly),
                _ => p.z = p.z.rem_euclid(geometry.lz),
            },
        }
    }
}

impl TransportKernel for SingleSpeedKernel {
    fn transport(
        &self,
        geometry: &Geometry,
        material: &Material,
        tally: &mut Tally,
        fission_bank: &mut Bank,
        rng: &mut Rng,
        p: &mut Particle,
    ) {
        use rand::Rng as _;

        rng.stream(Stream::Track);
        let xs_t = material.xs_total();

        while p.alive {
            let d_collision = if xs_t > 0.0 {
                -rng.gen::<f64>().ln() / xs_t
            } else {
                f64::INFINITY
            };
            let (d_boundary, axis) = Self::distance_to_boundary(p, geometry);

            if d_boundary <= d_collision {
                p.x += p.u * d_boundary;
                p.y += p.v * d_boundary;
                p.z += p.w * d_boundary;
                Self::cross_boundary(p, geometry, axis);
                continue;
            }

            p.x += p.u * d_collision;
            p.y += p.v * d_collision;
            p.z += p.w * d_collision;
            tally.score(p.x, p.y, geometry, 1.0 / xs_t);

            let xi = rng.gen::<f64>() * xs_t;
            if xi < material.xs_a {
                p.alive = false;
            } else if xi < material.xs_a + material.xs_f {
                let n_whole = material.nu.floor();
                let n_offspring = n_whole as u32
                    + u32::from(rng.gen::<f64>() < material.nu - n_whole);
                for _ in 0..n_offspring {
                    let (u, v, w) = Self::sample_isotropic_direction(rng);
                    fission_bank.append(Particle {
                        x: p.x,
                        y: p.y,
                        z: p.z,
                        u,
                        v,
                        w,
                        weight: 1.0,
                        group: 0,
                        alive: true,
                    });
                }
                p.alive = false;
            } else {
                let (u, v, w) = Self::sample_isotropic_direction(rng);
                p.u = u;
                p.v = v;
                p.w = w;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vacuum_boundary_kills_particle_with_no_collisions() {
        let geometry = Geometry::new(1.0, 1.0, 1.0, BoundaryCondition::Vacuum);
        let material = Material {
            nu: 2.5,
            xs_f: 0.0,
            xs_a: 0.0,
            xs_s: 0.0,
        };
        let mut tally = Tally::new(1);
        let mut fission_bank = Bank::new(4);
        let mut rng = Rng::new(1);
        let mut p = Particle::new(0.5, 0.5, 0.5, 1.0, 0.0, 0.0);

        SingleSpeedKernel.transport(&geometry, &material, &mut tally, &mut fission_bank, &mut rng, &mut p);

        assert!(!p.alive);
        assert_eq!(fission_bank.len(), 0);
    }

    #[test]
    fn pure_fission_material_always_produces_offspring() {
        let geometry = Geometry::new(10.0, 10.0, 10.0, BoundaryCondition::Reflective);
        let material = Material {
            nu: 2.0,
            xs_f: 1.0,
            xs_a: 0.0,
            xs_s: 0.0,
        };
        let mut tally = Tally::new(1);
        let mut fission_bank = Bank::new(4);
        let mut rng = Rng::new(7);
        let mut p = Particle::new(5.0, 5.0, 5.0, 1.0, 0.0, 0.0);

        SingleSpeedKernel.transport(&geometry, &material, &mut tally, &mut fission_bank, &mut rng, &mut p);

        assert!(!p.alive);
        assert_eq!(fission_bank.len(), 2);
    }
}
