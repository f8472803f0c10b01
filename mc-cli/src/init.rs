//! Builds the initial source bank when `load_source` is not set: `N`
//! particles sampled uniformly inside the box with isotropic direction.
//!
//! Sampling draws from the `Other` stream, since it is driver-level
//! sampling rather than particle transport, which draws only from `Track`.

use mc_core::bank::Bank;
use mc_core::geometry::Geometry;
use mc_core::particle::Particle;
use mc_core::rng::{Rng, Stream};
use rand::Rng as _;
use std::f64::consts::PI;

/// Samples `n` particles uniformly inside `geometry`, isotropic direction,
/// unit weight, group 0, alive.
#[must_use]
pub fn uniform_source_bank(n: usize, geometry: &Geometry, seed: u64) -> Bank {
    let mut rng = Rng::new(seed);
    rng.stream(Stream::Other);

    let mut bank = Bank::new(n);
    for _ in 0..n {
        let x = rng.gen::<f64>() * geometry.lx;
        let y = rng.gen::<f64>() * geometry.ly;
        let z = rng.gen::<f64>() * geometry.lz;

        let mu = 2.0 * rng.gen::<f64>() - 1.0;
        let phi = 2.0 * PI * rng.gen::<f64>();
        let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();

        bank.append(Particle::new(x, y, z, mu, sin_theta * phi.cos(), sin_theta * phi.sin()));
    }
    bank
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_core::geometry::BoundaryCondition;

    #[test]
    fn samples_exactly_n_particles_inside_the_box() {
        let geometry = Geometry::new(10.0, 10.0, 10.0, BoundaryCondition::Vacuum);
        let bank = uniform_source_bank(50, &geometry, 7);
        assert_eq!(bank.len(), 50);
        for p in bank.particles() {
            assert!(p.x >= 0.0 && p.x < 10.0);
            assert!(p.y >= 0.0 && p.y < 10.0);
            assert!(p.z >= 0.0 && p.z < 10.0);
            assert!((p.u * p.u + p.v * p.v + p.w * p.w - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn is_deterministic_given_the_same_seed() {
        let geometry = Geometry::new(5.0, 5.0, 5.0, BoundaryCondition::Vacuum);
        let a = uniform_source_bank(20, &geometry, 99);
        let b = uniform_source_bank(20, &geometry, 99);
        for (p, q) in a.particles().iter().zip(b.particles()) {
            assert_eq!(p, q);
        }
    }
}
