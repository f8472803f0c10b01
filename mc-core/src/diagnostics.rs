//! Convergence diagnostics: Shannon entropy of the source distribution
//! (C6a) and mean-squared inter-particle distance (C6b).

use crate::bank::Bank;
use crate::geometry::Geometry;

/// Number of cubic cells per dimension for the entropy grid: `ceil((n/20)^(1/3))`.
#[must_use]
pub fn entropy_grid_size(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    ((n as f64 / 20.0).cbrt()).ceil() as usize
}

/// Shannon entropy of `bank`'s spatial distribution over a `m x m x m`
/// grid of `geometry`, where `m = entropy_grid_size(bank.len())`.
///
/// `H = -sum_{c: count_c > 0} p_c * log2(p_c)`, `p_c = count_c / n`.
/// `H` is in `[0, log2(m^3)]`, rising toward the ceiling as the source
/// spreads uniformly across cells.
#[must_use]
pub fn shannon_entropy(geometry: &Geometry, bank: &Bank) -> f64 {
    let n = bank.len();
    if n == 0 {
        return 0.0;
    }
    let m = entropy_grid_size(n);
    if m == 0 {
        return 0.0;
    }

    let dx = geometry.lx / m as f64;
    let dy = geometry.ly / m as f64;
    let dz = geometry.lz / m as f64;

    let mut counts = vec![0u64; m * m * m];
    for p in bank.particles() {
        let (x, y, z) = geometry.clamp_into_box((p.x, p.y, p.z));
        let ix = ((x / dx) as usize).min(m - 1);
        let iy = ((y / dy) as usize).min(m - 1);
        let iz = ((z / dz) as usize).min(m - 1);
        counts[ix * m * m + iy * m + iz] += 1;
    }

    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p_c = c as f64 / n as f64;
            -p_c * p_c.log2()
        })
        .sum()
}

/// Mean-squared distance between all pairs of particles in `bank`:
/// `(2 / (n*(n-1))) * sum_{i<j} ||p_i - p_j||^2`.
///
/// `O(n^2)`; intended as an occasional diagnostic, not a per-generation one.
#[must_use]
pub fn mean_squared_distance(bank: &Bank) -> f64 {
    let particles = bank.particles();
    let n = particles.len();
    if n < 2 {
        return 0.0;
    }

    let mut sum = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            sum += particles[i].distance_squared(&particles[j]);
        }
    }
    let n_pairs = (n * (n - 1) / 2) as f64;
    sum / n_pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundaryCondition;
    use crate::particle::Particle;

    fn box_geometry(l: f64) -> Geometry {
        Geometry::new(l, l, l, BoundaryCondition::Vacuum)
    }

    #[test]
    fn entropy_is_zero_when_all_particles_share_one_cell() {
        // N=20 on a unit box: m = ceil((20/20)^(1/3)) = 1, a single cell.
        let geometry = box_geometry(1.0);
        let mut bank = Bank::new(20);
        for i in 0..20 {
            bank.append(Particle::new(0.1, 0.1, 0.1 + i as f64 * 1e-4, 1.0, 0.0, 0.0));
        }
        assert_eq!(entropy_grid_size(bank.len()), 1);
        assert_eq!(shannon_entropy(&geometry, &bank), 0.0);
    }

    #[test]
    fn entropy_reaches_ceiling_when_uniformly_spread_over_cells() {
        // 160 particles, m = ceil((160/20)^(1/3)) = 2, 8 cells; 20 per cell
        // is a uniform split, so H should equal log2(8) exactly.
        let geometry = box_geometry(2.0);
        let mut bank = Bank::new(160);
        for ix in 0..2 {
            for iy in 0..2 {
                for iz in 0..2 {
                    for _ in 0..20 {
                        bank.append(Particle::new(
                            ix as f64 + 0.5,
                            iy as f64 + 0.5,
                            iz as f64 + 0.5,
                            1.0,
                            0.0,
                            0.0,
                        ));
                    }
                }
            }
        }
        let h = shannon_entropy(&geometry, &bank);
        assert!((h - 3.0).abs() < 1e-9);
    }

    #[test]
    fn entropy_is_bounded_by_log2_of_cell_count() {
        let geometry = box_geometry(4.0);
        let mut bank = Bank::new(40);
        for i in 0..40 {
            bank.append(Particle::new(
                (i % 4) as f64,
                ((i / 4) % 4) as f64,
                0.0,
                1.0,
                0.0,
                0.0,
            ));
        }
        let m = entropy_grid_size(bank.len());
        let h = shannon_entropy(&geometry, &bank);
        assert!(h >= 0.0);
        assert!(h <= ((m * m * m) as f64).log2() + 1e-9);
    }

    #[test]
    fn msd_is_invariant_under_permutation_and_translation() {
        let mut bank = Bank::new(3);
        bank.append(Particle::new(0.0, 0.0, 0.0, 1.0, 0.0, 0.0));
        bank.append(Particle::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0));
        bank.append(Particle::new(0.0, 2.0, 0.0, 1.0, 0.0, 0.0));
        let original = mean_squared_distance(&bank);

        let mut permuted = Bank::new(3);
        permuted.append(bank[2]);
        permuted.append(bank[0]);
        permuted.append(bank[1]);
        assert_eq!(mean_squared_distance(&permuted), original);

        let mut translated = Bank::new(3);
        for p in bank.particles() {
            let mut q = *p;
            q.x += 10.0;
            q.y -= 3.0;
            q.z += 1.0;
            translated.append(q);
        }
        assert!((mean_squared_distance(&translated) - original).abs() < 1e-9);
    }

    #[test]
    fn msd_of_single_particle_is_zero() {
        let mut bank = Bank::new(1);
        bank.append(Particle::default());
        assert_eq!(mean_squared_distance(&bank), 0.0);
    }
}
