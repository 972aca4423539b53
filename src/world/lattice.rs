use noise::NoiseFn;

/// Seed used for the river meander unless the configuration overrides it.
pub const DEFAULT_RIVER_SEED: u32 = 12345;

/// One-dimensional value noise on an integer lattice.
///
/// Lattice values come from an integer hash of `(seed, floor(x))` and are
/// smoothstep-interpolated in between, so the field is continuous and
/// deterministic for a given seed. Output is always in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatticeNoise {
    seed: u32,
}

impl LatticeNoise {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    /// Sample the field at `x`.
    pub fn sample(&self, x: f64) -> f64 {
        let floor = x.floor();
        let t = x - floor;
        let t = t * t * (3.0 - 2.0 * t);
        let k = floor as i32;
        let v0 = self.lattice(k);
        let v1 = self.lattice(k.wrapping_add(1));
        v0 * (1.0 - t) + v1 * t
    }

    fn lattice(&self, k: i32) -> f64 {
        let mut n = k.wrapping_add((self.seed as i32).wrapping_mul(57));
        n = (n << 13) ^ n;
        let hashed = n
            .wrapping_mul(n.wrapping_mul(n).wrapping_mul(15731).wrapping_add(789_221))
            .wrapping_add(1_376_312_589)
            & 0x7fff_ffff;
        hashed as f64 / 2_147_483_647.0
    }
}

impl Default for LatticeNoise {
    fn default() -> Self {
        Self::new(DEFAULT_RIVER_SEED)
    }
}

impl NoiseFn<f64, 1> for LatticeNoise {
    fn get(&self, point: [f64; 1]) -> f64 {
        self.sample(point[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_values() {
        let a = LatticeNoise::new(99);
        let b = LatticeNoise::new(99);
        for i in 0..200 {
            let x = i as f64 * 0.137;
            assert_eq!(a.sample(x), b.sample(x));
        }
    }

    #[test]
    fn values_stay_in_unit_range() {
        let noise = LatticeNoise::default();
        for i in -500..500 {
            let v = noise.sample(i as f64 * 0.21);
            assert!((0.0..=1.0).contains(&v), "sample {} out of range: {}", i, v);
        }
    }

    #[test]
    fn integer_points_hit_lattice_values() {
        let noise = LatticeNoise::new(7);
        for k in 0..20 {
            assert_eq!(noise.sample(k as f64), noise.lattice(k));
        }
    }

    #[test]
    fn field_is_continuous_across_lattice_points() {
        let noise = LatticeNoise::new(3);
        for k in 1..20 {
            let x = k as f64;
            let left = noise.sample(x - 1e-9);
            let right = noise.sample(x + 1e-9);
            assert!((left - right).abs() < 1e-6, "jump at {}: {} vs {}", x, left, right);
        }
    }

    #[test]
    fn different_seeds_give_different_fields() {
        let a = LatticeNoise::new(1);
        let b = LatticeNoise::new(2);
        let differs = (0..50).any(|i| a.sample(i as f64 * 0.5) != b.sample(i as f64 * 0.5));
        assert!(differs);
    }

    #[test]
    fn noise_fn_matches_sample() {
        let noise = LatticeNoise::new(11);
        assert_eq!(noise.get([2.4]), noise.sample(2.4));
    }
}
