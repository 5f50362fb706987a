//! Two-word mixing PRNG used by every pixel sample.
//!
//! Each pixel trace owns its own generator, reseeded from the pixel index and
//! the sample index, so frames are reproducible and pixels decorrelated
//! without any shared state.

use lumen_math::Vec2;
use rand::{RngCore, SeedableRng};

const MULTIPLIER: u32 = 1_664_525;
const INCREMENT: u32 = 1_013_904_223;

/// 2^-24: maps the top 24 bits of a word onto `[0, 1)` exactly.
const UNIT_FLOAT_SCALE: f32 = 1.0 / 16_777_216.0;

/// Deterministic 64-bit-state generator (two `u32` words).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prng {
    state: [u32; 2],
}

impl Prng {
    pub fn new(x: u32, y: u32) -> Self {
        Self { state: [x, y] }
    }

    /// Generator for one sample of one pixel.
    pub fn for_pixel(pixel_index: u32, sample_index: u32) -> Self {
        let mut rng = Self::new(
            pixel_index.wrapping_mul(0x9E37_79B9) ^ sample_index,
            sample_index.wrapping_mul(0x85EB_CA6B) ^ pixel_index.rotate_left(16),
        );
        rng.advance();
        rng
    }

    /// Step the state: multiply-add, cross-mix and xor-shift, applied twice.
    #[inline]
    pub fn advance(&mut self) {
        let [mut x, mut y] = self.state;

        x = x.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
        y = y.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);

        for _ in 0..2 {
            x = x.wrapping_add(y.wrapping_mul(MULTIPLIER));
            y = y.wrapping_add(x.wrapping_mul(MULTIPLIER));
            x ^= x >> 16;
            y ^= y >> 16;
        }

        self.state = [x, y];
    }

    /// Uniform float in `[0, 1)`.
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        self.advance();
        unit_float(self.state[0])
    }

    /// Two uniform floats in `[0, 1)` from a single step.
    #[inline]
    pub fn next_vec2(&mut self) -> Vec2 {
        self.advance();
        Vec2::new(unit_float(self.state[0]), unit_float(self.state[1]))
    }
}

#[inline]
fn unit_float(word: u32) -> f32 {
    (word >> 8) as f32 * UNIT_FLOAT_SCALE
}

impl RngCore for Prng {
    fn next_u32(&mut self) -> u32 {
        self.advance();
        self.state[0]
    }

    fn next_u64(&mut self) -> u64 {
        self.advance();
        ((self.state[0] as u64) << 32) | self.state[1] as u64
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Prng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(
            u32::from_le_bytes([seed[0], seed[1], seed[2], seed[3]]),
            u32::from_le_bytes([seed[4], seed[5], seed[6], seed[7]]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_deterministic_for_seed() {
        let mut a = Prng::for_pixel(17, 3);
        let mut b = Prng::for_pixel(17, 3);

        for _ in 0..100 {
            assert_eq!(a.next_f32(), b.next_f32());
        }
    }

    #[test]
    fn test_pixels_are_decorrelated() {
        let mut a = Prng::for_pixel(0, 0);
        let mut b = Prng::for_pixel(1, 0);
        let mut c = Prng::for_pixel(0, 1);

        let (x, y, z) = (a.next_u32(), b.next_u32(), c.next_u32());
        assert_ne!(x, y);
        assert_ne!(x, z);
        assert_ne!(y, z);
    }

    #[test]
    fn test_unit_range_and_mean() {
        let mut rng = Prng::seed_from_u64(42);
        let n = 100_000;
        let mut sum = 0.0_f64;

        for _ in 0..n {
            let r = rng.next_vec2();
            assert!((0.0..1.0).contains(&r.x));
            assert!((0.0..1.0).contains(&r.y));
            sum += (r.x + r.y) as f64;
        }

        let mean = sum / (2 * n) as f64;
        assert!((mean - 0.5).abs() < 0.01, "mean = {mean}");
    }

    #[test]
    fn test_extreme_word_stays_below_one() {
        assert!(unit_float(u32::MAX) < 1.0);
        assert_eq!(unit_float(0), 0.0);
    }

    #[test]
    fn test_works_as_rand_rng() {
        let mut rng = Prng::from_seed([1, 2, 3, 4, 5, 6, 7, 8]);
        let value: f32 = rng.gen_range(-1.0..1.0);
        assert!((-1.0..1.0).contains(&value));

        let mut bytes = [0u8; 7];
        rng.fill_bytes(&mut bytes);
        assert!(bytes.iter().any(|b| *b != 0));
    }
}
