// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f};

/// Per-worker random source. Every rendering thread owns its own instance;
/// sampling never touches shared state.
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    // Strictly below 1.0 so discrete lobe selection never indexes past the end
    pub fn next_f32(&mut self) -> Float {
        ((self.next_u32() as f64) / (u32::MAX as f64 + 1.0)) as Float
    }

    pub fn next_2d(&mut self) -> Vector2f {
        Vector2f::new(self.next_f32(), self.next_f32())
    }
}

#[cfg(test)]
mod tests {
    use super::LcgRng;

    #[test]
    fn test_unit_interval() {
        let mut rng = LcgRng::new(1);
        for _ in 0..4096 {
            let v = rng.next_f32();
            assert!(v >= 0.0 && v < 1.0);
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let mut a = LcgRng::new(1234);
        let mut b = LcgRng::new(1234);
        for _ in 0..64 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }
}
