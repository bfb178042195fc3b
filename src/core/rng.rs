// Copyright @yucwang 2026

use crate::math::constants::Float;

#[derive(Debug, Clone)]
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    /// Seeds from a (seed, stream) pair so that neighbouring streams decorrelate.
    pub fn with_stream(seed: u64, stream: u64) -> Self {
        Self { state: splitmix64(seed ^ splitmix64(stream)) }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.state >> 32) as u32
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> Float {
        ((self.next_u32() >> 8) as Float) * (1.0 / 16777216.0)
    }
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E3779B97F4A7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::LcgRng;

    #[test]
    fn test_range() {
        let mut rng = LcgRng::with_stream(7, 0);
        for _ in 0..10000 {
            let v = rng.next_f32();
            assert!(v >= 0.0 && v < 1.0);
        }
    }

    #[test]
    fn test_streams_are_deterministic() {
        let mut a = LcgRng::with_stream(3, 42);
        let mut b = LcgRng::with_stream(3, 42);
        let mut c = LcgRng::with_stream(3, 43);
        let va: Vec<u32> = (0..4).map(|_| a.next_u32()).collect();
        let vb: Vec<u32> = (0..4).map(|_| b.next_u32()).collect();
        let vc: Vec<u32> = (0..4).map(|_| c.next_u32()).collect();
        assert_eq!(va, vb);
        assert_ne!(va, vc);
    }
}
