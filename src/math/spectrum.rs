// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f};
use std::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Sub};

pub trait Spectrum {
    fn is_black(&self) -> bool;
    fn max_value(&self) -> Float;
    fn average(&self) -> Float;
    fn is_valid(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RGBSpectrum {
    rgb: Vector3f
}

impl Default for RGBSpectrum {
    fn default() -> Self {
        Self { rgb: Vector3f::new(0.0f32, 0.0f32, 0.0f32) }
    }
}

impl RGBSpectrum {
    pub fn new(r: Float, g: Float, b: Float) -> Self {
        Self { rgb: Vector3f::new(r, g, b) }
    }

    pub fn splat(v: Float) -> Self {
        Self::new(v, v, v)
    }

    pub fn from_vec(v: Vector3f) -> Self {
        Self { rgb: v }
    }

    pub fn to_vec(&self) -> Vector3f {
        self.rgb
    }

    pub fn exp(&self) -> Self {
        Self::new(self.rgb.x.exp(), self.rgb.y.exp(), self.rgb.z.exp())
    }
}

impl Spectrum for RGBSpectrum {
    fn is_black(&self) -> bool {
        self.rgb.iter().all(|&c| c == 0.0)
    }

    fn max_value(&self) -> Float {
        self.rgb.x.max(self.rgb.y).max(self.rgb.z)
    }

    fn average(&self) -> Float {
        (self.rgb.x + self.rgb.y + self.rgb.z) / 3.0
    }

    // Finite and non-negative in every channel.
    fn is_valid(&self) -> bool {
        self.rgb.iter().all(|&c| c.is_finite() && c >= 0.0)
    }
}

impl Index<usize> for RGBSpectrum {
    type Output = Float;

    fn index(&self, idx: usize) -> &Float {
        &self.rgb[idx]
    }
}

impl IndexMut<usize> for RGBSpectrum {
    fn index_mut(&mut self, idx: usize) -> &mut Float {
        &mut self.rgb[idx]
    }
}

impl Add for RGBSpectrum {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self { rgb: self.rgb + rhs.rgb }
    }
}

impl AddAssign for RGBSpectrum {
    fn add_assign(&mut self, rhs: Self) {
        self.rgb += rhs.rgb;
    }
}

impl Sub for RGBSpectrum {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self { rgb: self.rgb - rhs.rgb }
    }
}

impl Mul for RGBSpectrum {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self { rgb: self.rgb.component_mul(&rhs.rgb) }
    }
}

impl Mul<Float> for RGBSpectrum {
    type Output = Self;

    fn mul(self, rhs: Float) -> Self {
        Self { rgb: self.rgb * rhs }
    }
}

impl MulAssign for RGBSpectrum {
    fn mul_assign(&mut self, rhs: Self) {
        self.rgb.component_mul_assign(&rhs.rgb);
    }
}

impl MulAssign<Float> for RGBSpectrum {
    fn mul_assign(&mut self, rhs: Float) {
        self.rgb *= rhs;
    }
}

impl Div<Float> for RGBSpectrum {
    type Output = Self;

    fn div(self, rhs: Float) -> Self {
        Self { rgb: self.rgb / rhs }
    }
}

impl DivAssign<Float> for RGBSpectrum {
    fn div_assign(&mut self, rhs: Float) {
        self.rgb /= rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::{RGBSpectrum, Spectrum};

    #[test]
    fn test_is_black() {
        assert!(RGBSpectrum::default().is_black());
        assert!(!RGBSpectrum::new(0.0, 0.0, 1e-8).is_black());
    }

    #[test]
    fn test_max_and_average() {
        let s = RGBSpectrum::new(0.2, 0.8, 0.5);
        assert_eq!(s.max_value(), 0.8);
        assert!((s.average() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_validity() {
        assert!(RGBSpectrum::new(0.0, 1.0, 2.0).is_valid());
        assert!(!RGBSpectrum::new(-0.1, 1.0, 2.0).is_valid());
        assert!(!RGBSpectrum::new(std::f32::INFINITY, 1.0, 2.0).is_valid());
        assert!(!RGBSpectrum::new(std::f32::NAN, 1.0, 2.0).is_valid());
    }

    #[test]
    fn test_arithmetic() {
        let mut a = RGBSpectrum::new(1.0, 2.0, 3.0);
        a *= RGBSpectrum::splat(2.0);
        assert_eq!(a, RGBSpectrum::new(2.0, 4.0, 6.0));
        a /= 2.0;
        assert_eq!(a[2], 3.0);
    }
}
