// Copyright @yucwang 2026

pub mod homogeneous_medium;
pub mod isotropic;
