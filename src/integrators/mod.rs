// Copyright @yucwang 2026

pub mod light_stats;
pub mod photon_map;
