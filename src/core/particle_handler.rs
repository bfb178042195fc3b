// Copyright @yucwang 2026

use crate::core::emitter::PositionSampleRecord;
use crate::core::interaction::SurfaceIntersection;
use crate::core::medium::{Medium, MediumSampleRecord};
use crate::core::bsdf::BSDFSampleRecord;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;

/// Densities recorded for one completed bounce.
#[derive(Debug, Clone, PartialEq)]
pub struct PathVertexRecord {
    /// Density of the sampled continuation, multiplied by the Russian
    /// roulette survival probability when roulette was applied.
    pub pdf: Float,
    /// Density of sampling the incident direction from the outgoing one.
    pub inv_pdf: Float,
    /// Scattering function evaluated in the reverse direction.
    pub inv_eval: RGBSpectrum,
}

/// Bounce bookkeeping of one particle; one record per completed bounce.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathHistory {
    vertices: Vec<PathVertexRecord>,
}

impl PathHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, vertex: PathVertexRecord) {
        self.vertices.push(vertex);
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[PathVertexRecord] {
        &self.vertices
    }
}

/// Context of a surface interaction, captured before the particle scatters.
pub struct SurfaceInteractionEvent<'a> {
    pub depth: i32,
    pub null_interactions: i32,
    /// Whether the previous scattering event was a delta component.
    pub delta: bool,
    pub its: &'a SurfaceIntersection,
    pub bsdf_record: &'a BSDFSampleRecord,
    pub medium: Option<&'a dyn Medium>,
    /// Throughput times emitted power.
    pub weight: RGBSpectrum,
    pub throughput: RGBSpectrum,
    /// World-space direction pointing back along the incoming path.
    pub wi: Vector3f,
    pub history: &'a PathHistory,
}

/// Context of a scattering event inside a medium.
pub struct MediumInteractionEvent<'a> {
    pub depth: i32,
    pub null_interactions: i32,
    pub delta: bool,
    pub record: &'a MediumSampleRecord,
    pub medium: &'a dyn Medium,
    pub wi: Vector3f,
    pub weight: RGBSpectrum,
    pub history: &'a PathHistory,
}

/// Extension points of the particle random walk. Every hook defaults to a
/// no-op; transport algorithms override the ones they record.
///
/// After each work range the scheduler calls `take_output` and reports
/// `result_count` of it to the coordinating process.
pub trait ParticleHandler: Send {
    type Output: Send;

    /// Emitter position sampled (split emission mode only).
    fn handle_emission(&mut self, _p_rec: &PositionSampleRecord, _medium: Option<&dyn Medium>, _weight: &RGBSpectrum) {}

    /// A particle was emitted (joint emission mode only).
    fn handle_new_particle(&mut self) {}

    fn handle_surface_interaction(&mut self, _event: &SurfaceInteractionEvent) {}

    fn handle_medium_interaction(&mut self, _event: &MediumInteractionEvent) {}

    /// Drains everything recorded since the previous call.
    fn take_output(&mut self) -> Self::Output;

    fn result_count(output: &Self::Output) -> u64;
}

/// Handler that records nothing and reports no results.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHandler;

impl ParticleHandler for NullHandler {
    type Output = ();

    fn take_output(&mut self) {}

    fn result_count(_output: &()) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_history_records_in_order() {
        let mut history = PathHistory::new();
        assert!(history.is_empty());
        for i in 1..=3 {
            history.push(PathVertexRecord { pdf: i as Float, inv_pdf: 0.5, inv_eval: RGBSpectrum::splat(1.0) });
        }
        assert_eq!(history.len(), 3);
        let pdfs: Vec<Float> = history.vertices().iter().map(|v| v.pdf).collect();
        assert_eq!(pdfs, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_null_handler_reports_nothing() {
        let mut handler = NullHandler;
        handler.handle_new_particle();
        let output = handler.take_output();
        assert_eq!(NullHandler::result_count(&output), 0);
    }
}
