// Copyright @yucwang 2021

pub mod bsdf;
pub mod computation_node;
pub mod emitter;
pub mod error;
pub mod interaction;
pub mod medium;
pub mod particle_handler;
pub mod particle_process;
pub mod particle_tracer;
pub mod phase;
pub mod range;
pub mod resources;
pub mod rng;
pub mod sampler;
pub mod sensor;
pub mod scene;
pub mod scene_loader;
pub mod shape;
