// Copyright 2020 TwoCookingMice

use madeleine::core::particle_process::{ParticleMode, ParticleProcess};
use madeleine::core::particle_tracer::TracerConfig;
use madeleine::core::resources::Resources;
use madeleine::core::sampler::IndependentSampler;
use madeleine::core::scene_loader::load_scene_with_settings;
use madeleine::core::sensor::Sensor;
use madeleine::integrators::light_stats::{LightStatistics, LightStats};
use madeleine::integrators::photon_map::{gather_photons, PhotonGatherSettings};
use madeleine::renderers::scheduler::Scheduler;
use madeleine::sensors::perspective::PerspectiveCamera;

use console::style;
use std::env;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

const USAGE: &str = "<scene.xml> [--count N] [--max-depth N] [--rr-depth N] [--granularity N] \
                     [--threads N] [--seed N] [--photons N] [--emission-events]";

#[derive(Default)]
struct Options {
    count: Option<u64>,
    max_depth: Option<i32>,
    rr_depth: Option<i32>,
    granularity: Option<u64>,
    threads: Option<usize>,
    seed: u64,
    photons: Option<u64>,
    emission_events: bool,
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> T {
    match value.and_then(|v| v.parse::<T>().ok()) {
        Some(v) => v,
        None => fail(&format!("{} expects a numeric value", flag)),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{} {}", style("error:").red().bold(), message);
    std::process::exit(1);
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} {}", args[0], USAGE);
        std::process::exit(1);
    }

    let input_path = &args[1];
    let mut options = Options::default();

    let mut i = 2;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--count" => { i += 1; options.count = Some(parse_value(flag, args.get(i))); }
            "--max-depth" => { i += 1; options.max_depth = Some(parse_value(flag, args.get(i))); }
            "--rr-depth" => { i += 1; options.rr_depth = Some(parse_value(flag, args.get(i))); }
            "--granularity" => { i += 1; options.granularity = Some(parse_value(flag, args.get(i))); }
            "--threads" => { i += 1; options.threads = Some(parse_value(flag, args.get(i))); }
            "--seed" => { i += 1; options.seed = parse_value(flag, args.get(i)); }
            "--photons" => { i += 1; options.photons = Some(parse_value(flag, args.get(i))); }
            "--emission-events" => options.emission_events = true,
            other => log::warn!("ignoring unknown argument {}", other),
        }
        i += 1;
    }

    let load_result = match load_scene_with_settings(input_path) {
        Ok(result) => result,
        Err(err) => fail(&format!("failed to load {}: {}", input_path, err)),
    };
    let settings = load_result.integrator;

    let config = TracerConfig::new(
        options.max_depth.unwrap_or(settings.config.max_depth),
        options.rr_depth.unwrap_or(settings.config.rr_depth),
        options.emission_events || settings.config.emission_events,
    ).unwrap_or_else(|err| fail(&err.to_string()));

    let sensor: Arc<dyn Sensor> = match load_result.sensor {
        Some(sensor) => sensor,
        None => {
            log::warn!("scene has no sensor; using a default perspective camera");
            Arc::new(PerspectiveCamera::default())
        }
    };

    let resources = Resources::for_particle_tracing(Arc::new(load_result.scene),
                                                    Box::new(IndependentSampler::new(options.seed)),
                                                    sensor.clone());
    let scheduler = Scheduler::new(options.threads);
    let granularity = options.granularity.unwrap_or(settings.granularity);
    let stop = AtomicBool::new(false);

    if let Some(photon_count) = options.photons {
        let gather = PhotonGatherSettings { photon_count, granularity, ..Default::default() };
        let map = gather_photons(&scheduler, &resources, config, &gather, &stop)
            .unwrap_or_else(|err| fail(&err.to_string()));

        println!("{}", style("Photon map").bold().cyan());
        println!("  particles emitted  {}", map.particles);
        println!("  surface photons    {}", map.surface.len());
        println!("  volume photons     {}", map.volume.len());
        println!("  total power        {:?}", map.total_power());
        return;
    }

    let work_count = options.count.unwrap_or(settings.work_count);
    let process = ParticleProcess::new(ParticleMode::Trace, work_count, granularity,
                                       scheduler.worker_count(), "Tracing particles");
    let mut stats = LightStats::default();
    let summary = scheduler.run(&process, config, &resources,
                                |_| LightStatistics::new(Some(sensor.clone())),
                                |output| stats.merge(&output),
                                &stop)
        .unwrap_or_else(|err| fail(&err.to_string()));

    println!("{}", style("Light statistics").bold().cyan());
    println!("  particles          {}", stats.particles);
    println!("  surface hits       {}", stats.surface_interactions);
    println!("  medium scatters    {}", stats.medium_interactions);
    println!("  null crossings     {}", stats.null_interactions);
    println!("  visible to sensor  {}", stats.visible_interactions);
    println!("  mean depth         {:.3}", stats.mean_depth());
    println!("  deposited power    {:?}", stats.deposited_power);
    println!("  {} in {:.2?} on {} workers", style("done").green(), summary.elapsed, summary.worker_count);
}
