//! Headless emitter simulation

use super::{atlas_for, load_config};
use anyhow::{Context, Result};
use flare_particles::{
    BehaviorRegistry, ContainerRef, Emitter, EmitterState, ParticleBatch, ParticleInstance,
};
use serde::Serialize;
use std::rc::Rc;

pub struct SimulateArgs {
    pub config: String,
    pub frames: u32,
    pub dt: f32,
    pub seed: Option<u64>,
    pub format: String,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub frames: u32,
    pub dt: f32,
    pub pipeline: Vec<String>,
    /// Live particles after each frame
    pub counts: Vec<usize>,
    pub peak: usize,
    pub final_count: usize,
    pub max_particles: usize,
    /// Pooled plus active slots allocated
    pub capacity: usize,
    /// Instance records a renderer would upload after the last frame
    pub instance_bytes: usize,
    pub state: EmitterState,
}

pub fn simulate(args: &SimulateArgs) -> Result<SimulationReport> {
    let config = load_config(&args.config)?;
    let atlas = atlas_for(&config);
    let images = config.texture_names();

    let batch = ParticleBatch::shared();
    let container: ContainerRef = batch.clone();
    let mut emitter = Emitter::with_config(
        container,
        Rc::new(atlas),
        Rc::new(BehaviorRegistry::with_defaults()),
        images.as_slice(),
        &config,
    )
    .context("Failed to build emitter")?;
    if let Some(seed) = args.seed {
        emitter.set_seed(seed);
    }

    let mut counts = Vec::with_capacity(args.frames as usize);
    for _ in 0..args.frames {
        emitter.update(args.dt);
        counts.push(emitter.particle_count());
    }
    log::debug!("Simulated {} frame(s) of {}s", args.frames, args.dt);

    let mut instances = Vec::new();
    batch.borrow().pack_instances(&emitter, &mut instances);

    Ok(SimulationReport {
        frames: args.frames,
        dt: args.dt,
        pipeline: emitter
            .behavior_types()
            .into_iter()
            .map(String::from)
            .collect(),
        peak: counts.iter().copied().max().unwrap_or(0),
        final_count: emitter.particle_count(),
        counts,
        max_particles: emitter.max_particles(),
        capacity: emitter.capacity(),
        instance_bytes: std::mem::size_of_val(instances.as_slice()),
        state: emitter.state(),
    })
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let report = simulate(&args)?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Simulated {} frame(s) at {:.4}s ({})",
        report.frames, report.dt, args.config
    );
    println!("  Pipeline: {}", report.pipeline.join(" -> "));
    for (frame, count) in report.counts.iter().enumerate() {
        println!("  frame {:>4}: {} particle(s)", frame + 1, count);
    }
    println!();
    println!(
        "  Peak {} / max {}, final {}",
        report.peak, report.max_particles, report.final_count
    );
    println!(
        "  Pool capacity {}, instance data {} bytes ({} per particle)",
        report.capacity,
        report.instance_bytes,
        std::mem::size_of::<ParticleInstance>()
    );
    println!("  State: {:?}", report.state);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn args(path: &std::path::Path, frames: u32) -> SimulateArgs {
        SimulateArgs {
            config: path.display().to_string(),
            frames,
            dt: 0.1,
            seed: Some(3),
            format: "json".into(),
        }
    }

    #[test]
    fn simulate_counts_particles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparks.json");
        fs::write(
            &path,
            r#"{
                "lifetime": {"min": 0.3, "max": 0.3},
                "frequency": 0.1,
                "maxParticles": 10,
                "behaviors": [
                    {"type": "textureRandom", "config": {"textures": ["spark", "glow"]}},
                    {"type": "moveSpeedStatic", "config": {"min": 10, "max": 20}}
                ]
            }"#,
        )
        .unwrap();

        let report = simulate(&args(&path, 10)).unwrap();
        assert_eq!(report.counts.len(), 10);
        assert!(report.peak > 0 && report.peak <= 10);
        assert_eq!(report.state, EmitterState::Emitting);
        assert_eq!(
            report.instance_bytes,
            report.final_count * std::mem::size_of::<ParticleInstance>()
        );
        assert_eq!(report.pipeline[0], "positionParticle");
    }

    #[test]
    fn simulate_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smoke.toml");
        fs::write(
            &path,
            r#"
            frequency = 0.5
            emitterLifetime = 0.6

            [lifetime]
            min = 0.2
            max = 0.2
            "#,
        )
        .unwrap();
        let report = simulate(&args(&path, 20)).unwrap();
        assert_eq!(report.final_count, 0);
        assert_eq!(report.state, EmitterState::Complete);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = simulate(&args(&dir.path().join("nope.json"), 1)).unwrap_err();
        assert!(err.to_string().contains("nope.json"));
    }
}
