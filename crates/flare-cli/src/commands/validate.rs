//! Emitter config validation command

use super::{atlas_for, load_config};
use anyhow::{bail, Result};
use flare_particles::{BehaviorRegistry, ContainerRef, Emitter, EmitterConfig, ParticleBatch};
use serde::Serialize;
use std::rc::Rc;

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    /// Behavior types the registry doesn't know; skipped at runtime
    pub unknown_behaviors: Vec<String>,
    pub pipeline: Vec<String>,
    pub error: Option<String>,
}

pub fn validate_config(config: &EmitterConfig) -> ValidationReport {
    let registry = Rc::new(BehaviorRegistry::with_defaults());
    let unknown_behaviors: Vec<String> = config
        .behavior_types()
        .into_iter()
        .filter(|name| !registry.contains(name))
        .map(String::from)
        .collect();

    let container: ContainerRef = ParticleBatch::shared();
    let mut emitter = Emitter::new(container, Rc::new(atlas_for(config)), registry);
    match emitter.init(config) {
        Ok(()) => ValidationReport {
            valid: true,
            unknown_behaviors,
            pipeline: emitter
                .behavior_types()
                .into_iter()
                .map(String::from)
                .collect(),
            error: None,
        },
        Err(err) => ValidationReport {
            valid: false,
            unknown_behaviors,
            pipeline: Vec::new(),
            error: Some(err.to_string()),
        },
    }
}

pub fn run(path: &str, format: &str) -> Result<()> {
    let config = load_config(path)?;
    let report = validate_config(&config);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report_text(path, &report);
    }

    if let Some(error) = report.error {
        bail!("Invalid emitter config '{}': {}", path, error);
    }
    Ok(())
}

fn print_report_text(path: &str, report: &ValidationReport) {
    if report.valid {
        println!("{}: OK", path);
        println!("  Pipeline: {}", report.pipeline.join(" -> "));
    } else {
        println!("{}: INVALID", path);
    }
    for name in &report.unknown_behaviors {
        println!("  [WARN ] unknown behavior '{}' will be skipped", name);
    }
    if let Some(error) = &report.error {
        println!("  [ERROR] {}", error);
    }
}
