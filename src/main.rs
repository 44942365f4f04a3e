use std::{env, path::PathBuf, process::ExitCode};

use canonical_orientation::{
    config::{MeasureConfig, TransformOptions},
    enums::CanonicalAxisId,
    transform::CanonicalTransform,
    vector::Vector3,
};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("AuxInfo_v2.csv"));
    let vector = args.collect::<Vec<_>>().join(" ");

    let config = match MeasureConfig::from_path(&path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let (transform, active) = CanonicalTransform::build(Some(&config), &TransformOptions::default());
    if !active {
        if let Some(err) = transform.failure() {
            eprintln!("transform inactive: {err}");
        }
        return ExitCode::FAILURE;
    }

    for axis in CanonicalAxisId::ALL {
        if let Some(rotation) = transform.rotation(axis) {
            println!("{axis}: {rotation}");
        }
    }

    if vector.is_empty() {
        return ExitCode::SUCCESS;
    }
    let mut vector: Vector3 = match vector.parse() {
        Ok(vector) => vector,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    match transform.apply_product_transform(&mut vector) {
        Ok(()) => {
            println!("{vector}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
