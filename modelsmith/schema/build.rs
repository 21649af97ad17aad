//! Generates the cellar design into `OUT_DIR/cellar.rs`.

use std::path::PathBuf;

use modelsmith_definitions::define_cellar_api;
use modelsmith_gen::config::GeneratorConfig;
use modelsmith_gen::generator::Generator;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../definitions/src");
    println!("cargo:rerun-if-changed=../gen/src");

    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    let config = GeneratorConfig {
        target_package: "modelsmith-schema".to_string(),
        output_dir: out_dir.clone(),
        parallel: false,
        ..GeneratorConfig::default()
    };
    let artifacts = Generator::new(config).generate(&define_cellar_api())?;
    std::fs::write(out_dir.join("cellar.rs"), artifacts.bundle()?)?;
    Ok(())
}
