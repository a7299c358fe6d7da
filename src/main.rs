use anyhow::Result;
use beamline_rs::{run, Config};
use env_logger::Env;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cfg = Config::new()?;
    run(cfg)
}
