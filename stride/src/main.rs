mod args;
mod config;
mod run;
use anyhow::Result;
use args::{Args, Mode};
use clap::Parser;
use config::RunConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mode = args.mode;
    let config = RunConfig::from(args);

    match mode {
        Mode::Train => {
            run::train(&config)?;
        }
        Mode::Eval => {
            run::evaluate(&config)?;
        }
        Mode::ShowConfig => {
            print!("{}", serde_yaml::to_string(&config)?);
        }
    }

    Ok(())
}
