mod common;
mod run_sampling;
mod sampling_driver;

use crate::common::*;
use clap::error::ErrorKind;
use run_sampling::*;
use sampling_driver::SamplingError;
use std::process::ExitCode;

fn init_logger(level: log::LevelFilter) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .init();
}

fn main() -> ExitCode {
    let args = match SampleArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    init_logger(args.log_level());

    match run_sampling(&args) {
        Ok(()) => {
            info!("Done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{:#}", err);
            if err.downcast_ref::<SamplingError>().is_some() {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}
