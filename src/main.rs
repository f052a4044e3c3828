use std::process::ExitCode;

use reflecto_nn::config::TrainingConfig;
use reflecto_nn::pipeline;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match TrainingConfig::from_env().and_then(|config| pipeline::run(&config)) {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("training failed: {err}");
            eprintln!("error: {err}");
            err.exit_code()
        }
    }
}
