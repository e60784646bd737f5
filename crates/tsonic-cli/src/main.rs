use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let args = tsonic_cli::args::CliArgs::parse();
    match tsonic_cli::driver::run(&args) {
        Ok(exit) => exit,
        Err(error) => {
            eprintln!("tsonic: {error:#}");
            std::process::ExitCode::FAILURE
        }
    }
}
