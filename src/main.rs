mod args;
mod summary;

use clap::Parser;
use log::{info, warn};
use snafu::ErrorCompat;

fn main() {
    let args = args::Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    info!("args: {:?}", args);

    let res = summary::run_summary(&args);

    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        for cause in e.iter_chain().skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
