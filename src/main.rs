use clap::Parser;
use log::error;

use coreserve::config::{Args, Config};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from(Args::parse());
    if let Err(e) = coreserve::gdb::serve(&config) {
        error!("{}", e);
        std::process::exit(1);
    }
}
