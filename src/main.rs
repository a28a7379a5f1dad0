extern crate osh;

use osh::shell::{Config, Shell};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // OSH_LOG takes the usual env-filter syntax, e.g. OSH_LOG=osh=debug
    let filter = EnvFilter::try_from_env("OSH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    let mut s = Shell::new(Config::from_env());
    s.run_interactive()
}
