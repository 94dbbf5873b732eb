//! pdist-bench - pairwise-distance kernel benchmark harness
//!
//! Usage:
//!   pdist-bench                          # build with cmake/make, run all cases
//!   pdist-bench --skip-build             # reuse an existing ./build/main
//!   pdist-bench --filter Odd             # run a subset of the catalog
//!   pdist-bench --list                   # show the case catalog
//!   pdist-bench --json                   # append a JSON summary

use clap::Parser;
use pdist_bench::{catalog, harness, logging, output, runner, Cli, DEFAULT_CATALOG};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format);
    output::set_color(!cli.no_color);

    if cli.list {
        print!("{}", catalog::render_catalog(DEFAULT_CATALOG));
        return ExitCode::SUCCESS;
    }

    runner::install_interrupt_handler();
    let config = cli.to_config();

    match harness::run(&config, DEFAULT_CATALOG) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            if e.is_build_failure() {
                output::warning("Build aborted, no cases were run");
            }
            e.exit_code()
        }
    }
}
