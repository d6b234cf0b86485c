#![allow(
    clippy::collapsible_else_if,
    clippy::collapsible_if,
    clippy::module_inception,
    clippy::needless_range_loop,
    clippy::result_map_unit_fn,
    clippy::useless_format
)]
#![deny(
    clippy::get_unwrap,
    clippy::panic,
    clippy::print_stdout,
    clippy::unwrap_used,
    clippy::use_debug,
    clippy::used_underscore_binding,
    clippy::used_underscore_items
)]

mod actions;
mod config;
mod error;
mod idmap;
mod launch;
mod logger;
mod util;
mod workload;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use config::{cli, resolve_config};
use launch::{LaunchDescriptor, LaunchState, run_parent, run_second_stage};
use log::{Log, debug, error};
use nix::unistd::{getegid, geteuid, getgid, getpid, getuid};

pub fn main() -> Result<()> {
    let logger = logger::DisgLogger::new(log::LevelFilter::Trace)
        .init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;
    let cli: cli::Args = cli::Args::parse();

    if let Some(log_level) = cli.log_level {
        logger.set_level(log_level);
    } else {
        logger.set_level(log::LevelFilter::Info);
    };

    let state = LaunchState::from_environment(cli.unshare);
    logger.set_stage(state.stage_name());

    let config = resolve_config(&cli).context("Resolving config")?;

    // Now that we've loaded the config, we can set the log level and print out any deferred messages
    // emitted while we were loading the config.
    logger.set_level(config.log_level);
    logger.print_deferred();

    debug!(
        "initializing: uid={} euid={} gid={} egid={} pid={} isNs={}",
        getuid(),
        geteuid(),
        getgid(),
        getegid(),
        getpid(),
        state.in_user_ns()
    );

    let code = match state {
        LaunchState::AwaitingNamespaceCreation => {
            launch_exit_code(run_parent(&config, &LaunchDescriptor::current()))
        }
        LaunchState::AwaitingMapping => {
            launch_exit_code(run_second_stage(&LaunchDescriptor::current()))
        }
        LaunchState::Unlaunched | LaunchState::Ready => {
            if let Some(cli::Action::Config { keys }) = cli.action {
                let result = actions::config(&config, keys);
                logger.flush();
                return result;
            }
            match workload::run(&config, state) {
                Ok(()) => 0,
                Err(e) => {
                    error!("{:#}", e);
                    workload::WORKLOAD_FAILURE_EXIT_CODE
                }
            }
        }
    };

    logger.flush();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Exit code for a launcher stage. A failed workload further down the chain
/// passes its own code through untouched.
fn launch_exit_code(result: error::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(error::Error::WorkloadExit { code }) => code,
        Err(e) => {
            error!("{}", e);
            1
        }
    }
}
