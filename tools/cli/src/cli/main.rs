#![deny(warnings)]
#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::unreachable)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]
// We allow expect since it forces good error messages at the least.
#![allow(clippy::expect_used)]

use clap::Parser;
use sketching::LogLevel;
use std::process::ExitCode;
use tokio::runtime;
use tokio::signal::unix::{signal, SignalKind};
use usos_auth_cli::UsosAuthParser;

async fn signal_handler(opt: UsosAuthParser) -> ExitCode {
    // We need a signal handler to deal with a few things that can occur during runtime, especially
    // sigpipe on linux.

    let mut signal_quit = signal(SignalKind::quit()).expect("Invalid Signal");
    let mut signal_term = signal(SignalKind::terminate()).expect("Invalid Signal");
    let mut signal_pipe = signal(SignalKind::pipe()).expect("Invalid Signal");

    tokio::select! {
        code = opt.exec() => {
            code
        }
        _ = signal_quit.recv() => {
            ExitCode::SUCCESS
        }
        _ = signal_term.recv() => {
            ExitCode::SUCCESS
        }
        _ = signal_pipe.recv() => {
            ExitCode::SUCCESS
        }
    }
}

fn main() -> ExitCode {
    let opt = UsosAuthParser::parse();

    let started = if opt.debug() {
        sketching::start_logging(LogLevel::Debug, &[])
    } else {
        sketching::start_logging(LogLevel::Info, &["usos_auth_client=warn"])
    };
    if let Err(e) = started {
        eprintln!("ERROR! Unable to start tracing {:?}", e);
        return ExitCode::FAILURE;
    }

    let rt = runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to initialise tokio runtime!");

    rt.block_on(signal_handler(opt))
}
