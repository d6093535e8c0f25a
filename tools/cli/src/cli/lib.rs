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

#[macro_use]
extern crate tracing;

use std::process::ExitCode;

include!("../opt/usos_auth.rs");

pub mod common;
pub mod config;
pub mod login;

impl UsosAuthParser {
    pub fn debug(&self) -> bool {
        if let UsosAuthOpt::Version = self.commands {
            println!("usos-auth {}", env!("CARGO_PKG_VERSION"));
        }
        self.debug
    }

    pub async fn exec(&self) -> ExitCode {
        let result = match &self.commands {
            UsosAuthOpt::Login => login::exec_login(self).await,
            UsosAuthOpt::Check(copt) => login::exec_check(self, copt).await,
            UsosAuthOpt::Config => config::exec_config(self),
            UsosAuthOpt::Version => Ok(()),
        };

        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("{}", e);
                ExitCode::FAILURE
            }
        }
    }
}
