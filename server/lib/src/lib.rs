//! The authorization core of the USOS auth bot. This tracks pending
//! verifications, drives the oauth exchange with USOS, evaluates the guild's
//! admission filters and applies the outcome through the chat platform.

#![deny(warnings)]
#![warn(unused_extern_crates)]
// Enable some groups of clippy lints.
#![deny(clippy::suspicious)]
#![deny(clippy::perf)]
// Specific lints to enforce.
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::manual_let_else)]

#[macro_use]
extern crate tracing;

pub mod authorizer;
pub mod config;
pub mod filter;
pub mod granter;
pub mod guild;
pub mod idprovider;
pub mod interval;
pub mod platform;
pub mod session;
#[cfg(test)]
pub(crate) mod testkit;
pub(crate) mod utils;

/// A prelude of imports that should be imported by all other modules to
/// help make imports cleaner.
pub mod prelude {
    pub use sketching::{
        admin_debug, admin_error, admin_info, admin_warn, security_access, security_denied,
        security_info, tagged_event, EventTag,
    };
    pub use std::time::Duration;
    pub use usos_auth_proto::constants::*;
    pub use usos_auth_proto::v1::{
        AdmissionFilter, ChannelId, GuildId, MessageId, Profile, RoleId, UserId,
    };
    pub use usos_auth_proto::OperationError;

    pub use crate::utils::duration_from_epoch_now;
}
