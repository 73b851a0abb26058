//! grd GitLab - GitLab REST v4 integration for grd
//!
//! This crate implements [`grd_core::HostingApi`] on top of the GitLab REST
//! API: group lookup, branch listing and branch/protection management.

mod client;
mod error;
mod types;

pub use client::GitLabClient;
pub use error::{Error, Result};
