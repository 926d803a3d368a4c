//! frame-bridge core library: rosbridge client, frame display bridge, and browser viewer
//! used by the `frame-bridge` CLI.

pub mod bridge;
pub mod config;
pub mod display;
pub mod init;
pub mod rosbridge;
pub mod topic;
pub mod viewer;
