//! Subcommand definitions and their terminal rendering.

pub mod conversation;
pub mod reel;
