//! This is the library of the lgtm bot.
pub mod config;
pub mod github;
pub mod lgtm;
pub mod owners;
pub mod utils;
