pub mod cli;
pub mod load_config;
pub mod platforms;

pub use cli::{run, Cli, Commands};
