pub mod cli;
pub mod config;
pub mod finding;
pub mod git_binary;
pub mod git_history;
pub mod github;
pub mod gitlab;
pub mod models;
pub mod rate_limit;
pub mod reporter;
pub mod scanner;
pub mod session;
pub mod signatures;
pub mod source_control;
