pub mod batch;
pub mod cli;
pub mod commands;
pub mod config;
pub mod git;
pub mod infrastructure;
pub mod mutator;
pub mod review;
