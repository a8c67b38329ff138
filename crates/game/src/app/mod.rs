pub(crate) mod bootstrap;
mod config;
mod console;
mod controller;
pub(crate) mod loop_runner;
