pub mod client;
pub mod collection;
pub mod config;
pub mod error;
pub mod publish;
pub mod reorganize;
pub mod spec;
#[cfg(test)]
mod testing;
pub mod workspace;
