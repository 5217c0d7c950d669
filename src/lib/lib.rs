pub mod adapters;
pub mod config;
pub mod core;
pub mod service;
pub mod storage;

#[cfg(test)]
mod tests;
