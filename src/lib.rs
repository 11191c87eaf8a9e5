//! Client for the Buildly product, release, collaboration and feedback services.

pub mod api;
pub mod cache;
pub mod config;
pub mod event;
pub mod gateway;
pub mod session;

#[cfg(test)]
mod testing;
