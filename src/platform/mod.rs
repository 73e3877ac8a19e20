//! Host glue
//!
//! Browser builds expose the core to JavaScript through `web`. Native hosts
//! drive [`crate::sim::Arcade`] directly (see the headless runner binary).

#[cfg(target_arch = "wasm32")]
pub mod web;
