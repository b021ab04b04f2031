//! NDVI Farm library crate: re-exports all modules for integration testing.
//!
//! The binary crate (`main.rs`) is the headless game entry point.
//! This library crate exposes the same modules so that `tests/` integration
//! tests can import game types, systems, and resources without needing a
//! window or GPU.

pub mod shared;
pub mod bus;
pub mod scene;
pub mod data;
pub mod ndvi;
pub mod farming;
pub mod campaign;
pub mod avatar;
pub mod autopilot;
pub mod ui;
