//! Core logic layer
//!
//! State primitives, the component runtime, ports, and the demo application.
//! Only `FrontendEvent` crosses over from the frontend; nothing here draws.

pub mod app_core;
pub mod event_bridge;
pub mod hooks;
pub mod input_router;
pub mod ports;
pub mod runtime;

pub use app_core::DemoApp;
