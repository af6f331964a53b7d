//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a backend is alive.
//!
//! # Tasks
//! - Sweep: Removes expired and corrupt records from the durable local store

mod sweep;

pub use sweep::spawn_sweep_task;
