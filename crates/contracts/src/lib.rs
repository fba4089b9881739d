//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Frame Model
//! - Every device counts frames on its own clock since start
//! - The transmitter's clock signal bounds blocks of `d_clock` frames
//! - After drift correction only the row position is meaningful; frame values are dropped

mod blueprint;
pub mod codec;
mod device_id;
mod error;
mod sink;
mod sync;
mod sync_engine_config;
mod track;

pub use blueprint::*;
pub use device_id::DeviceId;
pub use error::*;
pub use sink::*;
pub use sync::*;
pub use sync_engine_config::*;
pub use track::*;
