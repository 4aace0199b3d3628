//! Compose manifest decoding
//!
//! Turns a compose file into a typed [`Manifest`]. Decoding is lenient below
//! the root: fields of an unexpected shape become empty and are reported as
//! [`Warning`]s instead of failing the document.

pub mod config;
pub mod field;
pub mod parser;

pub use config::{Manifest, NetworkConfig, ServiceConfig, VolumeConfig};
pub use field::{Build, Command, External};
pub use parser::{ComposeParser, Warning};
