//! Decoder and CSV exporter for Havok skeleton and animation dumps.
//!
//! A dump is decoded into a [`Skeleton`] or an [`Animation`], bone transforms are resolved to
//! root space through the parent hierarchy, and the result is written as CSV tables for the
//! host-side importer.

pub mod animation;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod hierarchy;
pub mod reader;
pub mod skeleton;
pub mod tools;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_utils;

pub use animation::{Animation, Annotation, Pose, DUMP_VERSION};
pub use config::{Config, ToolsConfig};
pub use convert::{run, BatchReport, DumpConverter};
pub use error::DecodeError;
pub use hierarchy::{global_transform, Overlay};
pub use skeleton::{HeaderPolicy, Skeleton};
pub use transform::Transform;
