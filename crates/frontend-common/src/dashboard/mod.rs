//! Dashboard panels

pub mod my_builds;

pub use my_builds::{builds_loader, MyBuilds};
