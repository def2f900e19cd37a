//! Platform profiles for relaunch
//!
//! Maps the host operating system to the compiler and linker settings the
//! project needs, and assembles them into a single compiler invocation.
//! Everything in this crate is pure: no filesystem access, no processes.

pub mod command;
pub mod host;
pub mod profile;

pub use command::{CompileCommand, CompileInputs, DependencyPaths};
pub use host::HostOs;
pub use profile::{LinkItem, PlatformProfile};
