//! `agent-host` drives the external agent host binary as a child process.
//!
//! Every agent call is one process:
//!
//! ```text
//! HostInvocation   ← binary, subcommand, extra args, ordered --set pairs
//!     │
//!     ▼
//! HostProcess      ← tokio child; stdout read line by line, stderr drained
//!     │              in a background task, whole call bounded by a timeout
//!     ▼
//! HostOutput       ← exit code, captured text, JSON when stdout carries it
//! ```
//!
//! [`HostRunner`] is the seam callers depend on; [`ProcessRunner`] is the
//! real implementation. [`JobStore`] runs an invocation detached and tracks
//! it through marker files.

pub mod background;
pub mod error;
pub mod invocation;
pub mod runner;

pub(crate) mod process;

pub use background::{JobHandle, JobSpec, JobState, JobStatus, JobStore};
pub use error::HostError;
pub use invocation::HostInvocation;
pub use runner::{run, run_blocking, HostOutput, HostRunner, ProcessRunner};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, HostError>;
