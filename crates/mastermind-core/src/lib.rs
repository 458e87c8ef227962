pub mod analysis;
pub mod config;
pub mod error;
pub mod options;
pub mod project;
pub mod prompt;
pub mod registry;
pub mod schema;

pub use error::{MastermindError, Result};
