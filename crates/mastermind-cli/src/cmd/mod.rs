pub mod agent;
pub mod interactive;
pub mod jobs;
pub mod list;
