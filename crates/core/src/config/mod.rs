//! Configuration loading and schema definitions
//!
//! One [`Config`] is built at process start and handed to every component.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
