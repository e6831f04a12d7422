//! CLI command implementations

pub mod config;
pub mod fetch;
pub mod list;
pub mod location;

pub use config::execute as config;
pub use fetch::execute as fetch;
pub use list::execute as list;
pub use location::execute as location;
