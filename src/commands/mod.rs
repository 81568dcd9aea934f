//! CLI command implementations for shopping-cart-service.
//!
//! - `config`: Configuration file generation

pub mod config;

// Re-export command functions
pub use config::command_config;
