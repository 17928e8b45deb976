// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Hostfleet
//!
//! A declarative host inventory compiler for SSH-based cluster deployments.
//!
//! ## Overview
//!
//! Hostfleet turns a loosely-typed hosts YAML document into a list of fully
//! validated, typed, per-machine connection descriptors usable by downstream
//! deployment operations:
//!
//! - Merge global defaults into every host record (host values win)
//! - Coerce and validate every value against a schema registry
//! - Expand one logical host into N independently deployable replicas
//! - Render `${name}` variable references per replica, including the
//!   replica's own `instances_sequence`
//! - Reject duplicate host identities and malformed SSH material
//!
//! ## Modules
//!
//! - [`inventory`]: Inventory parsing, validation, expansion, and rendering
//! - [`variables`]: Named variables and string rendering
//! - [`cli`]: Command-line interface
//! - [`error`]: Error hierarchy
//!
//! ## Example
//!
//! ```yaml
//! global:
//!   user: root
//!   ssh_port: 22
//!   private_key_file: /root/.ssh/id_rsa
//!
//! hosts:
//!   - host: cache-1
//!     hostname: 10.0.1.10
//!     instances: 3
//!     envs:
//!       - "PORT=1121${instances_sequence}"
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod error;
pub mod inventory;
pub mod variables;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use error::{HostfleetError, InventoryError, Result, VariableError};
pub use inventory::{
    find_hosts_file, hosts_schema, HostConfig, HostValidator, HostsCompiler, InventoryHasher,
    Requirement, SchemaItem, SchemaRegistry, Value,
};
pub use variables::{Variable, Variables};
