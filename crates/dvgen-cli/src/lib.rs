//! # dvgen-cli: Command-Line Interface
//!
//! ## Subcommands
//!
//! - `compile`: compile a type universe and print its rule trees
//! - `validate`: validate an object against one compiled type
//! - `equiv`: compare a declarative and a reference error list
//!
//! Every handler returns `Ok(true)` on success, `Ok(false)` when the
//! command ran but the result is negative (rejected types, validation
//! errors, FAIL), and `Err` when it could not run at all.
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers delegate to the library crates; file loading lives in
//!   [`input`].
//! - Results go to stdout, logs to stderr.

pub mod compile;
pub mod equiv;
pub mod input;
pub mod validate;
