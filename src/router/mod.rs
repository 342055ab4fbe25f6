//! # Router Module
//!
//! Compiles controller routing metadata into an ordered [`RouteTable`] and
//! matches request paths against it.
//!
//! ## Compilation
//!
//! For every registered controller the full pattern of each mapped method is
//! the controller's base path followed by the method's path fragment. The
//! pattern is compiled as an anchored regular expression, so `/demo/query`
//! matches exactly that path and `/item/\d+` matches `/item/42`. Each route
//! also gets a [`ParamIndexMapping`] from parameter key to argument position,
//! and the shared list of global interceptors.
//!
//! ## Matching
//!
//! [`RouteTable::find`] scans routes in compile order and returns the first
//! full match. When nothing matches the dispatcher answers 404.
//!
//! ```rust,ignore
//! let (table, errors) = RouteTable::compile(&registry, &interceptors);
//! assert!(errors.is_empty());
//! if let Some(route) = table.find("/demo/query") {
//!     println!("{route}");
//! }
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use core::{ParamIndexMapping, Route, RouteTable};
