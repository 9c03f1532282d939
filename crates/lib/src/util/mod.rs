//! Shared utilities.
//!
//! Hashing helpers and, under test, filesystem fixtures.

pub mod hash;

#[cfg(test)]
pub mod testutil;
