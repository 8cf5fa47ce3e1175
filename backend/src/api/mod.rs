//! Cart API exports.

pub mod cart;
