//! Portal cart backend: talks to the search service on behalf of the cart.

pub mod api;
pub mod config;
pub mod portal_utils;

#[cfg(test)]
mod test_utils;
