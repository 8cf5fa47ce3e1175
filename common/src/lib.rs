//! Cart models and state transitions shared by every cart consumer.

extern crate serde;


pub mod cart_state;
pub mod cart_object;
pub mod cart_share;
pub mod facet;
pub mod search_query;
pub mod search_result;
