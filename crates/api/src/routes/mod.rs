//! Route Handlers

pub mod model;
pub mod predictions;
