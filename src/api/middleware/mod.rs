//! Request middleware.

pub mod audit;
