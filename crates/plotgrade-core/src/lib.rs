//! plotgrade-core: Cartesian graph engine for interactive exam questions.
//!
//! This crate holds the graph data model, the safe expression evaluator,
//! function sampling, the drawable-primitive renderer, answer grading and
//! the authoring session that the rest of plotgrade builds on.

pub mod config;
pub mod error;
pub mod expr;
pub mod grading;
pub mod loader;
pub mod mapper;
pub mod model;
pub mod render;
pub mod report;
pub mod sampler;
pub mod session;
