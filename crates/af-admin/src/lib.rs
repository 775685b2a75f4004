//! APIForge Admin Layer
//!
//! A single uniform REST surface over heterogeneous backend record kinds:
//! - Declarative parameter validation (format rules, attribute checks,
//!   schema allow-lists)
//! - Query criteria building for list endpoints
//! - A startup-populated resource registry with per-type capability
//!   implementations (params, criteria, formatter)
//! - The generic resource controller and the bridge proxy matcher

pub mod api;
pub mod auth;
pub mod criteria;
pub mod error;
pub mod registry;
pub mod repository;
pub mod resources;
pub mod serialize;
pub mod validation;

pub use error::{AdminError, ErrorEnvelope};
pub use registry::{ResourceDescriptor, ResourceRegistry};
