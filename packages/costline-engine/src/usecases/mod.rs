//! Usecase layer: the estimating service over an injected store

mod estimating_service;

pub use estimating_service::{reconcile_area, EstimatingService};
