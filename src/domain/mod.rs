// Metric data model
pub mod types;

// Wire encodings and request signing
pub mod protocol;

// Repository traits
pub mod repositories;

// Domain-specific error types
pub mod errors;
