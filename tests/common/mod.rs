//! Shared test utilities for Packline
//!
//! Provides the scriptable warehouse-backend stub used by the integration
//! tests, plus canned fixtures in its wire shape.

pub mod stub_backend;
