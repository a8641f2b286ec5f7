//! Unit tests for the capability bridge module.
//!
//! Tests are organised by concern: naming and registry rules, schema
//! coercion and validation, connection profiles and credential parsing, and
//! the services driven through a mocked protocol client.

mod domain_tests;
