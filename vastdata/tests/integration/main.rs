//! Engine integration tests against a mocked VAST REST API

mod common;
mod crud_test;
mod data_source_test;
mod import_test;
mod version_gate_test;
