//! Library integration tests against the public API.

mod push_flow_tests;
