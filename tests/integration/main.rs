// Integration test module organization

pub mod common;

mod concurrency_test;
mod envelope_test;
mod registry_test;
