//! Test doubles for the retrieval and generation ports.

mod mocks;

pub use mocks::{MockGenerator, MockRetriever};
