// Gateway file to expose integration tests from the integration/ subdirectory
// This file allows Rust's test runner to discover tests in subdirectories

#[path = "common/mod.rs"]
mod common;

#[path = "integration/test_retrieval_properties.rs"]
mod test_retrieval_properties;

#[path = "integration/test_ivf_search.rs"]
mod test_ivf_search;

#[path = "integration/test_artifact_loading.rs"]
mod test_artifact_loading;

#[path = "integration/test_settings_resolution.rs"]
mod test_settings_resolution;

#[path = "integration/test_fastembed_retrieval.rs"]
mod test_fastembed_retrieval;
