pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use setup::{body_text, cookie_token, TestApp, TestAppBuilder, TEST_SECRET};
