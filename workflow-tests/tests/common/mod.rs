//! Common test utilities for workflow integration tests.

#![allow(dead_code)]

use std::time::Duration;
use workflow_tests::{wait_for_services, WorkflowTestContext};

/// Default timeout for waiting on services.
pub const SERVICE_TIMEOUT: Duration = Duration::from_secs(60);

/// Whether workflow tests are enabled. They require both services (and
/// their backing stores) to be running, so they are strictly opt-in.
pub fn enabled() -> bool {
    std::env::var("WORKFLOW_TESTS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Create a new workflow test context, ensuring services are healthy.
pub async fn setup() -> WorkflowTestContext {
    wait_for_services(SERVICE_TIMEOUT)
        .await
        .expect("Services not healthy - start credits-service and mentor-service first");

    WorkflowTestContext::new()
        .await
        .expect("Failed to create workflow test context")
}

/// Macro to skip workflow tests unless explicitly enabled.
#[macro_export]
macro_rules! skip_unless_enabled {
    () => {
        if !common::enabled() {
            eprintln!("Skipping workflow test (set WORKFLOW_TESTS=1 to run)");
            return;
        }
    };
}
