//! Dispatch acceptance scenarios using Cucumber.
//!
//! ```bash
//! cargo test --test acceptance
//! ```

#[path = "../common/mod.rs"]
mod common;
mod steps;

use cucumber::World;
use steps::dispatch::DispatchWorld;

#[tokio::main]
async fn main() {
    println!("\n=== Running Dispatch Acceptance Tests ===\n");
    DispatchWorld::cucumber()
        .fail_on_skipped()
        .run_and_exit("tests/acceptance/features")
        .await;
}
