//! Integration Test Harness
//!
//! Runs each integration test category and prints a summary.
//!
//! # Usage
//!
//! Run all tests:
//! ```
//! cargo run -p integration-tests
//! ```
//!
//! Run specific test categories:
//! ```
//! cargo test -p integration-tests --test license_tests
//! cargo test -p integration-tests --test certificate_tests
//! cargo test -p integration-tests --test framework_tests
//! ```

mod common;

use common::{CategoryResult, TestSuiteResults};
use std::process::Command;
use std::time::Instant;

/// Test category
#[derive(Debug, Clone)]
struct TestCategory {
    name: &'static str,
    description: &'static str,
    test_name: &'static str,
}

const TEST_CATEGORIES: &[TestCategory] = &[
    TestCategory {
        name: "Framework Tests",
        description: "Computed fields, nested lengths, variants, truncation",
        test_name: "framework_tests",
    },
    TestCategory {
        name: "Certificate Tests",
        description: "Proprietary certificates, X.509 chains, key extraction",
        test_name: "certificate_tests",
    },
    TestCategory {
        name: "License Tests",
        description: "License binary blobs, error alerts, packet envelope",
        test_name: "license_tests",
    },
];

fn print_banner() {
    println!("{}", "=".repeat(80));
    println!("            RDP Certificate & Licensing PDU Integration Tests");
    println!("{}", "=".repeat(80));
}

fn print_test_categories() {
    println!("Test Categories:");
    println!("{}", "-".repeat(80));
    for (i, cat) in TEST_CATEGORIES.iter().enumerate() {
        println!("  {}. {} - {}", i + 1, cat.name, cat.description);
    }
    println!("{}", "-".repeat(80));
    println!();
}

fn run_test_category(category: &TestCategory) -> CategoryResult {
    println!("\n{}", "=".repeat(80));
    println!("Running: {}", category.name);
    println!("{}", "=".repeat(80));

    let start = Instant::now();

    let output = Command::new("cargo")
        .args(["test", "-p", "integration-tests", "--test", category.test_name, "--", "--nocapture"])
        .output();

    let duration = start.elapsed();

    let (success, summary) = match output {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);

            if !stdout.is_empty() {
                println!("{}", stdout);
            }
            if !stderr.is_empty() {
                eprintln!("{}", stderr);
            }

            let success = output.status.success();
            let summary = if success {
                "PASSED".to_string()
            } else {
                format!("FAILED (exit code: {:?})", output.status.code())
            };
            (success, summary)
        }
        Err(e) => (false, format!("Failed to execute: {}", e)),
    };

    CategoryResult {
        name: category.name,
        success,
        duration,
        summary,
    }
}

fn main() {
    print_banner();
    print_test_categories();

    let mut results = TestSuiteResults::default();
    for category in TEST_CATEGORIES {
        results.push(run_test_category(category));
    }

    println!("\n{}", "=".repeat(80));
    println!("FINAL SUMMARY");
    println!("{}", "=".repeat(80));

    println!(
        "\nCategories: {} | Passed: {} | Failed: {}",
        results.categories.len(),
        results.passed(),
        results.failed()
    );
    println!("Total Duration: {:?}", results.total_duration());
    println!();

    println!("{:<30} {:<10} {:<15} {}", "Category", "Status", "Duration", "Details");
    println!("{}", "-".repeat(80));

    for result in &results.categories {
        let status = if result.success { "PASS" } else { "FAIL" };
        println!("{:<30} {:<10} {:<15?} {}", result.name, status, result.duration, result.summary);
    }

    println!("{}", "=".repeat(80));

    if results.failed() > 0 {
        println!("\nSome tests failed!");
        std::process::exit(1);
    }
    println!("\nAll tests passed!");
}
