//! Tests for core_kernel error types

use core_kernel::error::CoreError;

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("Invalid input");

    match error {
        CoreError::Validation(msg) => assert_eq!(msg, "Invalid input"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_invalid_state() {
    let error = CoreError::invalid_state("Cannot transition from COMPLETED to PROCESSING");

    match error {
        CoreError::InvalidStateTransition(msg) => assert!(msg.contains("Cannot transition")),
        _ => panic!("Expected InvalidStateTransition error"),
    }
}

#[test]
fn test_core_error_not_found() {
    let error = CoreError::not_found("Task not found");

    match error {
        CoreError::NotFound(msg) => assert_eq!(msg, "Task not found"),
        _ => panic!("Expected NotFound error"),
    }
}

#[test]
fn test_core_error_display() {
    let error = CoreError::validation("Test error");
    let display = format!("{}", error);

    assert!(display.contains("Validation error"));
}

#[test]
fn test_core_error_configuration() {
    let error = CoreError::configuration("fraud_threshold out of range");

    match error {
        CoreError::Configuration(msg) => assert_eq!(msg, "fraud_threshold out of range"),
        _ => panic!("Expected Configuration error"),
    }
}
