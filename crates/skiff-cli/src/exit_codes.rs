//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - unmet version requirements or invalid configuration
pub const VALIDATION_ERROR: i32 = 2;

/// Package error - invalid package definition or import graph
pub const PACKAGE_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Registry error - skeleton missing or registry unreachable
pub const REGISTRY_ERROR: i32 = 6;
