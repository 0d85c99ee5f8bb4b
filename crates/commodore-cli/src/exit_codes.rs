//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Extraction error - a manager could not process its input
pub const EXTRACT_ERROR: i32 = 2;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;

/// Configuration error - invalid manager configuration (sysexits.h EX_CONFIG)
pub const CONFIG_ERROR: i32 = 78;
