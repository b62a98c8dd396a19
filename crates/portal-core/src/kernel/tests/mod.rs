// Test modules for the kernel

mod bootstrap_tests;
mod error_tests;
