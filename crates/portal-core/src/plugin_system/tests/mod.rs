// Test modules for the plugin system

mod dependency_tests;
mod resolver_tests;
