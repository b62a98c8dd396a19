// Test modules for the storage system

mod config_tests;
