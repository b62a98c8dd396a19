// Test modules for the worker

mod schedule_tests;
