// Test modules for the order pipeline
