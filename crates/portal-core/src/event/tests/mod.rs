// Test module for the event system
