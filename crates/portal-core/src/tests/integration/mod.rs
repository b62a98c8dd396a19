#![cfg(test)]

pub mod config_tests;
pub mod order_flow_tests;
