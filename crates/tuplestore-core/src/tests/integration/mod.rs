#![cfg(test)]

pub mod common;
pub mod storage_tests;
