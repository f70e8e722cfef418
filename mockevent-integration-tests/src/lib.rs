//! Integration tests for `mockevent`
//!
//! The tests in this crate drive the observation engine end to end through
//! `mockevent-testing`'s scripted mocks: an object under test registers
//! listeners on a mock, the test fires events and checks what the listeners
//! received.

// This is a test-only crate
#![cfg(test)]
