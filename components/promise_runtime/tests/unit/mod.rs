//! Unit tests for promise_runtime


mod event_loop_test;
mod resolution_test;
