//! Integration tests for the Agora server
//!
//! Each test builds a fresh in-process server with its own store, so tests
//! never share accounts or rate-limit counters.

mod admin;
mod posts_comments;
