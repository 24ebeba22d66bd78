//! Integration tests for the crawler
//!
//! `crawl_tests` drives the engine with an in-memory link graph;
//! `http_tests` runs the full stack against wiremock servers.

mod crawl_tests;
