//! HTTP client shared by the carrier integrations

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
