//! Wiki module for talking to the MediaWiki backend
//!
//! This module contains:
//! - The content client for rendered pages and raw wikitext
//! - The response types of the read API

mod api;
mod client;

pub use client::WikiClient;
