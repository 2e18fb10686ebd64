//! CozEats API client
//!
//! Talks JSON to the CozEats REST backend and implements
//! [`cozeats_core::Backend`] so the screen models can use it directly.

pub mod client;
pub mod error;
pub mod requests;

pub use client::HttpBackend;
pub use error::{ApiError, ErrorBody};

pub use cozeats_core::config::DEFAULT_API_URL;
