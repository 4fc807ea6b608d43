// skyport-api: Async Rust client for the Daikin Skyport integrator API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::{AccessToken, Credentials, TokenGrant};
pub use client::SkyportClient;
pub use error::Error;
pub use models::{DeviceRecord, DeviceSummary};
pub use transport::TransportConfig;
