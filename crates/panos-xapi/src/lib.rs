//! XML API session for PAN-OS devices.
//!
//! Provides the [`DeviceSession`] capability trait consumed by provisioning
//! code, and [`XapiClient`], the concrete session speaking the device's XML
//! management API: key-based authentication, configuration `set` calls, and
//! synchronous commits with job polling.

#![deny(missing_docs)]

pub mod client;
pub mod response;

pub use client::{DeviceSession, XapiClient, XapiClientBuilder};

/// Convenient result alias that reuses the shared device error type.
pub type Result<T> = panos_core::Result<T>;
