//! This module defines concrete implementations of the required outbound ports
//! Outbounds ports are things in the outside world that we reach out to

pub mod s3;
pub mod sns;

#[cfg(any(test, feature = "mock"))]
pub mod memory;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
