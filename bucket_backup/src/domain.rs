//! This module defines all members of the backup domain

pub mod models;
pub mod ports;
pub mod services;
