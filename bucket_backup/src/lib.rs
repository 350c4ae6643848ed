#![deny(missing_docs)]
//! This crate copies objects from a source bucket into destination buckets chosen by key prefix,
//! following the hexagonal architecture pattern

pub mod domain;
pub mod outbound;
