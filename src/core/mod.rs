//! Core library components.
//!
//! This module contains the reusable logic for recipient resolution,
//! manifest mutation, re-encryption, and configuration handling.

pub mod cipher;
pub mod config;
pub mod constants;
pub mod context;
pub mod domain;
pub mod manifest;
pub mod mutator;
pub mod reencrypt;
pub mod resolver;
pub mod storage;
pub mod store;
pub mod types;
pub mod validation;
