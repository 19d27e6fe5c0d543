//! Core logic for qrgen.
//!
//! This crate contains the QR encoder, the storage backend abstraction and the
//! pipeline that ties them together. It has ZERO web dependencies.
//!
//! # Modules
//!
//! - `qr` - QR symbol encoding and the encode-then-store pipeline
//! - `storage` - Local filesystem and S3 image stores

pub mod qr;
pub mod storage;
