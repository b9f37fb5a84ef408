//! S3 implementation of the object store.

mod client;

pub use client::S3ObjectStore;
