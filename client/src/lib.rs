//! # Replica Client
//! Applies the snapshots and diffs a replica server sends, runs the remote
//! calls addressed to this client, and forwards server-bound calls.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use replica_shared::{
        BitReader, BitWrite, BitWriter, ConstBitLength, Serde, SerdeErr, UnsignedInteger,
        UnsignedVariableInteger,
    };
}

mod client;
mod client_config;

pub use client::ReplicaClient;
pub use client_config::ClientConfig;
