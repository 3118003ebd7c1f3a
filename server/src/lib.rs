//! # Replica Server
//! The authoritative side of replica: diffs every replicated instance once
//! per tick and sends the changes to the clients replicating it, and routes
//! remote calls according to their Target.

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

mod server;
mod tick_timer;

pub use server::{ReplicaServer, ServerConfig};
pub use tick_timer::TickTimer;
