//! Adapters layer
//!
//! Implementations of the outbound ports over the beacon-chain time grid
//! and in-memory duty storage.

mod duty_store;
mod network;
mod slot_time;

pub use duty_store::InMemoryDutyStore;
pub use network::NetworkConfig;
pub use slot_time::BeaconSlotTimePolicy;
