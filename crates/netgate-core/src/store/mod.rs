// ── Data store ──
//
// Snapshot-based storage for the firewall rule set and the auxiliary
// gateway resources.

mod collection;
mod data_store;
mod firewall;

pub use data_store::DataStore;
pub use firewall::{FirewallState, FirewallStore};
