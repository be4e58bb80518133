//! # crdt-replica
//!
//! An in-process replicated store for [`crdt-client`](crdt_client).
//!
//! A [`Replica`] holds CRDT objects keyed by [`TypedKey`](crdt_client::TypedKey),
//! applies update descriptors atomically, persists the touched objects to a
//! pluggable backend, and merges with other replicas by exchanging full
//! state.
//!
//! ## Quick Start
//!
//! ```
//! use crdt_client::prelude::*;
//! use crdt_replica::{Replica, ReplicaConfig};
//!
//! let mut a = CrdtClient::new(Replica::new(ReplicaConfig::new("a")).unwrap());
//! let mut b = CrdtClient::new(Replica::new(ReplicaConfig::new("b")).unwrap());
//!
//! a.add_to_set("tags", ["red"]).unwrap();
//! b.add_to_set("tags", ["blue"]).unwrap();
//!
//! a.store_mut().merge(b.store()).unwrap();
//! assert_eq!(a.read_set("tags").unwrap(), vec!["blue", "red"]);
//! ```
//!
//! ## Values
//!
//! | Kind | CRDT | Concurrent writes |
//! |------|------|-------------------|
//! | Integer | [`IntegerCrdt`] | latest assign wins, increments on it are summed |
//! | Counter | [`PnCounter`] | summed |
//! | Set | [`OrSet`] | add wins over unobserved remove |
//! | Register | [`LwwRegister`] | latest timestamp wins, replica id breaks ties |
//! | Map | [`AwMap`] | update wins over unobserved remove |
//!
//! ## Backends
//!
//! | Backend | Feature flag | Use case |
//! |---------|-------------|----------|
//! | [`MemoryStore`] | *(always available)* | Testing, prototyping |
//! | `SqliteStore` | `sqlite` | Edge Linux, mobile, desktop |

#![warn(missing_docs)]

mod aw_map;
mod config;
mod counter;
mod crdt;
mod envelope;
mod integer;
mod lww_register;
mod memory;
mod object;
mod or_set;
mod replica;
mod shared;
#[cfg(feature = "sqlite")]
mod sqlite;
mod traits;

pub mod clock;

pub use aw_map::AwMap;
pub use config::ReplicaConfig;
pub use counter::{GCounter, PnCounter};
pub use crdt::Crdt;
pub use envelope::{
    EnvelopeError, VersionedEnvelope, CURRENT_VERSION, ENVELOPE_HEADER_SIZE, MAGIC_BYTE,
};
pub use integer::IntegerCrdt;
pub use lww_register::LwwRegister;
pub use memory::MemoryStore;
pub use object::{Object, OpContext};
pub use or_set::OrSet;
pub use replica::{Replica, ReplicaBuilder, ReplicaState};
pub use shared::SharedReplica;
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteError, SqliteStore};
pub use traits::StateStore;
