//! # crdt-client
//!
//! Typed keys and update builders for CRDTs held in a replicated store.
//!
//! The crate never talks to a network by itself. It mints keys, builds
//! update descriptors, and hands them to a [`StoreClient`] implementation
//! that owns replication and conflict resolution.
//!
//! ## Quick Start
//!
//! ```
//! use crdt_client::prelude::*;
//!
//! let maps = AwMapService::new();
//! let ints = IntegerService::new();
//! let counters = CounterService::new();
//!
//! let profile = maps.get_key("profile").unwrap();
//! let age = ints.get_key("age").unwrap();
//! let visits = counters.get_key("visits").unwrap();
//!
//! // One descriptor, applied by the store as one atomic submission.
//! let update = maps
//!     .update_map(&profile, [
//!         ints.assign_integer(&age, 31),
//!         counters.increment_counter(&visits, 1),
//!     ])
//!     .unwrap();
//! assert_eq!(update.leaf_count(), 2);
//! ```
//!
//! ## Kinds
//!
//! | Kind | Service | Read type |
//! |------|---------|-----------|
//! | Integer | [`IntegerService`] | `i64` |
//! | Counter | [`CounterService`] | `i64` |
//! | Set | [`SetService`] | `Vec<String>` |
//! | Register | [`RegisterService`] | `String` |
//! | Map | [`AwMapService`] | `BTreeMap<TypedKey, Value>` |
//!
//! A key that was never written reads as its kind's identity value.

#![warn(missing_docs)]

mod aw_map;
mod client;
mod counter;
mod error;
mod integer;
mod key;
mod register;
mod service;
mod set;
mod update;
mod value;

pub mod prelude;

pub use aw_map::AwMapService;
pub use client::{CrdtClient, StoreClient};
pub use counter::CounterService;
pub use error::{ClientError, Result};
pub use integer::IntegerService;
pub use key::{
    CounterKey, CounterKind, CrdtKind, IntegerKey, IntegerKind, Key, Kind, MapKey, MapKind,
    RegisterKey, RegisterKind, SetKey, SetKind, TypedKey,
};
pub use register::RegisterService;
pub use service::CrdtService;
pub use set::SetService;
pub use update::{Operation, UpdateOp};
pub use value::Value;
