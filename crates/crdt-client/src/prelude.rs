//! Convenient re-exports for common usage.
//!
//! ```
//! use crdt_client::prelude::*;
//! ```

pub use crate::AwMapService;
pub use crate::CounterService;
pub use crate::CrdtClient;
pub use crate::CrdtKind;
pub use crate::CrdtService;
pub use crate::IntegerService;
pub use crate::RegisterService;
pub use crate::SetService;
pub use crate::StoreClient;
pub use crate::TypedKey;
pub use crate::UpdateOp;
pub use crate::Value;
pub use crate::{CounterKey, IntegerKey, MapKey, RegisterKey, SetKey};
