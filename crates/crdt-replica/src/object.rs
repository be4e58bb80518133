//! The value stored under a key, and how descriptors mutate it.

use crdt_client::{ClientError, CrdtKind, Operation, Result, Value};
use serde::{Deserialize, Serialize};

use crate::aw_map::AwMap;
use crate::clock::{Dot, HybridClock};
use crate::counter::PnCounter;
use crate::integer::IntegerCrdt;
use crate::lww_register::LwwRegister;
use crate::or_set::OrSet;
use crate::Crdt;

/// Mints dots for the mutations of one apply call.
pub struct OpContext<'a> {
    replica: &'a str,
    clock: &'a mut HybridClock,
}

impl<'a> OpContext<'a> {
    /// Stamp mutations as `replica`, drawing timestamps from `clock`.
    pub fn new(replica: &'a str, clock: &'a mut HybridClock) -> Self {
        Self { replica, clock }
    }

    /// The replica performing the mutations.
    pub fn replica(&self) -> &str {
        self.replica
    }

    /// A fresh dot, strictly greater than any previous one from this clock.
    pub fn next_dot(&mut self) -> Dot {
        Dot::new(self.replica, self.clock.now())
    }
}

/// A CRDT value of one of the five kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Object {
    /// Assign/increment integer.
    Integer(IntegerCrdt),
    /// PN counter.
    Counter(PnCounter),
    /// Observed-remove set.
    Set(OrSet),
    /// LWW string register.
    Register(LwwRegister<String>),
    /// Add-wins map.
    Map(AwMap),
}

impl Object {
    /// The empty object of `kind`.
    pub fn new(kind: CrdtKind) -> Self {
        match kind {
            CrdtKind::Integer => Self::Integer(IntegerCrdt::new()),
            CrdtKind::Counter => Self::Counter(PnCounter::new()),
            CrdtKind::Set => Self::Set(OrSet::new()),
            CrdtKind::Register => Self::Register(LwwRegister::new()),
            CrdtKind::Map => Self::Map(AwMap::new()),
        }
    }

    /// The kind of this object.
    pub fn kind(&self) -> CrdtKind {
        match self {
            Self::Integer(_) => CrdtKind::Integer,
            Self::Counter(_) => CrdtKind::Counter,
            Self::Set(_) => CrdtKind::Set,
            Self::Register(_) => CrdtKind::Register,
            Self::Map(_) => CrdtKind::Map,
        }
    }

    /// The merged value as the client layer sees it.
    pub fn value(&self) -> Value {
        match self {
            Self::Integer(i) => Value::Integer(i.value()),
            Self::Counter(c) => Value::Counter(c.value()),
            Self::Set(s) => Value::Set(s.iter().cloned().collect()),
            Self::Register(r) => Value::Register(r.value().clone()),
            Self::Map(m) => Value::Map(m.values()),
        }
    }

    /// Discard every observed update, leaving the identity value. Updates
    /// this replica has not seen yet still count after a merge.
    pub fn reset(&mut self) {
        match self {
            Self::Integer(i) => i.reset(),
            Self::Counter(c) => c.reset(),
            Self::Set(s) => s.reset(),
            Self::Register(r) => r.reset(),
            Self::Map(m) => m.reset(),
        }
    }

    /// Fail with `TypeMismatch` unless this object, and every object nested
    /// in it, has the kind its key declares.
    pub fn check_kind(&self, expected: CrdtKind) -> Result<()> {
        if self.kind() != expected {
            return Err(ClientError::TypeMismatch {
                expected,
                found: self.kind(),
            });
        }
        match self {
            Self::Map(m) => m.check_kinds(),
            _ => Ok(()),
        }
    }

    /// The map inside, if this is a map.
    pub fn as_map(&self) -> Option<&AwMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Apply one operation.
    ///
    /// Fails with `TypeMismatch` if the operation targets another kind.
    pub fn apply(&mut self, operation: &Operation, ctx: &mut OpContext<'_>) -> Result<()> {
        match (self, operation) {
            (Self::Integer(i), Operation::AssignInteger(v)) => i.assign(*v, ctx.next_dot()),
            (Self::Integer(i), Operation::IncrementInteger(d)) => i.increment(ctx.replica(), *d),
            (Self::Counter(c), Operation::IncrementCounter(d)) => c.add(ctx.replica(), *d),
            (Self::Set(s), Operation::AddElements(elements)) => {
                for element in elements {
                    let dot = ctx.next_dot();
                    s.insert(element.as_str(), dot);
                }
            }
            (Self::Set(s), Operation::RemoveElements(elements)) => {
                for element in elements {
                    s.remove(element);
                }
            }
            (Self::Register(r), Operation::AssignRegister(v)) => {
                let dot = ctx.next_dot();
                r.assign(v.clone(), dot);
            }
            (Self::Map(m), Operation::UpdateMap(ops)) => {
                for op in ops {
                    m.update(op.key(), op.operation(), ctx)?;
                }
            }
            (Self::Map(m), Operation::RemoveKeys(keys)) => {
                for key in keys {
                    m.remove(key);
                }
            }
            (this, op) => {
                return Err(ClientError::TypeMismatch {
                    expected: op.target_kind(),
                    found: this.kind(),
                })
            }
        }
        Ok(())
    }
}

impl Crdt for Object {
    fn merge(&mut self, other: &Self) {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.merge(b),
            (Self::Counter(a), Self::Counter(b)) => a.merge(b),
            (Self::Set(a), Self::Set(b)) => a.merge(b),
            (Self::Register(a), Self::Register(b)) => a.merge(b),
            (Self::Map(a), Self::Map(b)) => a.merge(b),
            // Keys carry their kind, so objects under one key never differ.
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frozen() -> u64 {
        1000
    }

    #[test]
    fn fresh_objects_read_as_identity() {
        for kind in CrdtKind::ALL {
            let obj = Object::new(kind);
            assert_eq!(obj.kind(), kind);
            assert_eq!(obj.value(), Value::identity(kind));
        }
    }

    #[test]
    fn operations_reach_the_right_crdt() {
        let mut clock = HybridClock::with_time_source(frozen);
        let mut ctx = OpContext::new("r1", &mut clock);

        let mut set = Object::new(CrdtKind::Set);
        set.apply(&Operation::AddElements(vec!["b".into(), "a".into()]), &mut ctx)
            .unwrap();
        set.apply(&Operation::RemoveElements(vec!["b".into()]), &mut ctx)
            .unwrap();
        assert_eq!(set.value(), Value::Set(vec!["a".into()]));

        let mut register = Object::new(CrdtKind::Register);
        register
            .apply(&Operation::AssignRegister("v1".into()), &mut ctx)
            .unwrap();
        register
            .apply(&Operation::AssignRegister("v2".into()), &mut ctx)
            .unwrap();
        assert_eq!(register.value(), Value::Register("v2".into()));
    }

    #[test]
    fn mismatched_operation_is_rejected() {
        let mut clock = HybridClock::with_time_source(frozen);
        let mut ctx = OpContext::new("r1", &mut clock);
        let mut counter = Object::new(CrdtKind::Counter);
        assert_eq!(
            counter.apply(&Operation::AssignInteger(1), &mut ctx),
            Err(ClientError::TypeMismatch {
                expected: CrdtKind::Integer,
                found: CrdtKind::Counter,
            })
        );
        assert_eq!(counter.value(), Value::Counter(0));
    }

    #[test]
    fn reset_reads_as_identity() {
        let mut clock = HybridClock::with_time_source(frozen);
        let mut ctx = OpContext::new("r1", &mut clock);
        let ops = [
            Operation::AssignInteger(4),
            Operation::IncrementCounter(2),
            Operation::AddElements(vec!["e".into()]),
            Operation::AssignRegister("v".into()),
        ];
        for op in &ops {
            let mut obj = Object::new(op.target_kind());
            obj.apply(op, &mut ctx).unwrap();
            assert!(!obj.value().is_identity());
            obj.reset();
            assert_eq!(obj.value(), Value::identity(op.target_kind()));
        }
    }

    #[test]
    fn nested_kind_mismatch_is_detected() {
        let mut clock = HybridClock::with_time_source(frozen);
        let mut ctx = OpContext::new("r1", &mut clock);
        let mut map = Object::new(CrdtKind::Map);
        let x = crdt_client::TypedKey::new("x", CrdtKind::Integer).unwrap();
        map.apply(
            &Operation::UpdateMap(vec![
                crdt_client::UpdateOp::new(x, Operation::AssignInteger(1)).unwrap(),
            ]),
            &mut ctx,
        )
        .unwrap();
        assert_eq!(map.check_kind(CrdtKind::Map), Ok(()));
        assert_eq!(
            map.check_kind(CrdtKind::Set),
            Err(ClientError::TypeMismatch {
                expected: CrdtKind::Set,
                found: CrdtKind::Map,
            })
        );
    }
}
