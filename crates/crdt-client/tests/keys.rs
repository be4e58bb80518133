//! Key minting properties across every service.

use crdt_client::prelude::*;
use crdt_client::{ClientError, Kind, Operation, SetKind};
use proptest::prelude::*;

fn valid_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.-]{1,24}"
}

proptest! {
    #[test]
    fn get_key_is_deterministic(name in valid_name()) {
        prop_assert_eq!(IntegerService::new().get_key(&name).unwrap(), IntegerService::new().get_key(&name).unwrap());
        prop_assert_eq!(CounterService::new().get_key(&name).unwrap(), CounterService::new().get_key(&name).unwrap());
        prop_assert_eq!(SetService::new().get_key(&name).unwrap(), SetService::new().get_key(&name).unwrap());
        prop_assert_eq!(RegisterService::new().get_key(&name).unwrap(), RegisterService::new().get_key(&name).unwrap());
        prop_assert_eq!(AwMapService::new().get_key(&name).unwrap(), AwMapService::new().get_key(&name).unwrap());
    }

    #[test]
    fn kinds_never_collide(name in valid_name()) {
        let keys = [
            IntegerService::new().get_key(&name).unwrap().typed(),
            CounterService::new().get_key(&name).unwrap().typed(),
            SetService::new().get_key(&name).unwrap().typed(),
            RegisterService::new().get_key(&name).unwrap().typed(),
            AwMapService::new().get_key(&name).unwrap().typed(),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                prop_assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn whitespace_names_are_rejected(name in "[ \t]{0,8}") {
        let is_invalid = matches!(
            SetService::new().get_key(&name),
            Err(ClientError::InvalidArgument(_))
        );
        prop_assert!(is_invalid);
    }
}

#[test]
fn dynamic_key_path_reports_type_mismatch() {
    let counter_key = CounterService::new().get_key("z").unwrap().typed();
    let err = SetService::new().typed_key(&counter_key).unwrap_err();
    assert_eq!(
        err,
        ClientError::TypeMismatch {
            expected: SetKind::KIND,
            found: CrdtKind::Counter,
        }
    );
    assert!(err.is_construction_error());
}

#[test]
fn runtime_descriptor_checks_kind() {
    let register = RegisterService::new().get_key("r").unwrap().typed();
    assert!(matches!(
        UpdateOp::new(register.clone(), Operation::IncrementCounter(1)),
        Err(ClientError::TypeMismatch { .. })
    ));
    assert!(UpdateOp::new(register, Operation::AssignRegister("v".into())).is_ok());
}
