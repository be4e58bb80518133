use crate::key::{SetKey, SetKind};
use crate::service::CrdtService;
use crate::update::{Operation, UpdateOp};

/// Builds updates for observed-remove set keys.
///
/// A remove only affects element instances the store has observed; an add
/// racing with it on another replica survives.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetService;

impl SetService {
    /// Create the service.
    pub fn new() -> Self {
        Self
    }

    /// Add one element.
    pub fn add_element(&self, key: &SetKey, element: impl Into<String>) -> UpdateOp {
        self.add_elements(key, [element])
    }

    /// Add several elements in one descriptor.
    pub fn add_elements<I, S>(&self, key: &SetKey, elements: I) -> UpdateOp
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let elements = elements.into_iter().map(Into::into).collect();
        UpdateOp::from_typed(key.typed(), Operation::AddElements(elements))
    }

    /// Remove one element.
    pub fn remove_element(&self, key: &SetKey, element: impl Into<String>) -> UpdateOp {
        self.remove_elements(key, [element])
    }

    /// Remove several elements in one descriptor.
    pub fn remove_elements<I, S>(&self, key: &SetKey, elements: I) -> UpdateOp
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let elements = elements.into_iter().map(Into::into).collect();
        UpdateOp::from_typed(key.typed(), Operation::RemoveElements(elements))
    }
}

impl CrdtService for SetService {
    type Kind = SetKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove_collect_elements() {
        let svc = SetService::new();
        let s = svc.get_key("tags").unwrap();

        let add = svc.add_elements(&s, ["a", "b"]);
        assert_eq!(
            add.operation(),
            &Operation::AddElements(vec!["a".into(), "b".into()])
        );

        let remove = svc.remove_element(&s, "a");
        assert_eq!(
            remove.operation(),
            &Operation::RemoveElements(vec!["a".into()])
        );
    }
}
