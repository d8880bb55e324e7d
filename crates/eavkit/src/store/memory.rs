use super::eav_store::EavStore;
use super::mem_backend::MemBackend;

pub type InMemoryStore = EavStore<MemBackend>;

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        EavStore::with_backend(MemBackend::new())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::attributes::{AttrValue, AttributeDefinition, AttributeDraft};
    use crate::model::{AttributeOption, ItemId};
    use crate::store::{AttrStore, ValueChange};

    /// Builder for a populated in-memory store. Panics on setup errors.
    pub struct StoreFixture {
        pub store: InMemoryStore,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
            }
        }

        pub fn with_attribute(self, draft: AttributeDraft) -> Self {
            self.store.save_attribute(draft).unwrap();
            self
        }

        pub fn with_option(self, code: &str, label: &str) -> Self {
            self.option(code, label);
            self
        }

        /// Store a raw value for `item`.
        pub fn with_value(self, item: &str, code: &str, value: AttrValue) -> Self {
            let attribute = self.attribute(code);
            self.store
                .commit_values(
                    &ItemId::new(item),
                    None,
                    &[ValueChange::set(attribute.id, value)],
                )
                .unwrap();
            self
        }

        /// Select `label` (created on demand) for `item`.
        pub fn with_choice(self, item: &str, code: &str, label: &str) -> Self {
            let option = self.option(code, label);
            self.with_value(item, code, AttrValue::Choice(option.id))
        }

        pub fn attribute(&self, code: &str) -> AttributeDefinition {
            self.store
                .find_by_code(code)
                .unwrap()
                .unwrap_or_else(|| panic!("fixture has no attribute '{}'", code))
        }

        pub fn option(&self, code: &str, label: &str) -> AttributeOption {
            let attribute = self.attribute(code);
            self.store.get_or_create_option(attribute.id, label).unwrap()
        }
    }
}
