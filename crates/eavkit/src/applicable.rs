//! Memoized applicable-attribute lookup.
//!
//! An editing session asks for the applicable set many times (field building,
//! `get`, `set`, validation). The set depends only on the category set, so it is
//! computed once per distinct category set and reused until invalidated.

use crate::attributes::AttributeDefinition;
use crate::error::Result;
use crate::model::CategoryId;
use crate::store::AttrStore;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

/// Shared, ordered-by-name definitions for one category set.
pub type ApplicableSet = Rc<Vec<AttributeDefinition>>;

#[derive(Debug, Default)]
pub struct ApplicableCache {
    entries: RefCell<HashMap<BTreeSet<CategoryId>, ApplicableSet>>,
}

impl ApplicableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The definitions applicable to `categories`, loading them on first use.
    pub fn resolve<S: AttrStore>(
        &self,
        store: &S,
        categories: &BTreeSet<CategoryId>,
    ) -> Result<ApplicableSet> {
        if let Some(hit) = self.entries.borrow().get(categories) {
            return Ok(Rc::clone(hit));
        }
        let loaded: ApplicableSet = Rc::new(store.find_applicable(categories)?);
        self.entries
            .borrow_mut()
            .insert(categories.clone(), Rc::clone(&loaded));
        Ok(loaded)
    }

    /// Forget every memoized set.
    pub fn invalidate(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
