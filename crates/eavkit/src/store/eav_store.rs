use super::backend::StorageBackend;
use super::tables::{CascadeReport, Tables, Upsert};
use super::{AttrStore, CommitReport, Purge, ValueChange};
use crate::attributes::{AttrValue, AttributeDefinition, AttributeDraft};
use crate::codes::{validate_code, DefaultSlugger, SlugNormalizer};
use crate::error::{EavError, FieldErrorKind, IntegrityViolation, Result, ValidationErrors};
use crate::model::{AttributeId, AttributeOption, CategoryId, ItemId, OptionId, ValueRow};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use tracing::{debug, warn};

pub struct EavStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
    slugger: Box<dyn SlugNormalizer>,
    /// Serializes load-mutate-save cycles of this handle; the backend lock
    /// covers other handles
    write_lock: Mutex<()>,
}

impl<B: StorageBackend> EavStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            slugger: Box::new(DefaultSlugger::default()),
            write_lock: Mutex::new(()),
        }
    }

    /// Replace the normalizer used to derive blank codes.
    pub fn with_slugger(mut self, slugger: impl SlugNormalizer + 'static) -> Self {
        self.slugger = Box::new(slugger);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> Result<T>) -> Result<T> {
        let tables = self.backend.load_tables()?;
        f(&tables)
    }

    /// Run `f` against a working copy and persist it only if `f` succeeds.
    pub fn transaction<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let _guard = self.write_lock.lock();
        let _backend_guard = self.backend.lock_for_write()?;
        let mut tables = self.backend.load_tables()?;
        let out = f(&mut tables)?;
        self.backend.save_tables(&tables)?;
        Ok(out)
    }

    /// Settle the code of a draft and run the checks that need no stored data.
    fn prepare_draft(&self, draft: &AttributeDraft) -> Result<String> {
        let mut errors = ValidationErrors::new();
        let name = draft.name.trim();
        if name.is_empty() {
            errors.add("name", FieldErrorKind::EmptyName);
        }

        let code = match draft.code.trim() {
            "" => self.slugger.normalize(name),
            explicit => explicit.to_string(),
        };
        if !(name.is_empty() && code.is_empty()) {
            if let Err(error) = validate_code(&code) {
                errors.add("code", FieldErrorKind::InvalidCode { error });
            }
        }

        errors.into_result()?;
        Ok(code)
    }
}

fn sorted_by_name(mut defs: Vec<AttributeDefinition>) -> Vec<AttributeDefinition> {
    defs.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
    defs
}

fn is_blank(value: &AttrValue) -> bool {
    matches!(value, AttrValue::Text(s) if s.trim().is_empty())
}

impl<B: StorageBackend> AttrStore for EavStore<B> {
    fn get_attribute(&self, id: AttributeId) -> Result<AttributeDefinition> {
        self.read(|t| {
            t.attribute(id)
                .cloned()
                .ok_or_else(|| EavError::AttributeNotFound(id.to_string()))
        })
    }

    fn find_by_code(&self, code: &str) -> Result<Option<AttributeDefinition>> {
        self.read(|t| Ok(t.attribute_by_code(code).cloned()))
    }

    fn list_attributes(&self) -> Result<Vec<AttributeDefinition>> {
        self.read(|t| Ok(sorted_by_name(t.attributes().to_vec())))
    }

    fn find_applicable(&self, categories: &BTreeSet<CategoryId>) -> Result<Vec<AttributeDefinition>> {
        self.read(|t| {
            let defs = t
                .attributes()
                .iter()
                .filter(|a| a.applies_to(categories))
                .cloned()
                .collect();
            Ok(sorted_by_name(defs))
        })
    }

    fn save_attribute(&self, draft: AttributeDraft) -> Result<AttributeDefinition> {
        let code = self.prepare_draft(&draft)?;

        let def = self.transaction(|t| {
            let mut errors = ValidationErrors::new();
            if let Some(other) = t.attribute_by_code(&code) {
                if Some(other.id) != draft.id {
                    errors.add("code", FieldErrorKind::DuplicateCode { code: code.clone() });
                }
            }

            let mut drop_options = false;
            if let Some(id) = draft.id {
                let existing = t
                    .attribute(id)
                    .ok_or_else(|| EavError::AttributeNotFound(id.to_string()))?;
                let referenced = t.is_referenced(id);
                if referenced && existing.code != code {
                    errors.add(
                        "code",
                        FieldErrorKind::ImmutableCode {
                            code: existing.code.clone(),
                        },
                    );
                }
                if referenced && existing.kind != draft.kind {
                    errors.add(
                        "kind",
                        FieldErrorKind::ImmutableKind {
                            code: existing.code.clone(),
                        },
                    );
                }
                drop_options = existing.has_options() && !draft.kind.has_options();
            }
            errors.into_result()?;

            let def = draft.into_definition(code.clone());
            if drop_options {
                let stale: Vec<OptionId> = t.options_for(def.id).map(|o| o.id).collect();
                for option in stale {
                    t.remove_option(option);
                }
            }
            t.put_attribute(def.clone())?;
            Ok(def)
        })?;

        debug!(code = %def.code, kind = %def.kind, "saved attribute definition");
        Ok(def)
    }

    fn delete_attribute(&self, id: AttributeId) -> Result<CascadeReport> {
        let report = self.transaction(|t| {
            t.remove_attribute(id)
                .ok_or_else(|| EavError::AttributeNotFound(id.to_string()))
        })?;
        debug!(
            attribute = %id,
            options = report.options,
            values = report.values,
            "deleted attribute definition"
        );
        Ok(report)
    }

    fn get_or_create_option(&self, attribute: AttributeId, label: &str) -> Result<AttributeOption> {
        let label = label.trim();
        if label.is_empty() {
            let mut errors = ValidationErrors::new();
            errors.add("name", FieldErrorKind::EmptyName);
            return Err(errors.into());
        }

        let existing = self.read(|t| {
            if t.attribute(attribute).is_none() {
                return Err(EavError::AttributeNotFound(attribute.to_string()));
            }
            Ok(t.option_by_name(attribute, label).cloned())
        })?;
        if let Some(option) = existing {
            return Ok(option);
        }

        let option = AttributeOption::new(attribute, label);
        let inserted = self.transaction(|t| {
            t.insert_option(option.clone())?;
            Ok(option)
        });

        match inserted {
            Ok(option) => {
                debug!(attribute = %attribute, name = %option.name, "created option");
                Ok(option)
            }
            Err(EavError::Integrity(IntegrityViolation::DuplicateOption { .. })) => {
                warn!(attribute = %attribute, name = %label, "option created concurrently, re-reading");
                self.read(|t| {
                    t.option_by_name(attribute, label).cloned().ok_or_else(|| {
                        EavError::Store(format!(
                            "option '{}' missing after uniqueness conflict",
                            label
                        ))
                    })
                })
            }
            Err(e) => Err(e),
        }
    }

    fn list_options(&self, attribute: AttributeId) -> Result<Vec<AttributeOption>> {
        self.read(|t| Ok(t.options_for(attribute).cloned().collect()))
    }

    fn get_option(&self, id: OptionId) -> Result<AttributeOption> {
        self.read(|t| t.option(id).cloned().ok_or(EavError::OptionNotFound(id)))
    }

    fn delete_option(&self, id: OptionId) -> Result<usize> {
        let cascaded = self.transaction(|t| t.remove_option(id).ok_or(EavError::OptionNotFound(id)))?;
        debug!(option = %id, values = cascaded, "deleted option");
        Ok(cascaded)
    }

    fn get_value(&self, item: &ItemId, attribute: AttributeId) -> Result<Option<AttrValue>> {
        self.read(|t| Ok(t.value(item, attribute).map(|row| row.value.clone())))
    }

    fn item_values(&self, item: &ItemId) -> Result<Vec<ValueRow>> {
        self.read(|t| Ok(t.item_values(item).cloned().collect()))
    }

    fn values_for(&self, attributes: &[AttributeId], items: &[ItemId]) -> Result<Vec<ValueRow>> {
        self.read(|t| {
            Ok(t.values_for(attributes, items)
                .into_iter()
                .cloned()
                .collect())
        })
    }

    fn commit_values(
        &self,
        item: &ItemId,
        purge: Option<&Purge>,
        changes: &[ValueChange],
    ) -> Result<CommitReport> {
        let report = self.transaction(|t| {
            let mut report = CommitReport::default();

            report.purged = match purge {
                None => 0,
                Some(Purge::All) => t.purge_item_where(item, |_| true),
                Some(Purge::Except(keep)) => t.purge_item_where(item, |a| !keep.contains(&a)),
            };

            for change in changes {
                match change.value.as_ref().filter(|v| !is_blank(v)) {
                    None => {
                        if t.delete_value(item, change.attribute) {
                            report.deleted += 1;
                        } else {
                            report.unchanged += 1;
                        }
                    }
                    Some(value) => match t.upsert_value(item, change.attribute, value.clone())? {
                        Upsert::Inserted | Upsert::Updated => report.written += 1,
                        Upsert::Unchanged => report.unchanged += 1,
                    },
                }
            }
            Ok(report)
        })?;

        debug!(
            item = %item,
            written = report.written,
            deleted = report.deleted,
            purged = report.purged,
            "committed attribute values"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeKind;
    use crate::model::category_set;
    use crate::store::memory::InMemoryStore;

    fn validation(err: EavError) -> ValidationErrors {
        match err {
            EavError::Validation(v) => v,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn blank_code_derived_from_name() {
        let store = InMemoryStore::new();
        let def = store
            .save_attribute(AttributeDraft::new("Heel height", AttributeKind::Decimal))
            .unwrap();
        assert_eq!(def.code, "heel_height");
        assert_eq!(store.find_by_code("heel_height").unwrap(), Some(def));
    }

    #[test]
    fn custom_slugger_used_for_blank_codes() {
        let store = InMemoryStore::new().with_slugger(DefaultSlugger::new('-'));
        let def = store
            .save_attribute(AttributeDraft::new("Heel height", AttributeKind::Decimal))
            .unwrap();
        assert_eq!(def.code, "heel-height");
    }

    #[test]
    fn explicit_code_kept() {
        let store = InMemoryStore::new();
        let def = store
            .save_attribute(AttributeDraft::new("Color", AttributeKind::Select).code("colour"))
            .unwrap();
        assert_eq!(def.code, "colour");
    }

    #[test]
    fn empty_name_rejected() {
        let store = InMemoryStore::new();
        let err = store
            .save_attribute(AttributeDraft::new("   ", AttributeKind::Text))
            .unwrap_err();
        let errors = validation(err);
        assert!(errors.has_field("name"));
        assert!(!errors.has_field("code"));
    }

    #[test]
    fn malformed_code_rejected() {
        let store = InMemoryStore::new();
        let err = store
            .save_attribute(AttributeDraft::new("Color", AttributeKind::Text).code("Bad Code"))
            .unwrap_err();
        assert!(validation(err).has_field("code"));
    }

    #[test]
    fn duplicate_code_rejected() {
        let store = InMemoryStore::new();
        store
            .save_attribute(AttributeDraft::new("Color", AttributeKind::Select))
            .unwrap();
        let err = store
            .save_attribute(AttributeDraft::new("Color", AttributeKind::Text))
            .unwrap_err();
        let errors = validation(err);
        assert_eq!(
            errors.for_field("code").next().map(|e| &e.kind),
            Some(&FieldErrorKind::DuplicateCode {
                code: "color".into()
            })
        );
        assert_eq!(store.list_attributes().unwrap().len(), 1);
    }

    #[test]
    fn update_keeps_id_and_allows_same_code() {
        let store = InMemoryStore::new();
        let def = store
            .save_attribute(AttributeDraft::new("Color", AttributeKind::Select))
            .unwrap();
        let updated = store
            .save_attribute(AttributeDraft::edit(&def).required().category("shoes"))
            .unwrap();
        assert_eq!(updated.id, def.id);
        assert!(updated.is_required);
        assert_eq!(store.list_attributes().unwrap().len(), 1);
    }

    #[test]
    fn update_of_missing_definition_fails() {
        let store = InMemoryStore::new();
        let mut draft = AttributeDraft::new("Color", AttributeKind::Select);
        draft.id = Some(uuid::Uuid::new_v4());
        assert!(matches!(
            store.save_attribute(draft),
            Err(EavError::AttributeNotFound(_))
        ));
    }

    #[test]
    fn code_immutable_once_referenced() {
        let store = InMemoryStore::new();
        let def = store
            .save_attribute(AttributeDraft::new("Size", AttributeKind::Integer))
            .unwrap();

        // Unreferenced: renaming the code is fine
        let def = store
            .save_attribute(AttributeDraft::edit(&def).code("shoe_size"))
            .unwrap();
        assert_eq!(def.code, "shoe_size");

        store
            .commit_values(
                &ItemId::new("a"),
                None,
                &[ValueChange::set(def.id, AttrValue::Integer(42))],
            )
            .unwrap();

        let err = store
            .save_attribute(AttributeDraft::edit(&def).code("size"))
            .unwrap_err();
        assert!(validation(err).has_field("code"));

        let mut kind_change = AttributeDraft::edit(&def);
        kind_change.kind = AttributeKind::Text;
        let err = store.save_attribute(kind_change).unwrap_err();
        assert!(validation(err).has_field("kind"));
    }

    #[test]
    fn leaving_select_drops_unused_options() {
        let store = InMemoryStore::new();
        let def = store
            .save_attribute(AttributeDraft::new("Finish", AttributeKind::Select))
            .unwrap();
        store.get_or_create_option(def.id, "Matte").unwrap();

        let mut draft = AttributeDraft::edit(&def);
        draft.kind = AttributeKind::Text;
        store.save_attribute(draft).unwrap();
        assert!(store.list_options(def.id).unwrap().is_empty());
    }

    #[test]
    fn applicable_definitions_ordered_by_name() {
        let store = InMemoryStore::new();
        for (name, category) in [("Weight", "shoes"), ("Color", "shoes"), ("Lens", "glasses")] {
            store
                .save_attribute(AttributeDraft::new(name, AttributeKind::Text).category(category))
                .unwrap();
        }
        let names: Vec<String> = store
            .find_applicable(&category_set(["shoes"]))
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Color", "Weight"]);

        let glasses = store
            .attributes_for_category(&CategoryId::new("glasses"))
            .unwrap();
        assert_eq!(glasses.len(), 1);
        assert!(store
            .find_applicable(&category_set(["hats"]))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn get_or_create_returns_same_option() {
        let store = InMemoryStore::new();
        let color = store
            .save_attribute(AttributeDraft::new("Color", AttributeKind::Select))
            .unwrap();
        let first = store.get_or_create_option(color.id, "Red").unwrap();
        let second = store.get_or_create_option(color.id, " Red ").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.list_options(color.id).unwrap().len(), 1);
    }

    #[test]
    fn same_label_under_different_attributes_is_distinct() {
        let store = InMemoryStore::new();
        let color = store
            .save_attribute(AttributeDraft::new("Color", AttributeKind::Select))
            .unwrap();
        let lining = store
            .save_attribute(AttributeDraft::new("Lining", AttributeKind::Select))
            .unwrap();
        let a = store.get_or_create_option(color.id, "Red").unwrap();
        let b = store.get_or_create_option(lining.id, "Red").unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn get_or_create_rejects_blank_label_and_missing_attribute() {
        let store = InMemoryStore::new();
        let color = store
            .save_attribute(AttributeDraft::new("Color", AttributeKind::Select))
            .unwrap();
        assert!(matches!(
            store.get_or_create_option(color.id, "  "),
            Err(EavError::Validation(_))
        ));
        assert!(matches!(
            store.get_or_create_option(uuid::Uuid::new_v4(), "Red"),
            Err(EavError::AttributeNotFound(_))
        ));
    }

    #[test]
    fn commit_deletes_on_empty_and_reports() {
        let store = InMemoryStore::new();
        let note = store
            .save_attribute(AttributeDraft::new("Note", AttributeKind::Text))
            .unwrap();
        let item = ItemId::new("a");

        let report = store
            .commit_values(
                &item,
                None,
                &[ValueChange::set(note.id, AttrValue::Text("hello".into()))],
            )
            .unwrap();
        assert_eq!(report.written, 1);

        let report = store
            .commit_values(
                &item,
                None,
                &[ValueChange::set(note.id, AttrValue::Text("hello".into()))],
            )
            .unwrap();
        assert_eq!(report.unchanged, 1);

        let report = store
            .commit_values(
                &item,
                None,
                &[ValueChange::set(note.id, AttrValue::Text("  ".into()))],
            )
            .unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(store.get_value(&item, note.id).unwrap(), None);

        // Deleting again is a no-op
        let report = store
            .commit_values(&item, None, &[ValueChange::clear(note.id)])
            .unwrap();
        assert_eq!(report.deleted, 0);
        assert_eq!(report.unchanged, 1);
    }

    #[test]
    fn failed_commit_rolls_back_everything() {
        let store = InMemoryStore::new();
        let note = store
            .save_attribute(AttributeDraft::new("Note", AttributeKind::Text))
            .unwrap();
        let size = store
            .save_attribute(AttributeDraft::new("Size", AttributeKind::Integer))
            .unwrap();
        let item = ItemId::new("a");
        store
            .commit_values(&item, None, &[ValueChange::set(size.id, AttrValue::Integer(1))])
            .unwrap();

        // Second change violates the kind constraint; purge and first write must not stick
        let err = store
            .commit_values(
                &item,
                Some(&Purge::All),
                &[
                    ValueChange::set(note.id, AttrValue::Text("x".into())),
                    ValueChange::set(size.id, AttrValue::Text("y".into())),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, EavError::Integrity(_)));
        assert_eq!(store.item_values(&item).unwrap().len(), 1);
        assert_eq!(
            store.get_value(&item, size.id).unwrap(),
            Some(AttrValue::Integer(1))
        );
    }

    #[test]
    fn backend_write_failure_surfaces_and_rolls_back() {
        let store = InMemoryStore::new();
        let note = store
            .save_attribute(AttributeDraft::new("Note", AttributeKind::Text))
            .unwrap();
        store.backend.set_simulate_write_error(true);

        let err = store
            .commit_values(
                &ItemId::new("a"),
                None,
                &[ValueChange::set(note.id, AttrValue::Text("x".into()))],
            )
            .unwrap_err();
        assert!(matches!(err, EavError::Store(_)));

        store.backend.set_simulate_write_error(false);
        assert!(store.item_values(&ItemId::new("a")).unwrap().is_empty());
    }

    #[test]
    fn purge_except_keeps_listed_attributes() {
        let store = InMemoryStore::new();
        let note = store
            .save_attribute(AttributeDraft::new("Note", AttributeKind::Text))
            .unwrap();
        let size = store
            .save_attribute(AttributeDraft::new("Size", AttributeKind::Integer))
            .unwrap();
        let item = ItemId::new("a");
        store
            .commit_values(
                &item,
                None,
                &[
                    ValueChange::set(note.id, AttrValue::Text("x".into())),
                    ValueChange::set(size.id, AttrValue::Integer(3)),
                ],
            )
            .unwrap();

        let report = store
            .commit_values(&item, Some(&Purge::Except(BTreeSet::from([size.id]))), &[])
            .unwrap();
        assert_eq!(report.purged, 1);
        assert_eq!(store.get_value(&item, note.id).unwrap(), None);
        assert_eq!(
            store.get_value(&item, size.id).unwrap(),
            Some(AttrValue::Integer(3))
        );
    }

    #[test]
    fn delete_item_drops_all_rows() {
        let store = InMemoryStore::new();
        let note = store
            .save_attribute(AttributeDraft::new("Note", AttributeKind::Text))
            .unwrap();
        let item = ItemId::new("a");
        store
            .commit_values(&item, None, &[ValueChange::set(note.id, AttrValue::Text("x".into()))])
            .unwrap();
        assert_eq!(store.delete_item(&item).unwrap(), 1);
        assert!(store.item_values(&item).unwrap().is_empty());
    }

    #[test]
    fn delete_missing_rows_reports_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.delete_attribute(uuid::Uuid::new_v4()),
            Err(EavError::AttributeNotFound(_))
        ));
        assert!(matches!(
            store.delete_option(uuid::Uuid::new_v4()),
            Err(EavError::OptionNotFound(_))
        ));
    }
}
