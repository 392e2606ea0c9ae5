use std::collections::{BTreeMap, BTreeSet};

use gpui::SharedString;

use super::controller::{
    FieldKey, FormController, FormErrors, FormResult, RevalidateMode, SyncFieldValidatorFn,
    SyncFormValidatorFn, ValidationScope, read_lock, write_lock,
};

pub trait ValidationError: Clone + Send + Sync + 'static {
    fn message(&self) -> SharedString;
}

pub trait FieldLens<T>: Copy + Send + Sync + 'static {
    type Value: Clone + PartialEq + Send + Sync + 'static;

    fn key(self) -> FieldKey;
    fn get<'a>(self, model: &'a T) -> &'a Self::Value;
    fn set(self, model: &mut T, value: Self::Value);
}

pub trait FormModel: Clone + Send + Sync + 'static {
    type Fields;

    fn fields() -> Self::Fields;
}

pub trait FieldValidator<T, L, E>: Send + Sync
where
    L: FieldLens<T>,
    E: ValidationError,
{
    fn validate(&self, model: &T, value: &L::Value) -> Result<(), E>;
}

impl<T, L, E, F> FieldValidator<T, L, E> for F
where
    L: FieldLens<T>,
    E: ValidationError,
    F: for<'a> Fn(&'a T, &'a L::Value) -> Result<(), E> + Send + Sync,
{
    fn validate(&self, model: &T, value: &L::Value) -> Result<(), E> {
        (self)(model, value)
    }
}

/// Cross-field validation over the whole model.
pub trait FormValidator<T, E>: Send + Sync
where
    E: ValidationError,
{
    fn validate(&self, model: &T) -> Vec<(FieldKey, E)>;
}

impl<T, E, F> FormValidator<T, E> for F
where
    E: ValidationError,
    F: Fn(&T) -> Vec<(FieldKey, E)> + Send + Sync,
{
    fn validate(&self, model: &T) -> Vec<(FieldKey, E)> {
        (self)(model)
    }
}

impl<T, E> FormController<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: ValidationError,
{
    pub fn register_field_validator<L, V>(&self, lens: L, validator: V) -> FormResult<()>
    where
        L: FieldLens<T>,
        V: FieldValidator<T, L, E> + 'static,
    {
        let validator = std::sync::Arc::new(validator);
        let wrapped: SyncFieldValidatorFn<T, E> =
            std::sync::Arc::new(move |model: &T| validator.validate(model, lens.get(model)));
        self.register_field_validator_by_key(lens.key(), wrapped)
    }

    pub(super) fn register_field_validator_by_key(
        &self,
        key: FieldKey,
        validator: SyncFieldValidatorFn<T, E>,
    ) -> FormResult<()> {
        let mut validators =
            write_lock(&self.sync_field_validators, "registering field validator")?;
        validators.entry(key).or_default().push(validator);
        Ok(())
    }

    pub fn register_form_validator<V>(&self, validator: V) -> FormResult<()>
    where
        V: FormValidator<T, E> + 'static,
    {
        let validator = std::sync::Arc::new(validator);
        let wrapped: SyncFormValidatorFn<T, E> =
            std::sync::Arc::new(move |model: &T| validator.validate(model));
        let mut validators = write_lock(&self.form_validators, "registering form validator")?;
        validators.push(wrapped);
        Ok(())
    }

    pub fn register_dependency<S, D>(&self, source: S, dependent: D) -> FormResult<()>
    where
        S: FieldLens<T>,
        D: FieldLens<T>,
    {
        self.register_dependency_by_key(source.key(), dependent.key())
    }

    pub(super) fn register_dependency_by_key(
        &self,
        source: FieldKey,
        dependent: FieldKey,
    ) -> FormResult<()> {
        let mut dependencies = write_lock(&self.dependencies, "registering dependency")?;
        dependencies.entry(source).or_default().insert(dependent);
        Ok(())
    }

    /// Writes a field value, then validates according to the form options.
    pub fn set<L>(&self, lens: L, value: L::Value) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let key = lens.key();
        {
            let mut state = write_lock(&self.state, "writing form model")?;
            lens.set(&mut state.model, value);
            let is_dirty = lens.get(&state.model) != lens.get(&state.initial_model);
            if is_dirty {
                state.dirty_fields.insert(key);
            } else {
                state.dirty_fields.remove(&key);
            }
            state.ensure_meta(key).dirty = is_dirty;
        }

        let validate = self.options.validate_mode.on_change();
        let revalidate = self.options.revalidate_mode == RevalidateMode::OnChange;
        self.run_triggered_validation(key, validate, revalidate)
    }

    /// Marks a field as touched (blurred).
    pub fn touch<L>(&self, lens: L) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let key = lens.key();
        {
            let mut state = write_lock(&self.state, "touching field")?;
            state.ensure_meta(key).touched = true;
        }

        let validate = self.options.validate_mode.on_blur();
        let revalidate = self.options.revalidate_mode == RevalidateMode::OnBlur;
        self.run_triggered_validation(key, validate, revalidate)
    }

    pub fn touch_all(&self) -> FormResult<()> {
        let keys = self.known_field_keys()?;
        let mut state = write_lock(&self.state, "touching all fields")?;
        for key in keys {
            state.ensure_meta(key).touched = true;
        }
        Ok(())
    }

    fn run_triggered_validation(
        &self,
        key: FieldKey,
        validate: bool,
        revalidate: bool,
    ) -> FormResult<()> {
        match self.options.scope {
            ValidationScope::Form => {
                if validate {
                    let _ = self.validate_form()?;
                } else if revalidate {
                    self.revalidate_dependents(key)?;
                }
            }
            ValidationScope::Field => {
                if validate {
                    let _ = self.validate_field_by_key(key)?;
                }
                if revalidate {
                    self.revalidate_dependents(key)?;
                }
            }
        }
        Ok(())
    }

    pub fn validate_field<L>(&self, lens: L) -> FormResult<bool>
    where
        L: FieldLens<T>,
    {
        self.validate_field_by_key(lens.key())
    }

    /// Runs every registered validator against the current model and replaces
    /// all field errors with the result.
    pub fn validate_form(&self) -> FormResult<bool> {
        let model = {
            read_lock(&self.state, "reading model for form validation")?
                .model
                .clone()
        };
        let field_validators = read_lock(
            &self.sync_field_validators,
            "reading field validators for form validation",
        )?
        .clone();
        let form_validators = read_lock(
            &self.form_validators,
            "reading form validators for form validation",
        )?
        .clone();

        let mut field_errors = BTreeMap::<FieldKey, Vec<E>>::new();
        for (key, validators) in field_validators {
            let errors = self.run_validators(&model, &validators);
            field_errors.insert(key, errors);
        }

        for validator in form_validators {
            for (key, error) in validator(&model) {
                field_errors.entry(key).or_default().push(error);
            }
        }

        let mut state = write_lock(&self.state, "applying form validation result")?;
        let mut keys = state
            .field_meta
            .keys()
            .copied()
            .collect::<BTreeSet<FieldKey>>();
        keys.extend(field_errors.keys().copied());
        for key in keys {
            state.ensure_meta(key).errors = field_errors.remove(&key).unwrap_or_default();
        }
        state.refresh_first_error();

        let invalid_fields = state
            .field_meta
            .values()
            .filter(|meta| !meta.errors.is_empty())
            .count();
        tracing::debug!(form_id = state.id.0, invalid_fields, "form validated");
        Ok(invalid_fields == 0)
    }

    /// First error of every failing field, as of the last validation pass.
    pub fn errors(&self) -> FormResult<FormErrors<E>> {
        Ok(read_lock(&self.state, "reading form errors")?
            .field_meta
            .iter()
            .filter_map(|(key, meta)| meta.errors.first().map(|error| (*key, error.clone())))
            .collect())
    }

    fn run_validators(&self, model: &T, validators: &[SyncFieldValidatorFn<T, E>]) -> Vec<E> {
        let mut errors = Vec::new();
        for validator in validators {
            if let Err(error) = validator(model) {
                errors.push(error);
                if self.options.validate_first_error_only {
                    break;
                }
            }
        }
        errors
    }

    pub(super) fn validate_field_by_key(&self, key: FieldKey) -> FormResult<bool> {
        let model = {
            read_lock(&self.state, "reading model for field validation")?
                .model
                .clone()
        };
        let validators = {
            read_lock(
                &self.sync_field_validators,
                "reading field validators for key validation",
            )?
            .get(&key)
            .cloned()
            .unwrap_or_default()
        };

        let errors = self.run_validators(&model, &validators);
        let is_valid = errors.is_empty();

        let mut state = write_lock(&self.state, "writing field validation result")?;
        state.ensure_meta(key).errors = errors;
        state.refresh_first_error();
        Ok(is_valid)
    }

    pub(super) fn revalidate_dependents(&self, source: FieldKey) -> FormResult<()> {
        let dependents = read_lock(&self.dependencies, "reading field dependencies")?
            .get(&source)
            .cloned()
            .unwrap_or_default();
        for dependent in dependents {
            let _ = self.validate_field_by_key(dependent)?;
        }
        Ok(())
    }

    pub(super) fn known_field_keys(&self) -> FormResult<BTreeSet<FieldKey>> {
        let mut keys = BTreeSet::new();
        keys.extend(
            read_lock(&self.sync_field_validators, "reading sync validator keys")?
                .keys()
                .copied(),
        );
        keys.extend(
            read_lock(&self.dependencies, "reading dependency keys")?
                .iter()
                .flat_map(|(key, values)| std::iter::once(*key).chain(values.iter().copied())),
        );
        keys.extend(
            read_lock(&self.required_fields, "reading required field keys")?
                .iter()
                .copied(),
        );
        let state = read_lock(&self.state, "reading known keys from field metadata")?;
        keys.extend(state.field_meta.keys().copied());
        keys.extend(state.field_order.iter().copied());
        Ok(keys)
    }
}
