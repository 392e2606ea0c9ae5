use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use super::validation::{FieldLens, ValidationError};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Field key to error. A missing key means the field currently passes.
pub type FormErrors<E> = BTreeMap<FieldKey, E>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

/// Which interaction triggers validation of the field being edited.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationMode {
    OnChange,
    OnBlur,
    OnSubmit,
    All,
}

impl ValidationMode {
    pub(super) fn on_change(self) -> bool {
        matches!(self, ValidationMode::OnChange | ValidationMode::All)
    }

    pub(super) fn on_blur(self) -> bool {
        matches!(self, ValidationMode::OnBlur | ValidationMode::All)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RevalidateMode {
    OnChange,
    OnBlur,
    OnSubmit,
}

/// How much of the form a change or blur revalidates.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationScope {
    /// Only the edited field and its registered dependents.
    Field,
    /// Every registered validator against the current model.
    Form,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormOptions {
    pub validate_mode: ValidationMode,
    pub revalidate_mode: RevalidateMode,
    pub scope: ValidationScope,
    pub validate_first_error_only: bool,
    pub validate_on_mount: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_mode: ValidationMode::All,
            revalidate_mode: RevalidateMode::OnChange,
            scope: ValidationScope::Form,
            validate_first_error_only: true,
            validate_on_mount: false,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldMeta<E> {
    pub dirty: bool,
    pub touched: bool,
    pub errors: Vec<E>,
}

impl<E> Default for FieldMeta<E> {
    fn default() -> Self {
        Self {
            dirty: false,
            touched: false,
            errors: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FormSnapshot<T, E> {
    pub model: T,
    pub submit_state: SubmitState,
    pub submit_count: u32,
    pub is_dirty: bool,
    pub is_valid: bool,
    pub field_meta: BTreeMap<FieldKey, FieldMeta<E>>,
}

impl<T, E: Clone> FormSnapshot<T, E> {
    /// First error of every failing field.
    pub fn errors(&self) -> FormErrors<E> {
        self.field_meta
            .iter()
            .filter_map(|(key, meta)| meta.errors.first().map(|error| (*key, error.clone())))
            .collect()
    }

    pub fn touched(&self) -> BTreeSet<FieldKey> {
        self.field_meta
            .iter()
            .filter_map(|(key, meta)| meta.touched.then_some(*key))
            .collect()
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("invalid submit state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: SubmitState, to: SubmitState },
    #[error("form submit is already in progress")]
    AlreadySubmitting,
    #[error("submit handler rejected the form: {0}")]
    SubmitRejected(String),
}

pub type FormResult<T> = Result<T, FormError>;

pub(super) type SyncFieldValidatorFn<T, E> = Arc<dyn Fn(&T) -> Result<(), E> + Send + Sync>;
pub(super) type SyncFormValidatorFn<T, E> = Arc<dyn Fn(&T) -> Vec<(FieldKey, E)> + Send + Sync>;

pub(super) struct FormState<T, E> {
    pub(super) id: FormId,
    pub(super) initial_model: T,
    pub(super) model: T,
    pub(super) submit_state: SubmitState,
    pub(super) submit_count: u32,
    pub(super) dirty_fields: BTreeSet<FieldKey>,
    pub(super) field_meta: BTreeMap<FieldKey, FieldMeta<E>>,
    pub(super) field_order: Vec<FieldKey>,
    pub(super) first_error: Option<FieldKey>,
}

impl<T, E> FormState<T, E> {
    pub(super) fn ensure_meta(&mut self, key: FieldKey) -> &mut FieldMeta<E> {
        self.field_meta.entry(key).or_default()
    }

    pub(super) fn refresh_first_error(&mut self) {
        self.first_error = first_error_key(&self.field_order, &self.field_meta);
    }
}

/// Headless form state: the current model, per-field touched/dirty/error
/// metadata and the submit lifecycle.
///
/// Cloning is cheap and every clone shares the same state, so UI callbacks
/// can capture their own handle.
#[derive(Clone)]
pub struct FormController<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: ValidationError,
{
    pub(super) options: FormOptions,
    pub(super) state: Arc<RwLock<FormState<T, E>>>,
    pub(super) sync_field_validators:
        Arc<RwLock<BTreeMap<FieldKey, Vec<SyncFieldValidatorFn<T, E>>>>>,
    pub(super) form_validators: Arc<RwLock<Vec<SyncFormValidatorFn<T, E>>>>,
    pub(super) dependencies: Arc<RwLock<BTreeMap<FieldKey, BTreeSet<FieldKey>>>>,
    pub(super) required_fields: Arc<RwLock<BTreeSet<FieldKey>>>,
}

impl<T, E> FormController<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: ValidationError,
{
    pub fn new(initial: T, options: FormOptions) -> Self {
        Self {
            options,
            state: Arc::new(RwLock::new(FormState {
                id: FormId::next(),
                initial_model: initial.clone(),
                model: initial,
                submit_state: SubmitState::Idle,
                submit_count: 0,
                dirty_fields: BTreeSet::new(),
                field_meta: BTreeMap::new(),
                field_order: Vec::new(),
                first_error: None,
            })),
            sync_field_validators: Arc::new(RwLock::new(BTreeMap::new())),
            form_validators: Arc::new(RwLock::new(Vec::new())),
            dependencies: Arc::new(RwLock::new(BTreeMap::new())),
            required_fields: Arc::new(RwLock::new(BTreeSet::new())),
        }
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.state, "reading form id")?.id)
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    pub fn register_required_field<L>(&self, lens: L) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        self.register_required_key(lens.key())
    }

    pub(super) fn register_required_key(&self, key: FieldKey) -> FormResult<()> {
        let mut required = write_lock(&self.required_fields, "registering required field")?;
        required.insert(key);
        Ok(())
    }

    /// Appends `key` to the order used to pick the first errored field.
    pub(super) fn register_field_order(&self, key: FieldKey) -> FormResult<()> {
        let mut state = write_lock(&self.state, "registering field order")?;
        if !state.field_order.contains(&key) {
            state.field_order.push(key);
        }
        Ok(())
    }

    /// Validates the whole form and hands a copy of the model to `f` when it
    /// passes. A failing form marks every known field touched and `f` is
    /// never called.
    pub fn submit(&self, f: impl FnOnce(&T) -> FormResult<()>) -> FormResult<()> {
        let Some(model) = self.begin_submit()? else {
            return Ok(());
        };
        let submit_result = f(&model);
        self.finish_submit(submit_result)
    }

    pub async fn submit_async<F, Fut>(&self, f: F) -> FormResult<()>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = FormResult<()>>,
    {
        let Some(model) = self.begin_submit()? else {
            return Ok(());
        };
        let mut pending = PendingSubmit {
            state: &self.state,
            armed: true,
        };
        let submit_result = f(model).await;
        pending.armed = false;
        self.finish_submit(submit_result)
    }

    fn begin_submit(&self) -> FormResult<Option<T>> {
        {
            let mut state = write_lock(&self.state, "preparing submit")?;
            if state.submit_state == SubmitState::Submitting {
                return Err(FormError::AlreadySubmitting);
            }
            transition_submit_state(&mut state, SubmitState::Validating)?;
            state.submit_count = state.submit_count.saturating_add(1);
        }

        if !self.validate_form()? {
            self.touch_all()?;
            let mut state = write_lock(&self.state, "handling submit validation failure")?;
            transition_submit_state(&mut state, SubmitState::Failed)?;
            tracing::debug!(
                submit_count = state.submit_count,
                first_error = state.first_error.map(FieldKey::as_str),
                "submit blocked by validation errors"
            );
            return Ok(None);
        }

        let mut state = write_lock(&self.state, "moving submit state to submitting")?;
        transition_submit_state(&mut state, SubmitState::Submitting)?;
        Ok(Some(state.model.clone()))
    }

    fn finish_submit(&self, submit_result: FormResult<()>) -> FormResult<()> {
        let mut state = write_lock(&self.state, "completing submit")?;
        match &submit_result {
            Ok(()) => transition_submit_state(&mut state, SubmitState::Succeeded)?,
            Err(error) => {
                tracing::warn!(%error, "submit handler failed");
                transition_submit_state(&mut state, SubmitState::Failed)?;
            }
        }
        submit_result
    }

    /// The first field with an error, in declared field order. A UI uses it to
    /// move focus after a blocked submit.
    pub fn first_error(&self) -> FormResult<Option<FieldKey>> {
        Ok(read_lock(&self.state, "reading first error key")?.first_error)
    }

    pub fn reset_to_initial(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "resetting form")?;
        state.model = state.initial_model.clone();
        state.submit_state = SubmitState::Idle;
        state.submit_count = 0;
        state.dirty_fields.clear();
        state.first_error = None;
        for meta in state.field_meta.values_mut() {
            *meta = FieldMeta::default();
        }
        Ok(())
    }

    pub fn reset_field<L>(&self, lens: L) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let key = lens.key();
        let mut state = write_lock(&self.state, "resetting field")?;
        let initial_value = lens.get(&state.initial_model).clone();
        lens.set(&mut state.model, initial_value);
        state.dirty_fields.remove(&key);
        *state.ensure_meta(key) = FieldMeta::default();
        state.refresh_first_error();
        Ok(())
    }

    pub fn clear_errors(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "clearing all field errors")?;
        for meta in state.field_meta.values_mut() {
            meta.errors.clear();
        }
        state.first_error = None;
        Ok(())
    }

    pub fn clear_field_errors<L>(&self, lens: L) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let mut state = write_lock(&self.state, "clearing field errors")?;
        if let Some(meta) = state.field_meta.get_mut(&lens.key()) {
            meta.errors.clear();
        }
        state.refresh_first_error();
        Ok(())
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot<T, E>> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        let is_valid = state.field_meta.values().all(|meta| meta.errors.is_empty());
        Ok(FormSnapshot {
            model: state.model.clone(),
            submit_state: state.submit_state,
            submit_count: state.submit_count,
            is_dirty: !state.dirty_fields.is_empty(),
            is_valid,
            field_meta: state.field_meta.clone(),
        })
    }

    pub fn field_meta<L>(&self, lens: L) -> FormResult<Option<FieldMeta<E>>>
    where
        L: FieldLens<T>,
    {
        Ok(read_lock(&self.state, "reading field meta")?
            .field_meta
            .get(&lens.key())
            .cloned())
    }

    pub fn is_required<L>(&self, lens: L) -> FormResult<bool>
    where
        L: FieldLens<T>,
    {
        Ok(read_lock(&self.required_fields, "reading required fields")?.contains(&lens.key()))
    }
}

/// Fails a submit whose future is dropped while the handler is still pending,
/// so the form does not stay `Submitting`.
struct PendingSubmit<'a, T, E> {
    state: &'a RwLock<FormState<T, E>>,
    armed: bool,
}

impl<T, E> Drop for PendingSubmit<'_, T, E> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut state) = self.state.write() {
            if transition_submit_state(&mut state, SubmitState::Failed).is_ok() {
                tracing::debug!("async submit dropped before the handler finished");
            }
        }
    }
}

pub(super) fn transition_submit_state<T, E>(
    state: &mut FormState<T, E>,
    next: SubmitState,
) -> FormResult<()> {
    let current = state.submit_state;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Validating)
            | (SubmitState::Validating, SubmitState::Submitting)
            | (SubmitState::Validating, SubmitState::Failed)
            | (SubmitState::Submitting, SubmitState::Succeeded)
            | (SubmitState::Submitting, SubmitState::Failed)
            | (SubmitState::Succeeded, SubmitState::Validating)
            | (SubmitState::Failed, SubmitState::Validating)
            | (_, SubmitState::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    tracing::debug!(from = ?current, to = ?next, "submit state changed");
    state.submit_state = next;
    Ok(())
}

/// Declared order wins; fields without a declared position follow in key order.
pub(super) fn first_error_key<E>(
    order: &[FieldKey],
    field_meta: &BTreeMap<FieldKey, FieldMeta<E>>,
) -> Option<FieldKey> {
    let has_errors = |key: &FieldKey| {
        field_meta
            .get(key)
            .is_some_and(|meta| !meta.errors.is_empty())
    };
    order.iter().copied().find(has_errors).or_else(|| {
        field_meta
            .keys()
            .copied()
            .find(|key| !order.contains(key) && has_errors(key))
    })
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
