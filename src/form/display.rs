use gpui::SharedString;

use super::controller::{FieldKey, FormController, FormErrors, FormResult, read_lock};
use super::validation::{FieldLens, ValidationError};

impl<T, E> FormController<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: ValidationError,
{
    /// The message a UI should render under the field, if any. Errors stay
    /// hidden until the field is touched.
    pub fn field_error_for_display<L>(&self, lens: L) -> FormResult<Option<SharedString>>
    where
        L: FieldLens<T>,
    {
        self.display_error_message(lens.key())
    }

    /// Errors of touched fields only.
    pub fn visible_errors(&self) -> FormResult<FormErrors<E>> {
        let state = read_lock(&self.state, "reading visible errors")?;
        Ok(state
            .field_meta
            .iter()
            .filter(|(_, meta)| meta.touched)
            .filter_map(|(key, meta)| meta.errors.first().map(|error| (*key, error.clone())))
            .collect())
    }

    pub fn is_touched<L>(&self, lens: L) -> FormResult<bool>
    where
        L: FieldLens<T>,
    {
        Ok(read_lock(&self.state, "reading touched flag")?
            .field_meta
            .get(&lens.key())
            .is_some_and(|meta| meta.touched))
    }

    fn display_error_message(&self, key: FieldKey) -> FormResult<Option<SharedString>> {
        let state = read_lock(&self.state, "reading display error message")?;
        let Some(meta) = state.field_meta.get(&key) else {
            return Ok(None);
        };
        if !meta.touched {
            return Ok(None);
        }
        Ok(meta.errors.first().map(ValidationError::message))
    }
}
