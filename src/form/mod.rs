mod controller;
mod display;
mod schema;
mod validation;


pub use controller::{
    FieldKey, FieldMeta, FormController, FormError, FormErrors, FormId, FormOptions, FormResult,
    FormSnapshot, RevalidateMode, SubmitState, ValidationMode, ValidationScope,
};
pub use regform_derive::FormModel;
pub use schema::{BooleanField, FieldKind, FieldSpec, RuleViolation, Schema, TextField};
pub use validation::{FieldLens, FieldValidator, FormModel, FormValidator, ValidationError};
