pub use crate::form::{
    FieldKey, FieldLens, FieldSpec, FormController, FormError, FormErrors, FormModel,
    FormOptions, FormResult, RuleViolation, Schema, SubmitState, ValidationError,
    ValidationMode, ValidationScope,
};
pub use crate::registration::{
    RegistrationForm, log_submission, registration_controller, registration_schema,
};
