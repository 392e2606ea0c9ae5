//! The registration form: its model, validation rules and a ready-wired
//! controller.

use std::fmt::{Debug, Formatter};
use std::sync::LazyLock;

use gpui::SharedString;
use regex::Regex;

use crate::form::{
    FieldSpec, FormController, FormErrors, FormModel, FormOptions, FormResult, RuleViolation,
    Schema,
};

#[cfg(test)]
mod tests;

/// WHATWG `input[type=email]` shape.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern compiles")
});

// ASCII digits only; `\d` would also accept other scripts' digits.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern compiles"));

pub const NAME_MIN_LEN: usize = 3;
pub const PASSWORD_MIN_LEN: usize = 6;

static REGISTRATION_SCHEMA: LazyLock<Schema<RegistrationForm>> =
    LazyLock::new(registration_schema);

#[derive(Clone, Default, PartialEq, Eq, FormModel)]
#[form(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub name: SharedString,
    pub email: SharedString,
    pub phone: SharedString,
    pub password: SharedString,
    pub confirm_password: SharedString,
    pub address: SharedString,
    pub terms_accepted: bool,
}

impl Debug for RegistrationForm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password", &redacted(&self.password))
            .field("confirm_password", &redacted(&self.confirm_password))
            .field("address", &self.address)
            .field("terms_accepted", &self.terms_accepted)
            .finish()
    }
}

fn redacted(value: &SharedString) -> &'static str {
    if value.is_empty() { "" } else { "<redacted>" }
}

type Spec = FieldSpec<RegistrationForm>;

/// Builds a fresh registration schema. Use [`schema`] for the shared instance.
pub fn registration_schema() -> Schema<RegistrationForm> {
    let fields = RegistrationForm::fields();
    Schema::new()
        .field(
            Spec::text(fields.name())
                .required("Name is required")
                .min_len(NAME_MIN_LEN, "Name must be at least 3 characters"),
        )
        .field(
            Spec::text(fields.email())
                .required("Email is required")
                .matches(&EMAIL_PATTERN, "Invalid email address"),
        )
        .field(
            Spec::text(fields.phone())
                .required("Phone number is required")
                .matches(&PHONE_PATTERN, "Phone number must be exactly 10 digits"),
        )
        .field(
            Spec::text(fields.password())
                .required("Password is required")
                .min_len(PASSWORD_MIN_LEN, "Password must be at least 6 characters"),
        )
        .field(
            Spec::text(fields.confirm_password())
                .required("Please confirm your password")
                .equals(fields.password(), "Passwords must match"),
        )
        .field(Spec::text(fields.address()).required("Address is required"))
        .field(
            Spec::boolean(fields.terms_accepted())
                .must_be_true("You must accept the terms and conditions"),
        )
}

/// The registration schema, built once.
pub fn schema() -> &'static Schema<RegistrationForm> {
    &REGISTRATION_SCHEMA
}

/// Validates a full set of registration values. Empty means the form may be
/// submitted.
pub fn validate(values: &RegistrationForm) -> FormErrors<RuleViolation> {
    schema().validate(values)
}

/// A controller over an empty registration form with the registration schema
/// registered.
pub fn registration_controller(
    options: FormOptions,
) -> FormResult<FormController<RegistrationForm, RuleViolation>> {
    let controller = FormController::new(RegistrationForm::default(), options);
    controller.register_schema(schema())?;
    Ok(controller)
}

/// Default submit sink: records the accepted registration in the log.
pub fn log_submission(values: &RegistrationForm) -> FormResult<()> {
    tracing::info!(registration = ?values, "registration submitted");
    Ok(())
}
