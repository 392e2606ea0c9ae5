pub mod form;
pub mod prelude;
pub mod registration;

pub use registration::{RegistrationForm, registration_controller, registration_schema};
