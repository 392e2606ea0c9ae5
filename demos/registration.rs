//! Drives the registration form through a scripted session: a premature
//! submit, a round of corrections with blur events, and a final submit.

use regform::form::{FormController, FormModel, FormOptions, RuleViolation, ValidationError};
use regform::registration::{RegistrationForm, log_submission, registration_controller};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let form = registration_controller(FormOptions::default())?;
    let fields = RegistrationForm::fields();

    form.set(fields.name(), "Al".into())?;
    form.touch(fields.name())?;
    form.set(fields.phone(), "12345".into())?;
    form.submit(log_submission)?;
    print_visible_errors(&form)?;

    form.set(fields.name(), "Ann Lee".into())?;
    form.set(fields.email(), "a@b.com".into())?;
    form.set(fields.phone(), "1234567890".into())?;
    form.set(fields.password(), "secret".into())?;
    form.set(fields.confirm_password(), "secret".into())?;
    form.set(fields.address(), "1 Main St".into())?;
    form.set(fields.terms_accepted(), true)?;
    form.touch(fields.terms_accepted())?;
    form.submit(log_submission)?;

    let snapshot = form.snapshot()?;
    println!(
        "submit state: {:?} after {} attempt(s)",
        snapshot.submit_state, snapshot.submit_count
    );
    Ok(())
}

fn print_visible_errors(
    form: &FormController<RegistrationForm, RuleViolation>,
) -> Result<(), Box<dyn std::error::Error>> {
    for (key, error) in form.visible_errors()? {
        println!("{key}: {}", error.message());
    }
    Ok(())
}
