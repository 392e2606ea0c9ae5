use super::*;
use crate::form::{FieldLens, SubmitState, ValidationMode, ValidationScope};
use std::sync::{Arc, Mutex};

fn valid_form() -> RegistrationForm {
    RegistrationForm {
        name: "Ann Lee".into(),
        email: "a@b.com".into(),
        phone: "1234567890".into(),
        password: "secret".into(),
        confirm_password: "secret".into(),
        address: "1 Main St".into(),
        terms_accepted: true,
    }
}

fn message_for<L>(values: &RegistrationForm, lens: L) -> Option<SharedString>
where
    L: FieldLens<RegistrationForm>,
{
    validate(values)
        .get(&lens.key())
        .map(|error| error.message.clone())
}

#[test]
fn keys_use_camel_case_names() {
    let fields = RegistrationForm::fields();
    let keys = registration_schema()
        .fields()
        .iter()
        .map(|spec| spec.key().as_str())
        .collect::<Vec<_>>();
    assert_eq!(
        keys,
        vec![
            "name",
            "email",
            "phone",
            "password",
            "confirmPassword",
            "address",
            "termsAccepted"
        ]
    );
    assert_eq!(fields.terms_accepted().key().as_str(), "termsAccepted");
}

#[test]
fn valid_values_produce_no_errors() {
    assert!(validate(&valid_form()).is_empty());
    assert!(registration_schema().is_valid(&valid_form()));
}

#[test]
fn empty_form_reports_required_for_every_field() {
    let errors = validate(&RegistrationForm::default());
    assert_eq!(errors.len(), 7);
    let fields = RegistrationForm::fields();
    assert_eq!(
        errors[&fields.name().key()].message,
        SharedString::from("Name is required")
    );
    assert_eq!(
        errors[&fields.confirm_password().key()].message,
        SharedString::from("Please confirm your password")
    );
    assert_eq!(errors[&fields.terms_accepted().key()].rule, "must_be_true");
}

#[test]
fn short_names_get_the_minimum_length_message() {
    let fields = RegistrationForm::fields();
    for name in ["A", "Al", "é"] {
        let values = RegistrationForm {
            name: name.into(),
            ..valid_form()
        };
        assert_eq!(
            message_for(&values, fields.name()),
            Some(SharedString::from("Name must be at least 3 characters")),
            "name {name:?}"
        );
    }
    let values = RegistrationForm {
        name: "Ann".into(),
        ..valid_form()
    };
    assert_eq!(message_for(&values, fields.name()), None);
}

#[test]
fn email_must_have_an_at_sign_and_domain() {
    let fields = RegistrationForm::fields();
    for email in ["ann.example.com", "ann@", "@example.com", "ann @example.com"] {
        let values = RegistrationForm {
            email: email.into(),
            ..valid_form()
        };
        assert_eq!(
            message_for(&values, fields.email()),
            Some(SharedString::from("Invalid email address")),
            "email {email:?}"
        );
    }
    let values = RegistrationForm {
        email: "ann.lee+signup@mail.example.org".into(),
        ..valid_form()
    };
    assert_eq!(message_for(&values, fields.email()), None);
}

#[test]
fn phone_requires_exactly_ten_ascii_digits() {
    let fields = RegistrationForm::fields();
    for phone in ["12345", "12345678901", "123456789a", "123-456-7890", "١٢٣٤٥٦٧٨٩٠"] {
        let values = RegistrationForm {
            phone: phone.into(),
            ..valid_form()
        };
        assert_eq!(
            message_for(&values, fields.phone()),
            Some(SharedString::from("Phone number must be exactly 10 digits")),
            "phone {phone:?}"
        );
    }
    assert_eq!(message_for(&valid_form(), fields.phone()), None);
}

#[test]
fn password_needs_six_characters() {
    let fields = RegistrationForm::fields();
    let values = RegistrationForm {
        password: "abc12".into(),
        confirm_password: "abc12".into(),
        ..valid_form()
    };
    assert_eq!(
        message_for(&values, fields.password()),
        Some(SharedString::from("Password must be at least 6 characters"))
    );
}

#[test]
fn confirm_password_must_match_password() {
    let fields = RegistrationForm::fields();
    let matching = RegistrationForm {
        password: "abc123".into(),
        confirm_password: "abc123".into(),
        ..valid_form()
    };
    assert_eq!(message_for(&matching, fields.confirm_password()), None);

    let mismatched = RegistrationForm {
        password: "abc123".into(),
        confirm_password: "xyz".into(),
        ..valid_form()
    };
    assert_eq!(
        message_for(&mismatched, fields.confirm_password()),
        Some(SharedString::from("Passwords must match"))
    );
}

#[test]
fn whitespace_address_counts_as_present() {
    let fields = RegistrationForm::fields();
    let values = RegistrationForm {
        address: " ".into(),
        ..valid_form()
    };
    assert_eq!(message_for(&values, fields.address()), None);
}

#[test]
fn unaccepted_terms_always_fail() {
    let fields = RegistrationForm::fields();
    for values in [
        RegistrationForm {
            terms_accepted: false,
            ..valid_form()
        },
        RegistrationForm::default(),
    ] {
        assert_eq!(
            message_for(&values, fields.terms_accepted()),
            Some(SharedString::from("You must accept the terms and conditions"))
        );
    }
}

#[test]
fn controller_submits_exact_values_when_valid() {
    let fields = RegistrationForm::fields();
    let controller = registration_controller(FormOptions::default()).expect("controller");
    let expected = valid_form();

    controller.set(fields.name(), expected.name.clone()).expect("name");
    controller.set(fields.email(), expected.email.clone()).expect("email");
    controller.set(fields.phone(), expected.phone.clone()).expect("phone");
    controller
        .set(fields.password(), expected.password.clone())
        .expect("password");
    controller
        .set(fields.confirm_password(), expected.confirm_password.clone())
        .expect("confirm");
    controller
        .set(fields.address(), expected.address.clone())
        .expect("address");
    controller.set(fields.terms_accepted(), true).expect("terms");
    assert!(controller.errors().expect("errors").is_empty());

    let received = Arc::new(Mutex::new(None));
    let sink = received.clone();
    controller
        .submit(move |values| {
            *sink.lock().expect("sink lock") = Some(values.clone());
            log_submission(values)
        })
        .expect("submit");

    assert_eq!(
        received.lock().expect("received lock").clone(),
        Some(expected)
    );
    assert_eq!(
        controller.snapshot().expect("snapshot").submit_state,
        SubmitState::Succeeded
    );
}

#[test]
fn failed_submit_reveals_all_errors_and_skips_sink() {
    let fields = RegistrationForm::fields();
    let controller = registration_controller(FormOptions::default()).expect("controller");
    controller.set(fields.name(), "Ann Lee".into()).expect("name");
    assert!(controller.visible_errors().expect("visible").is_empty());

    let called = Arc::new(Mutex::new(false));
    let flag = called.clone();
    controller
        .submit(move |_values| {
            *flag.lock().expect("flag lock") = true;
            Ok(())
        })
        .expect("blocked submit");

    assert!(!*called.lock().expect("called lock"));
    let visible = controller.visible_errors().expect("visible");
    assert_eq!(visible.len(), 6);
    assert!(!visible.contains_key(&fields.name().key()));
    assert_eq!(
        controller.first_error().expect("first error"),
        Some(fields.email().key())
    );
    assert_eq!(
        controller.snapshot().expect("snapshot").submit_state,
        SubmitState::Failed
    );
}

#[test]
fn errors_stay_hidden_until_blur() {
    let fields = RegistrationForm::fields();
    let controller = registration_controller(FormOptions::default()).expect("controller");

    controller.set(fields.phone(), "12345".into()).expect("phone");
    assert_eq!(
        controller.errors().expect("errors")[&fields.phone().key()].rule,
        "matches"
    );
    assert_eq!(
        controller
            .field_error_for_display(fields.phone())
            .expect("display"),
        None
    );

    controller.touch(fields.phone()).expect("blur phone");
    assert_eq!(
        controller
            .field_error_for_display(fields.phone())
            .expect("display"),
        Some(SharedString::from("Phone number must be exactly 10 digits"))
    );
    assert_eq!(
        controller
            .field_error_for_display(fields.email())
            .expect("display"),
        None
    );
}

#[test]
fn changing_password_revalidates_confirmation() {
    let fields = RegistrationForm::fields();
    let controller = registration_controller(FormOptions {
        scope: ValidationScope::Field,
        ..FormOptions::default()
    })
    .expect("controller");

    controller
        .set(fields.password(), "abc123".into())
        .expect("password");
    controller
        .set(fields.confirm_password(), "abc123".into())
        .expect("confirm");
    assert_eq!(
        controller
            .field_meta(fields.confirm_password())
            .expect("meta")
            .map(|meta| meta.errors.is_empty()),
        Some(true)
    );

    controller
        .set(fields.password(), "abc1234".into())
        .expect("password change");
    assert_eq!(
        controller
            .field_meta(fields.confirm_password())
            .expect("meta")
            .and_then(|meta| meta.errors.first().map(|error| error.message.clone())),
        Some(SharedString::from("Passwords must match"))
    );
}

#[test]
fn controller_errors_track_current_values() {
    let fields = RegistrationForm::fields();
    let controller = registration_controller(FormOptions::default()).expect("controller");

    controller.set(fields.name(), "Al".into()).expect("name");
    let snapshot = controller.snapshot().expect("snapshot");
    assert_eq!(snapshot.errors(), validate(&snapshot.model));

    controller.set(fields.name(), "Ann".into()).expect("name");
    let snapshot = controller.snapshot().expect("snapshot");
    assert_eq!(snapshot.errors(), validate(&snapshot.model));
    assert!(!snapshot.errors().contains_key(&fields.name().key()));
}

#[test]
fn required_fields_are_flagged() {
    let fields = RegistrationForm::fields();
    let controller = registration_controller(FormOptions::default()).expect("controller");
    assert!(controller.is_required(fields.address()).expect("address"));
    assert!(
        controller
            .is_required(fields.terms_accepted())
            .expect("terms")
    );
}

#[test]
fn debug_output_redacts_passwords() {
    let rendered = format!("{:?}", valid_form());
    assert!(rendered.contains("Ann Lee"));
    assert!(!rendered.contains("secret"));
    assert!(rendered.contains("<redacted>"));
}

#[test]
fn shared_schema_is_built_once_and_matches_a_fresh_one() {
    assert!(std::ptr::eq(schema(), schema()));
    let values = RegistrationForm {
        name: "Al".into(),
        phone: "12345".into(),
        ..valid_form()
    };
    assert_eq!(validate(&values), registration_schema().validate(&values));
    assert_eq!(
        validate(&RegistrationForm::default()),
        registration_schema().validate(&RegistrationForm::default())
    );
}

#[test]
fn on_submit_mode_keeps_errors_empty_until_submit() {
    let fields = RegistrationForm::fields();
    let controller = registration_controller(FormOptions {
        validate_mode: ValidationMode::OnSubmit,
        ..FormOptions::default()
    })
    .expect("controller");

    controller.set(fields.name(), "Al".into()).expect("name");
    controller.touch(fields.name()).expect("blur name");
    assert!(controller.errors().expect("errors").is_empty());

    controller.submit(|_values| Ok(())).expect("blocked submit");
    assert_eq!(
        controller.errors().expect("errors")[&fields.name().key()].rule,
        "min_len"
    );
}
