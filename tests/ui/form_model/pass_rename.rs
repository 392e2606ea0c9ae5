use regform::form::{FieldLens, FormModel};

#[derive(Clone, regform::form::FormModel)]
#[form(rename_all = "camelCase")]
struct SignupForm {
    display_name: String,
    #[form(rename = "acceptedTos")]
    terms_accepted: bool,
}

fn main() {
    let fields = SignupForm::fields();
    assert_eq!(fields.display_name().key().as_str(), "displayName");
    assert_eq!(fields.terms_accepted().key().as_str(), "acceptedTos");

    let mut model = SignupForm {
        display_name: String::new(),
        terms_accepted: false,
    };
    fields.terms_accepted().set(&mut model, true);
    assert!(*fields.terms_accepted().get(&model));
    assert!(model.display_name.is_empty());
}
