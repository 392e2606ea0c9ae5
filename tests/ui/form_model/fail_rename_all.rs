#[derive(Clone, regform::form::FormModel)]
#[form(rename_all = "kebab-case")]
#[allow(dead_code)]
struct SignupForm {
    display_name: String,
}

fn main() {}
