#[derive(Clone, regform::form::FormModel)]
#[allow(dead_code)]
struct SignupForm {
    #[form(skip)]
    display_name: String,
}

fn main() {}
