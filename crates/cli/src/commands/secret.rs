//! Secret generation.

use secrecy::ExposeSecret;

use family_planner_web::config::generate_secret_key;

/// Print a new `SECRET_KEY` value to stdout.
pub fn print() {
    let secret = generate_secret_key();

    #[allow(clippy::print_stdout)]
    {
        println!("{}", secret.expose_secret());
    }
}
