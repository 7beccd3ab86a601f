use std::process;

fn main() {
    // .env may carry APP_ADMIN_EMAIL / APP_ADMIN_PASSWORD prompt defaults
    let _ = dotenvy::dotenv();

    match apptask::cli::run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
