//! rTimeclock main entrypoint.

use rtimeclock::errors::AppError;
use rtimeclock::run;
use rtimeclock::ui::messages::error;

fn main() {
    if let Err(e) = run() {
        match &e {
            AppError::Session(se) if se.is_retryable() => {
                error(format!("Error: {} (nothing was lost, try again)", e))
            }
            _ => error(format!("Error: {}", e)),
        }
        std::process::exit(1);
    }
}
