use kobo_export::config::Config;
use kobo_export::{app, logger};

fn main() {
    logger::init_logger();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = app::run(&config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
