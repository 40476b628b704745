use std::sync::Once;

use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

static LOGGER_INIT: Once = Once::new();

const CONFIG_FILE: &str = "logging_config.yaml";

/// Initializes the `log4rs` logger from `logging_config.yaml`, falling back
/// to a plain stdout logger. Only the first call has an effect.
pub fn init() {
    LOGGER_INIT.call_once(|| {
        match log4rs::init_file(CONFIG_FILE, Default::default()) {
            Ok(_) => {
                log::info!("reconlib logging initialized from {CONFIG_FILE}.");
            }
            Err(e) => {
                eprintln!("ERROR: Failed to initialize logger from {CONFIG_FILE}: {e}");
                eprintln!("Falling back to basic stdout logging (Debug level).");
                init_fallback(LevelFilter::Debug);
            }
        }
    });
}

fn init_fallback(level: LevelFilter) {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{h({d(%Y-%m-%d %H:%M:%S)(utc)} - {l}: {m}{n})}",
        )))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level));

    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("ERROR: Failed to initialize fallback logger: {e}. No logging will be available.");
            } else {
                log::warn!("reconlib logging initialized using basic fallback (stdout, {level} level).");
            }
        }
        Err(e) => {
            eprintln!("ERROR: Failed to build fallback logging configuration: {e}. No logging will be available.");
        }
    }
}
