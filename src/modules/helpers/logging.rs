use fern::Dispatch;

use crate::modules::helpers::settings::Settings;

pub fn setup_logging(settings: &Settings) -> Result<(), fern::InitError> {
    let mut base_config = fern::Dispatch::new();

    base_config = match settings.logging_level.to_uppercase().as_str() {
        "OFF" => base_config.level(log::LevelFilter::Off),
        "ERROR" => base_config.level(log::LevelFilter::Error),
        "WARN" => base_config.level(log::LevelFilter::Warn),
        "DEBUG" => base_config.level(log::LevelFilter::Debug),
        "TRACE" => base_config.level(log::LevelFilter::Trace),
        _ => {
            // default to info
            base_config.level(log::LevelFilter::Info)
        },
    };

    // rocket is chatty on info, only keep its warnings
    base_config = base_config
        .level_for("rocket", log::LevelFilter::Warn)
        .level_for("_", log::LevelFilter::Warn);

    let file_logger_config = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .chain(fern::log_file(&settings.log_file)?)
        .chain(std::io::stdout());

    base_config
        .chain(file_logger_config)
        .apply()?;

    Ok(())
}
