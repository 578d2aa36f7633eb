use std::sync::Arc;

use log::info;
use rocket::{launch, routes, Build, Rocket};

use live_kart_ratings::modules::helpers::logging::setup_logging;
use live_kart_ratings::modules::helpers::settings::Settings;
use live_kart_ratings::modules::session::{LiveSessions, SessionConfig};
use live_kart_ratings::modules::timing_api::TimingClient;
use live_kart_ratings::modules::timing_table::ApexTableExtractor;
use live_kart_ratings::routes::{api, proxy};

#[launch]
async fn rocket() -> Rocket<Build> {
    let settings = Settings::from_env().expect("Failed to read settings");
    setup_logging(&settings).expect("Failed to setup logging");

    let client = TimingClient::new(settings.fetch_timeout).expect("Failed to create http client");
    let extractor = ApexTableExtractor::new().expect("Failed to compile row patterns");
    let sessions = LiveSessions::new(client, Arc::new(extractor));

    // start polling right away when a timing page is configured
    if let Some(url) = &settings.timing_url {
        let mut config = SessionConfig::new(url.as_str());
        config.poll_interval = settings.poll_interval;
        config.auto_detect_pit = settings.auto_detect_pit;
        sessions.start(config).await;
    } else {
        info!(target: "main", "no TIMING_URL configured, waiting for /api/session/start");
    }

    let figment = rocket::Config::figment().merge(("port", settings.port));

    rocket::custom(figment)
        .manage(sessions)
        .mount(
            "/api",
            routes![
                // session
                api::session::get_status,
                api::session::start,
                api::session::stop,
                // projections
                api::kart::get_ratings,
                api::kart::get_pit_log,
                api::kart::get_all_laps,
                api::kart::get_laps,
            ],
        )
        .mount("/", routes![proxy::proxy])
}
