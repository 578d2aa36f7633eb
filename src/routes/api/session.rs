use std::time::Duration;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use serde::Deserialize;

use crate::modules::session::{LiveSessions, SessionConfig, SessionStatus};

#[derive(Deserialize, Debug)]
pub struct StartRequest {
    pub url: String,
    pub poll_interval_ms: Option<u64>,
    pub auto_detect_pit: Option<bool>,
}

/**************************************************************************************************/
/**************** ROUTES **************************************************************************/
/**************************************************************************************************/

#[get("/session")]
pub async fn get_status(sessions: &State<LiveSessions>) -> Json<SessionStatus> {
    Json(sessions.status().await)
}

/// start polling a timing page, replaces a running session
#[post("/session/start", data = "<request>")]
pub async fn start(request: Json<StartRequest>, sessions: &State<LiveSessions>) -> Result<Json<SessionStatus>, Status> {
    let request = request.into_inner();
    let url = request.url.trim();
    if url.is_empty() || request.poll_interval_ms == Some(0) {
        return Err(Status::BadRequest);
    }

    let mut config = SessionConfig::new(url);
    if let Some(poll_interval_ms) = request.poll_interval_ms {
        config.poll_interval = Duration::from_millis(poll_interval_ms);
    }
    if let Some(auto_detect_pit) = request.auto_detect_pit {
        config.auto_detect_pit = auto_detect_pit;
    }

    sessions.start(config).await;
    Ok(Json(sessions.status().await))
}

#[post("/session/stop")]
pub async fn stop(sessions: &State<LiveSessions>) -> Json<SessionStatus> {
    sessions.stop().await;
    Json(sessions.status().await)
}
