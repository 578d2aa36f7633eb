use std::collections::BTreeMap;

use rocket::get;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;

use crate::modules::models::rating::ScoreEntry;
use crate::modules::session::LiveSessions;

/**************************************************************************************************/
/**************** ROUTES **************************************************************************/
/**************************************************************************************************/

/// karts of the running session, best score first
#[get("/ratings")]
pub async fn get_ratings(sessions: &State<LiveSessions>) -> Json<Vec<ScoreEntry>> {
    Json(sessions.pipeline().await.ratings())
}

#[get("/pits")]
pub async fn get_pit_log(sessions: &State<LiveSessions>) -> Json<Vec<String>> {
    Json(sessions.pipeline().await.pit_log())
}

#[get("/karts/laps")]
pub async fn get_all_laps(sessions: &State<LiveSessions>) -> Json<BTreeMap<String, Vec<f64>>> {
    Json(sessions.pipeline().await.all_lap_times())
}

#[get("/karts/<kart_id>/laps")]
pub async fn get_laps(kart_id: String, sessions: &State<LiveSessions>) -> Result<Json<Vec<f64>>, Status> {
    match sessions.pipeline().await.lap_times(&kart_id) {
        Some(times) => Ok(Json(times)),
        None => Err(Status::NotFound),
    }
}
