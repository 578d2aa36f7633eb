use rocket::get;
use rocket::http::Status;
use rocket::response::content::RawHtml;
use rocket::State;

use crate::modules::session::LiveSessions;

/// fetch a page on behalf of a browser that is not allowed to fetch it itself.
/// the body is passed on whatever status the page was served with
#[get("/proxy?<url>")]
pub async fn proxy(url: Option<String>, sessions: &State<LiveSessions>) -> Result<RawHtml<String>, (Status, &'static str)> {
    let url = match url.filter(|url| !url.trim().is_empty()) {
        Some(url) => url,
        None => return Err((Status::BadRequest, "missing url")),
    };

    match sessions.fetcher().forward_page(&url).await {
        Ok(page) => Ok(RawHtml(page)),
        Err(_) => Err((Status::InternalServerError, "fetch error")),
    }
}
