use crate::auth::{self, User, SESSION_COOKIE};
use crate::http::error::HandlerErr;
use actix_web::cookie::{time, Cookie};
use actix_web::HttpRequest;
use rusqlite::Connection;
use serde_json::json;

pub fn session_token(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_max_age(time::Duration::days(auth::SESSION_AGE_DAYS));
    cookie
}

pub fn current_user(conn: &Connection, token: Option<&str>) -> Result<Option<User>, HandlerErr> {
    let Some(token) = token else {
        return Ok(None);
    };
    auth::session_user(conn, token).map_err(|e| HandlerErr::db("db_query_failed", e))
}

pub fn require_user(conn: &Connection, token: Option<&str>) -> Result<User, HandlerErr> {
    current_user(conn, token)?
        .ok_or_else(|| HandlerErr::new("login_required", "authentication required"))
}

pub fn menu(auth: bool) -> serde_json::Value {
    let mut items = vec![json!({ "title": "About", "url": "/about/" })];
    if auth {
        items.push(json!({ "title": "Add student", "url": "/addstudent/" }));
    }
    items.push(json!({ "title": "Students", "url": "/students/" }));
    items.push(json!({ "title": "Teachers", "url": "/teachers/" }));
    items.push(json!({ "title": "Gradebook", "url": "/gradebook/" }));
    serde_json::Value::Array(items)
}

/// Context shared by every page: title, menu and login state.
pub fn page_context(title: &str, auth: bool) -> serde_json::Value {
    json!({
        "title": title,
        "menu": menu(auth),
        "auth": auth,
    })
}

/// Reads an optional integer id from a query parameter. Missing and blank
/// values are `None`.
pub fn optional_id(name: &str, raw: Option<&str>) -> Result<Option<i64>, HandlerErr> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse::<i64>().map(Some).map_err(|_| {
            let mut details = serde_json::Map::new();
            details.insert(name.to_string(), json!(v));
            HandlerErr::bad_params(format!("{} must be an integer id", name))
                .with_details(serde_json::Value::Object(details))
        }),
    }
}
