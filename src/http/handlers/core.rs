use crate::http::error::respond;
use crate::http::helpers::{current_user, page_context, session_token};
use crate::http::types::{with_db, AppState};
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    respond(Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "workspacePath": state.workspace.to_string_lossy(),
    })))
}

async fn static_page(state: web::Data<AppState>, req: HttpRequest, title: &'static str) -> HttpResponse {
    let token = session_token(&req);
    let result = with_db(&state, move |conn| {
        let auth = current_user(conn, token.as_deref())?.is_some();
        Ok(page_context(title, auth))
    })
    .await;
    respond(result)
}

pub async fn about(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    static_page(state, req, "About").await
}

pub async fn teachers(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    static_page(state, req, "Teachers").await
}
