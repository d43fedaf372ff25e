use crate::auth;
use crate::forms::{FieldErrors, LoginForm, RegisterForm};
use crate::http::error::{ok, respond, HandlerErr};
use crate::http::helpers::{current_user, page_context, session_cookie, session_token};
use crate::http::types::{with_db, AppState};
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

fn logged_in(ctx: serde_json::Value, token: String) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(session_cookie(token))
        .json(ok(ctx))
}

async fn form_page(state: web::Data<AppState>, req: HttpRequest, title: &'static str) -> HttpResponse {
    let token = session_token(&req);
    let result = with_db(&state, move |conn| {
        let auth = current_user(conn, token.as_deref())?.is_some();
        Ok(page_context(title, auth))
    })
    .await;
    respond(result)
}

pub async fn register_form(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    form_page(state, req, "Register").await
}

pub async fn login_form(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    form_page(state, req, "Login").await
}

pub async fn register(state: web::Data<AppState>, form: web::Json<RegisterForm>) -> HttpResponse {
    let form = form.into_inner();
    let result = with_db(&state, move |conn| {
        let mut errors = FieldErrors::default();
        let clean = form.clean(&mut errors);
        if let Some(reg) = &clean {
            if auth::username_taken(conn, &reg.username)
                .map_err(|e| HandlerErr::db("db_query_failed", e))?
            {
                errors.add("username", "A user with that username already exists.");
            }
        }
        let (Some(reg), true) = (clean, errors.is_empty()) else {
            return Err(HandlerErr::invalid_form(&errors));
        };

        let user = auth::create_user(conn, &reg.username, &reg.email, &reg.password).map_err(
            |e| HandlerErr::db("db_insert_failed", e).with_details(json!({ "table": "users" })),
        )?;
        let token = auth::start_session(conn, user.id)
            .map_err(|e| HandlerErr::db("db_insert_failed", e))?;
        log::info!("registered user {} ({})", user.username, user.id);
        Ok((
            json!({
                "user": { "id": user.id, "username": user.username },
                "redirect": "/",
            }),
            token,
        ))
    })
    .await;
    match result {
        Ok((ctx, token)) => logged_in(ctx, token),
        Err(e) => e.response(),
    }
}

pub async fn login(state: web::Data<AppState>, form: web::Json<LoginForm>) -> HttpResponse {
    let form = form.into_inner();
    let result = with_db(&state, move |conn| {
        let mut errors = FieldErrors::default();
        form.validate(&mut errors);
        if !errors.is_empty() {
            return Err(HandlerErr::invalid_form(&errors));
        }
        let username = form.username.trim();
        let user = auth::authenticate(conn, username, &form.password)
            .map_err(|e| HandlerErr::db("db_query_failed", e))?;
        let Some(user) = user else {
            log::warn!("failed login for {}", username);
            return Err(HandlerErr::new(
                "invalid_credentials",
                "Please enter a correct username and password.",
            ));
        };
        let token = auth::start_session(conn, user.id)
            .map_err(|e| HandlerErr::db("db_insert_failed", e))?;
        log::info!("user {} logged in", user.username);
        Ok((
            json!({
                "user": { "id": user.id, "username": user.username },
                "redirect": "/",
            }),
            token,
        ))
    })
    .await;
    match result {
        Ok((ctx, token)) => logged_in(ctx, token),
        Err(e) => e.response(),
    }
}

pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let token = session_token(&req);
    let result = with_db(&state, move |conn| {
        if let Some(token) = token {
            auth::end_session(conn, &token).map_err(|e| HandlerErr::db("db_delete_failed", e))?;
        }
        Ok(json!({ "redirect": "/login/" }))
    })
    .await;
    match result {
        Ok(ctx) => {
            let mut cookie = session_cookie(String::new());
            cookie.make_removal();
            HttpResponse::Ok().cookie(cookie).json(ok(ctx))
        }
        Err(e) => e.response(),
    }
}
