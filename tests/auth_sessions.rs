use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use recordbook::{db, http};
use serde_json::json;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn app_state(prefix: &str) -> web::Data<http::AppState> {
    let workspace = temp_dir(prefix);
    let conn = db::open_db(&workspace).expect("open db");
    web::Data::new(http::AppState::new(workspace, conn))
}

async fn send<S, R, B, E>(app: &S, req: R) -> (StatusCode, serde_json::Value, Option<String>)
where
    S: Service<R, Response = ServiceResponse<B>, Error = E>,
    B: MessageBody,
    E: std::fmt::Debug,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let session = resp
        .response()
        .cookies()
        .find(|c| c.name() == "sessionid")
        .map(|c| c.value().to_string());
    let body = test::read_body(resp).await;
    let value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, value, session)
}

fn registration(username: &str, password1: &str, password2: &str) -> serde_json::Value {
    json!({
        "username": username,
        "email": format!("{}@school.org", username),
        "password1": password1,
        "password2": password2,
    })
}

#[actix_web::test]
async fn register_logs_in_and_logout_ends_session() {
    let state = app_state("recordbook-auth-register");
    let app = test::init_service(App::new().app_data(state.clone()).configure(http::configure)).await;

    let (status, body, token) = send(
        &app,
        test::TestRequest::post()
            .uri("/register/")
            .set_json(registration("teacher", "chalk-and-board", "chalk-and-board"))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["result"]["user"]["username"], "teacher");
    assert_eq!(body["result"]["redirect"], "/");
    let token = token.expect("session cookie");

    let (_, body, _) = send(
        &app,
        test::TestRequest::get()
            .uri("/about/")
            .cookie(Cookie::new("sessionid", token.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(body["result"]["auth"], true);
    assert!(body["result"]["menu"]
        .as_array()
        .expect("menu")
        .iter()
        .any(|m| m["url"] == "/addstudent/"));

    let (status, body, cleared) = send(
        &app,
        test::TestRequest::post()
            .uri("/logout/")
            .cookie(Cookie::new("sessionid", token.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["redirect"], "/login/");
    assert_eq!(cleared.as_deref(), Some(""));

    let (_, body, _) = send(
        &app,
        test::TestRequest::get()
            .uri("/about/")
            .cookie(Cookie::new("sessionid", token.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(body["result"]["auth"], false);

    let (status, _, _) = send(
        &app,
        test::TestRequest::get()
            .uri("/addstudent/")
            .cookie(Cookie::new("sessionid", token))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn login_checks_credentials() {
    let state = app_state("recordbook-auth-login");
    let app = test::init_service(App::new().app_data(state.clone()).configure(http::configure)).await;

    let (status, _, _) = send(
        &app,
        test::TestRequest::post()
            .uri("/register/")
            .set_json(registration("curator", "quiet-library", "quiet-library"))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body, token) = send(
        &app,
        test::TestRequest::post()
            .uri("/login/")
            .set_json(json!({ "username": "curator", "password": "wrong-password" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_credentials");
    assert!(token.is_none());

    let (status, body, _) = send(
        &app,
        test::TestRequest::post()
            .uri("/login/")
            .set_json(json!({ "username": "", "password": "" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["fields"]["username"].is_array());
    assert!(body["error"]["details"]["fields"]["password"].is_array());

    let (status, body, token) = send(
        &app,
        test::TestRequest::post()
            .uri("/login/")
            .set_json(json!({ "username": "curator", "password": "quiet-library" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["user"]["username"], "curator");
    let token = token.expect("session cookie");

    let (status, _, _) = send(
        &app,
        test::TestRequest::get()
            .uri("/addstudent/")
            .cookie(Cookie::new("sessionid", token))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn registration_rejects_bad_input() {
    let state = app_state("recordbook-auth-invalid");
    let app = test::init_service(App::new().app_data(state.clone()).configure(http::configure)).await;

    let (status, body, token) = send(
        &app,
        test::TestRequest::post()
            .uri("/register/")
            .set_json(registration("teacher", "chalk-and-board", "chalk-and-bored"))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["fields"]["password2"].is_array());
    assert!(token.is_none());

    let (status, _, _) = send(
        &app,
        test::TestRequest::post()
            .uri("/register/")
            .set_json(registration("teacher", "chalk-and-board", "chalk-and-board"))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body, _) = send(
        &app,
        test::TestRequest::post()
            .uri("/register/")
            .set_json(registration("teacher", "another-board", "another-board"))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["details"]["fields"]["username"][0],
        "A user with that username already exists."
    );
}
