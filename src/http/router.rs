use super::handlers::{auth, catalog, core, gradebook, media, students};
use crate::http::error::HandlerErr;
use actix_multipart::form::MultipartFormConfig;
use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::{web, HttpResponse};

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|e, _req| {
        let err = match &e {
            JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                HandlerErr::new("payload_too_large", e.to_string())
            }
            _ => HandlerErr::bad_params(e.to_string()),
        };
        InternalError::from_response(e, err.response()).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|e, _req| {
        let resp = HandlerErr::bad_params(e.to_string()).response();
        InternalError::from_response(e, resp).into()
    })
}

/// An id segment that does not parse matches no resource.
fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|e, _req| {
        let resp = HandlerErr::not_found("resource")
            .with_details(serde_json::json!({ "reason": e.to_string() }))
            .response();
        InternalError::from_response(e, resp).into()
    })
}

fn multipart_config() -> MultipartFormConfig {
    MultipartFormConfig::default()
        .total_limit(students::PHOTO_MAX_BYTES + students::FORM_FIELDS_MAX_BYTES)
        .memory_limit(students::PHOTO_MAX_BYTES + students::FORM_FIELDS_MAX_BYTES)
        .error_handler(|e, _req| {
            let resp = students::multipart_error(&e).response();
            InternalError::from_response(e, resp).into()
        })
}

async fn unknown_route() -> HttpResponse {
    HandlerErr::not_found("page").response()
}

/// Registers every route. Shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .app_data(multipart_config())
        .app_data(web::PayloadConfig::new(students::PHOTO_MAX_BYTES))
        .route("/health", web::get().to(core::health))
        .route("/", web::get().to(students::home))
        .route("/about/", web::get().to(core::about))
        .route("/teachers/", web::get().to(core::teachers))
        .route("/students/", web::get().to(students::list_all))
        .route("/student/{slug}/", web::get().to(students::detail))
        .service(
            web::resource("/addstudent/")
                .route(web::get().to(students::add_form))
                .route(web::post().to(students::add)),
        )
        .service(
            web::resource("/student/{id}/update/")
                .route(web::get().to(students::update_form))
                .route(web::post().to(students::update)),
        )
        .service(
            web::resource("/student/{id}/delete/")
                .route(web::get().to(students::delete_confirm))
                .route(web::post().to(students::delete)),
        )
        .route("/student/{id}/photo/", web::post().to(students::upload_photo))
        .service(
            web::resource("/register/")
                .route(web::get().to(auth::register_form))
                .route(web::post().to(auth::register)),
        )
        .service(
            web::resource("/login/")
                .route(web::get().to(auth::login_form))
                .route(web::post().to(auth::login)),
        )
        .service(
            web::resource("/logout/")
                .route(web::get().to(auth::logout))
                .route(web::post().to(auth::logout)),
        )
        .service(
            web::resource("/groups/")
                .route(web::get().to(catalog::groups))
                .route(web::post().to(catalog::create_group)),
        )
        .service(
            web::resource("/subjects/")
                .route(web::get().to(catalog::subjects))
                .route(web::post().to(catalog::create_subject)),
        )
        .route("/gradebook/", web::get().to(gradebook::view))
        .route("/gradebook/entries/", web::post().to(catalog::add_entry))
        .route(
            "/gradebook/entries/{id}/delete/",
            web::post().to(catalog::delete_entry),
        )
        .route("/media/{path:.*}", web::get().to(media::serve))
        .default_service(web::to(unknown_route));
}
