use crate::db;
use crate::forms::{CleanStudent, FieldErrors, StudentForm, INVALID_CHOICE};
use crate::http::error::{respond, HandlerErr};
use crate::http::handlers::catalog::list_groups;
use crate::http::helpers::{current_user, optional_id, page_context, require_user, session_token};
use crate::http::types::{with_db, AppState};
use actix_multipart::form::bytes::Bytes as MultipartBytes;
use actix_multipart::form::text::Text;
use actix_multipart::form::MultipartForm;
use actix_multipart::MultipartError;
use actix_web::http::{header, StatusCode};
use actix_web::{web, FromRequest, HttpRequest, HttpResponse, ResponseError};
use chrono::{NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const PAGE_SIZE: i64 = 5;
pub const PHOTO_MAX_BYTES: usize = 5 * 1024 * 1024;
pub const FORM_FIELDS_MAX_BYTES: usize = 64 * 1024;
const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
const EMPTY_GROUP_LABEL: &str = "Not selected";

const STUDENT_SELECT: &str = "SELECT
       s.id, s.last_name, s.first_name, s.middle_name, s.email, s.birth_date,
       s.is_study, s.photo, s.group_id, g.name, s.slug
     FROM students s
     LEFT JOIN student_groups g ON g.id = s.group_id";

#[derive(Debug, Clone)]
struct StudentRow {
    id: i64,
    last_name: String,
    first_name: String,
    middle_name: String,
    email: String,
    birth_date: NaiveDate,
    is_study: bool,
    photo: Option<String>,
    group_id: Option<i64>,
    group_name: Option<String>,
    slug: String,
}

impl StudentRow {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(StudentRow {
            id: r.get(0)?,
            last_name: r.get(1)?,
            first_name: r.get(2)?,
            middle_name: r.get(3)?,
            email: r.get(4)?,
            birth_date: r.get(5)?,
            is_study: r.get::<_, i64>(6)? != 0,
            photo: r.get(7)?,
            group_id: r.get(8)?,
            group_name: r.get(9)?,
            slug: r.get(10)?,
        })
    }

    fn to_json(&self) -> serde_json::Value {
        let group = match (self.group_id, &self.group_name) {
            (Some(id), Some(name)) => json!({ "id": id, "name": name }),
            _ => serde_json::Value::Null,
        };
        json!({
            "id": self.id,
            "lastName": self.last_name,
            "firstName": self.first_name,
            "middleName": self.middle_name,
            "email": self.email,
            "birthDate": self.birth_date.format("%Y-%m-%d").to_string(),
            "isStudy": self.is_study,
            "photoUrl": self.photo.as_ref().map(|p| format!("/media/{}", p)),
            "group": group,
            "slug": self.slug,
            "url": format!("/student/{}/", self.slug),
        })
    }
}

fn query_students(
    conn: &Connection,
    tail: &str,
    args: Vec<Value>,
) -> Result<Vec<StudentRow>, HandlerErr> {
    let sql = format!("{} {}", STUDENT_SELECT, tail);
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    stmt.query_map(params_from_iter(args), StudentRow::from_row)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| HandlerErr::db("db_query_failed", e))
}

fn find_student_by_id(conn: &Connection, id: i64) -> Result<StudentRow, HandlerErr> {
    conn.query_row(
        &format!("{} WHERE s.id = ?", STUDENT_SELECT),
        [id],
        StudentRow::from_row,
    )
    .optional()
    .map_err(|e| HandlerErr::db("db_query_failed", e))?
    .ok_or_else(|| HandlerErr::not_found("student").with_details(json!({ "id": id })))
}

/// Students of one group in store order.
pub fn group_students(conn: &Connection, group_id: i64) -> Result<Vec<serde_json::Value>, HandlerErr> {
    let rows = query_students(
        conn,
        "WHERE s.group_id = ? ORDER BY s.id",
        vec![Value::Integer(group_id)],
    )?;
    Ok(rows.iter().map(StudentRow::to_json).collect())
}

pub fn ungrouped_students(conn: &Connection) -> Result<Vec<serde_json::Value>, HandlerErr> {
    let rows = query_students(conn, "WHERE s.group_id IS NULL ORDER BY s.id", Vec::new())?;
    Ok(rows.iter().map(StudentRow::to_json).collect())
}

fn slug_owner(conn: &Connection, slug: &str) -> Result<Option<i64>, HandlerErr> {
    conn.query_row("SELECT id FROM students WHERE slug = ?", [slug], |r| r.get(0))
        .optional()
        .map_err(|e| HandlerErr::db("db_query_failed", e))
}

fn groups_choices(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({
        "emptyLabel": EMPTY_GROUP_LABEL,
        "groups": list_groups(conn)?,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct StudentFilterQuery {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub group: Option<String>,
    pub page: Option<String>,
}

fn non_blank(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn resolve_page(raw: Option<&str>, num_pages: i64) -> Result<i64, HandlerErr> {
    let page = match raw.map(str::trim) {
        None | Some("") => 1,
        Some("last") => num_pages,
        Some(v) => v
            .parse::<i64>()
            .map_err(|_| HandlerErr::not_found("page").with_details(json!({ "page": v })))?,
    };
    if page < 1 || page > num_pages {
        return Err(HandlerErr::not_found("page").with_details(json!({ "page": page })));
    }
    Ok(page)
}

fn filtered_page(
    conn: &Connection,
    q: &StudentFilterQuery,
) -> Result<serde_json::Value, HandlerErr> {
    let last_name = non_blank(&q.last_name);
    let first_name = non_blank(&q.first_name);
    let mut errors = FieldErrors::default();
    let group = match optional_id("group", q.group.as_deref()) {
        Ok(Some(g)) => {
            if !db::group_exists(conn, g).map_err(|e| HandlerErr::db("db_query_failed", e))? {
                errors.add("group", INVALID_CHOICE);
            }
            Some(g)
        }
        Ok(None) => None,
        Err(_) => {
            errors.add("group", INVALID_CHOICE);
            None
        }
    };

    let mut clauses: Vec<&str> = Vec::new();
    let mut args: Vec<Value> = Vec::new();
    if let Some(v) = &last_name {
        clauses.push("instr(s.last_name, ?) > 0");
        args.push(Value::Text(v.clone()));
    }
    if let Some(v) = &first_name {
        clauses.push("instr(s.first_name, ?) > 0");
        args.push(Value::Text(v.clone()));
    }
    if let Some(g) = group {
        clauses.push("s.group_id = ?");
        args.push(Value::Integer(g));
    }
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let count: i64 = if errors.is_empty() {
        conn.query_row(
            &format!("SELECT COUNT(*) FROM students s {}", where_sql),
            params_from_iter(args.iter()),
            |r| r.get(0),
        )
        .map_err(|e| HandlerErr::db("db_query_failed", e))?
    } else {
        0
    };
    let num_pages = ((count + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
    let page = resolve_page(q.page.as_deref(), num_pages)?;

    let students = if count > 0 {
        let mut page_args = args;
        page_args.push(Value::Integer(PAGE_SIZE));
        page_args.push(Value::Integer((page - 1) * PAGE_SIZE));
        query_students(
            conn,
            &format!("{} ORDER BY s.id LIMIT ? OFFSET ?", where_sql),
            page_args,
        )?
    } else {
        Vec::new()
    };

    Ok(json!({
        "students": students.iter().map(StudentRow::to_json).collect::<Vec<_>>(),
        "filter": {
            "lastName": last_name,
            "firstName": first_name,
            "group": q.group.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            "errors": errors.to_json()["fields"].clone(),
            "groups": list_groups(conn)?,
        },
        "page": {
            "number": page,
            "numPages": num_pages,
            "hasPrevious": page > 1,
            "hasNext": page < num_pages,
            "count": count,
        },
    }))
}

fn merge(mut base: serde_json::Value, extra: serde_json::Value) -> serde_json::Value {
    if let (Some(b), serde_json::Value::Object(e)) = (base.as_object_mut(), extra) {
        b.extend(e);
    }
    base
}

pub async fn home(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<StudentFilterQuery>,
) -> HttpResponse {
    let token = session_token(&req);
    let query = query.into_inner();
    let result = with_db(&state, move |conn| {
        let auth = current_user(conn, token.as_deref())?.is_some();
        let body = filtered_page(conn, &query)?;
        Ok(merge(page_context("Home", auth), body))
    })
    .await;
    respond(result)
}

pub async fn list_all(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let token = session_token(&req);
    let result = with_db(&state, move |conn| {
        let auth = current_user(conn, token.as_deref())?.is_some();
        let students = query_students(conn, "ORDER BY s.id", Vec::new())?;
        let mut ctx = page_context("Students", auth);
        ctx["students"] = students.iter().map(StudentRow::to_json).collect();
        Ok(ctx)
    })
    .await;
    respond(result)
}

pub async fn detail(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let token = session_token(&req);
    let slug = path.into_inner();
    let result = with_db(&state, move |conn| {
        let auth = current_user(conn, token.as_deref())?.is_some();
        let mut rows = query_students(conn, "WHERE s.slug = ?", vec![Value::Text(slug.clone())])?;
        let student = rows
            .pop()
            .ok_or_else(|| HandlerErr::not_found("student").with_details(json!({ "slug": slug })))?;
        let title = format!("{} {}", student.last_name, student.first_name);
        let mut ctx = page_context(&title, auth);
        ctx["st"] = student.to_json();
        Ok(ctx)
    })
    .await;
    respond(result)
}

/// A photo part as it arrived, before its content is checked.
struct PhotoUpload {
    data: web::Bytes,
    content_type: Option<String>,
}

/// Add and update accept either a JSON body or a multipart form; only the
/// multipart form can carry a photo.
struct StudentSubmission {
    form: StudentForm,
    errors: FieldErrors,
    photo: Option<PhotoUpload>,
}

#[derive(MultipartForm)]
pub struct StudentUpload {
    last_name: Option<Text<String>>,
    first_name: Option<Text<String>>,
    middle_name: Option<Text<String>>,
    email: Option<Text<String>>,
    birth_date: Option<Text<String>>,
    is_study: Option<Text<String>>,
    group: Option<Text<String>>,
    slug: Option<Text<String>>,
    #[multipart(limit = "5MiB")]
    photo: Option<MultipartBytes>,
}

fn text(v: Option<Text<String>>) -> String {
    v.map(|t| t.into_inner()).unwrap_or_default()
}

/// Checkbox semantics: an unchecked box is simply not sent.
fn checkbox(v: Option<Text<String>>) -> bool {
    matches!(
        text(v).trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    )
}

impl StudentUpload {
    fn into_submission(self) -> StudentSubmission {
        let mut errors = FieldErrors::default();
        let group = match optional_id("group", self.group.as_ref().map(|t| t.as_str())) {
            Ok(g) => g,
            Err(_) => {
                errors.add("group", INVALID_CHOICE);
                None
            }
        };
        // Browsers send an empty part when no file was chosen.
        let photo = self
            .photo
            .filter(|p| !p.data.is_empty() || p.file_name.as_deref().is_some_and(|n| !n.is_empty()))
            .map(|p| PhotoUpload {
                content_type: p.content_type.as_ref().map(|m| m.to_string()),
                data: p.data,
            });
        StudentSubmission {
            form: StudentForm {
                last_name: text(self.last_name),
                first_name: text(self.first_name),
                middle_name: text(self.middle_name),
                email: text(self.email),
                birth_date: text(self.birth_date),
                is_study: checkbox(self.is_study),
                group,
                slug: text(self.slug),
            },
            errors,
            photo,
        }
    }
}

fn is_multipart(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

/// Extractor failures come back already rendered by the router's configs.
async fn read_submission(
    req: &HttpRequest,
    payload: web::Payload,
) -> Result<StudentSubmission, actix_web::Error> {
    let mut payload = payload.into_inner();
    if is_multipart(req) {
        let upload = MultipartForm::<StudentUpload>::from_request(req, &mut payload).await?;
        Ok(upload.into_inner().into_submission())
    } else {
        let form = web::Json::<StudentForm>::from_request(req, &mut payload).await?;
        Ok(StudentSubmission {
            form: form.into_inner(),
            errors: FieldErrors::default(),
            photo: None,
        })
    }
}

fn upload_error(status: StatusCode, message: String) -> HandlerErr {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        HandlerErr::new("payload_too_large", message)
    } else {
        HandlerErr::bad_params(message)
    }
}

pub fn multipart_error(e: &MultipartError) -> HandlerErr {
    upload_error(ResponseError::status_code(e), e.to_string())
}

/// Runs the store-side checks that the form itself cannot do.
fn validate_student(
    conn: &Connection,
    form: &StudentForm,
    editing: Option<i64>,
    mut errors: FieldErrors,
) -> Result<CleanStudent, HandlerErr> {
    let clean = form.clean(&mut errors);

    if let Some(g) = form.group {
        if !db::group_exists(conn, g).map_err(|e| HandlerErr::db("db_query_failed", e))? {
            errors.add("group", INVALID_CHOICE);
        }
    }
    let slug = form.slug.trim();
    if !slug.is_empty() && !errors.has("slug") {
        if let Some(owner) = slug_owner(conn, slug)? {
            if Some(owner) != editing {
                errors.add("slug", "Student with this URL already exists.");
            }
        }
    }

    match (clean, errors.is_empty()) {
        (Some(student), true) => Ok(student),
        _ => Err(HandlerErr::invalid_form(&errors)),
    }
}

pub async fn add_form(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let token = session_token(&req);
    let result = with_db(&state, move |conn| {
        require_user(conn, token.as_deref())?;
        let mut ctx = page_context("Add student", true);
        ctx["form"] = json!({ "isStudy": true });
        ctx["choices"] = groups_choices(conn)?;
        Ok(ctx)
    })
    .await;
    respond(result)
}

pub async fn add(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> HttpResponse {
    let token = session_token(&req);
    let sub = match read_submission(&req, payload).await {
        Ok(sub) => sub,
        Err(e) => return e.error_response(),
    };
    let media_root = state.media_root();
    let result = with_db(&state, move |conn| {
        let user = require_user(conn, token.as_deref())?;
        let StudentSubmission { form, mut errors, photo } = sub;
        let photo = check_photo(photo, &mut errors);
        let s = validate_student(conn, &form, None, errors)?;
        let stored = photo
            .map(|(ext, data)| store_photo(&media_root, ext, &data))
            .transpose()?;
        let inserted = conn.execute(
            "INSERT INTO students(last_name, first_name, middle_name, email, birth_date, is_study, group_id, slug, photo, updated_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &s.last_name,
                &s.first_name,
                &s.middle_name,
                &s.email,
                s.birth_date,
                if s.is_study { 1 } else { 0 },
                s.group,
                &s.slug,
                &stored,
                Utc::now().to_rfc3339(),
            ),
        );
        if let Err(e) = inserted {
            if let Some(rel) = &stored {
                remove_media_file(&media_root, rel);
            }
            return Err(HandlerErr::db("db_insert_failed", e).with_details(json!({ "table": "students" })));
        }
        let id = conn.last_insert_rowid();
        log::info!("student {} ({}) added by {}", id, s.slug, user.username);
        let student = find_student_by_id(conn, id)?;
        Ok(json!({ "student": student.to_json(), "redirect": "/" }))
    })
    .await;
    respond(result)
}

pub async fn update_form(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> HttpResponse {
    let token = session_token(&req);
    let id = path.into_inner();
    let result = with_db(&state, move |conn| {
        require_user(conn, token.as_deref())?;
        let student = find_student_by_id(conn, id)?;
        let mut ctx = page_context("Edit student", true);
        ctx["st"] = student.to_json();
        ctx["choices"] = groups_choices(conn)?;
        Ok(ctx)
    })
    .await;
    respond(result)
}

pub async fn update(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    payload: web::Payload,
) -> HttpResponse {
    let token = session_token(&req);
    let id = path.into_inner();
    let sub = match read_submission(&req, payload).await {
        Ok(sub) => sub,
        Err(e) => return e.error_response(),
    };
    let media_root = state.media_root();
    let result = with_db(&state, move |conn| {
        let user = require_user(conn, token.as_deref())?;
        let existing = find_student_by_id(conn, id)?;
        let StudentSubmission { form, mut errors, photo } = sub;
        let photo = check_photo(photo, &mut errors);
        let s = validate_student(conn, &form, Some(id), errors)?;
        let stored = photo
            .map(|(ext, data)| store_photo(&media_root, ext, &data))
            .transpose()?;
        let updated = conn.execute(
            "UPDATE students SET
               last_name = ?, first_name = ?, middle_name = ?, email = ?, birth_date = ?,
               is_study = ?, group_id = ?, slug = ?, photo = COALESCE(?, photo), updated_at = ?
             WHERE id = ?",
            (
                &s.last_name,
                &s.first_name,
                &s.middle_name,
                &s.email,
                s.birth_date,
                if s.is_study { 1 } else { 0 },
                s.group,
                &s.slug,
                &stored,
                Utc::now().to_rfc3339(),
                id,
            ),
        );
        if let Err(e) = updated {
            if let Some(rel) = &stored {
                remove_media_file(&media_root, rel);
            }
            return Err(HandlerErr::db("db_update_failed", e));
        }
        if let (Some(_), Some(old)) = (&stored, &existing.photo) {
            remove_media_file(&media_root, old);
        }
        log::info!("student {} ({}) updated by {}", id, s.slug, user.username);
        let student = find_student_by_id(conn, id)?;
        let redirect = format!("/student/{}/", student.slug);
        Ok(json!({ "student": student.to_json(), "redirect": redirect }))
    })
    .await;
    respond(result)
}

pub async fn delete_confirm(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> HttpResponse {
    let token = session_token(&req);
    let id = path.into_inner();
    let result = with_db(&state, move |conn| {
        require_user(conn, token.as_deref())?;
        let student = find_student_by_id(conn, id)?;
        let mut ctx = page_context("Delete student", true);
        ctx["st"] = student.to_json();
        Ok(ctx)
    })
    .await;
    respond(result)
}

fn remove_media_file(media_root: &Path, rel: &str) {
    let p = media_root.join(rel);
    if let Err(e) = std::fs::remove_file(&p) {
        log::warn!("could not remove {}: {}", p.to_string_lossy(), e);
    }
}

pub async fn delete(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> HttpResponse {
    let token = session_token(&req);
    let id = path.into_inner();
    let media_root = state.media_root();
    let result = with_db(&state, move |conn| {
        let user = require_user(conn, token.as_deref())?;
        let student = find_student_by_id(conn, id)?;
        conn.execute("DELETE FROM students WHERE id = ?", [id])
            .map_err(|e| HandlerErr::db("db_delete_failed", e))?;
        if let Some(photo) = &student.photo {
            remove_media_file(&media_root, photo);
        }
        log::info!("student {} ({}) deleted by {}", id, student.slug, user.username);
        Ok(json!({ "deleted": id, "redirect": "/" }))
    })
    .await;
    respond(result)
}

fn photo_extension(content_type: Option<&str>) -> Option<&'static str> {
    let mime = content_type?.split(';').next()?.trim().to_ascii_lowercase();
    match mime.as_str() {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Picks the stored extension from the file's leading bytes. A declared image
/// type that disagrees with the content is rejected.
fn sniff_photo(declared: Option<&str>, data: &[u8]) -> Option<&'static str> {
    let kind = infer::get(data)?;
    let ext = photo_extension(Some(kind.mime_type()))?;
    match photo_extension(declared) {
        Some(claimed) if claimed != ext => None,
        _ => Some(ext),
    }
}

fn check_photo(
    photo: Option<PhotoUpload>,
    errors: &mut FieldErrors,
) -> Option<(&'static str, web::Bytes)> {
    let photo = photo?;
    match sniff_photo(photo.content_type.as_deref(), &photo.data) {
        Some(ext) => Some((ext, photo.data)),
        None => {
            log::warn!(
                "rejected photo upload ({} bytes, declared {:?})",
                photo.data.len(),
                photo.content_type
            );
            errors.add("photo", INVALID_IMAGE);
            None
        }
    }
}

/// Writes the photo under a fresh name and returns its media-relative path.
fn store_photo(media_root: &Path, ext: &str, data: &[u8]) -> Result<String, HandlerErr> {
    let rel = format!("photos/{}.{}", Uuid::new_v4().simple(), ext);
    let dest: PathBuf = media_root.join(&rel);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(HandlerErr::io)?;
    }
    std::fs::write(&dest, data).map_err(HandlerErr::io)?;
    Ok(rel)
}

pub async fn upload_photo(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: Result<web::Bytes, actix_web::Error>,
) -> HttpResponse {
    let token = session_token(&req);
    let id = path.into_inner();
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            return upload_error(e.as_response_error().status_code(), e.to_string()).response()
        }
    };
    let upload = PhotoUpload {
        data: body,
        content_type: req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    let media_root = state.media_root();
    let result = with_db(&state, move |conn| {
        let user = require_user(conn, token.as_deref())?;
        let student = find_student_by_id(conn, id)?;
        let mut errors = FieldErrors::default();
        let Some((ext, data)) = check_photo(Some(upload), &mut errors) else {
            return Err(HandlerErr::invalid_form(&errors));
        };

        let rel = store_photo(&media_root, ext, &data)?;
        if let Err(e) = conn.execute(
            "UPDATE students SET photo = ?, updated_at = ? WHERE id = ?",
            (&rel, Utc::now().to_rfc3339(), id),
        ) {
            remove_media_file(&media_root, &rel);
            return Err(HandlerErr::db("db_update_failed", e));
        }
        if let Some(old) = &student.photo {
            remove_media_file(&media_root, old);
        }
        log::info!("photo for student {} stored as {} by {}", id, rel, user.username);
        Ok(json!({
            "photoUrl": format!("/media/{}", rel),
            "bytes": data.len(),
        }))
    })
    .await;
    respond(result)
}
