use crate::db;
use crate::forms::{clean_catalog_name, EntryForm, FieldErrors, INVALID_CHOICE};
use crate::http::error::{respond, HandlerErr};
use crate::http::helpers::{require_user, session_token};
use crate::http::types::{with_db, AppState};
use actix_web::{web, HttpRequest, HttpResponse};
use rusqlite::{params_from_iter, Connection};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct NameForm {
    #[serde(default)]
    pub name: String,
}

/// Groups ordered by name, with how many students each holds.
pub fn list_groups(conn: &Connection) -> Result<Vec<serde_json::Value>, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT
               g.id,
               g.name,
               (SELECT COUNT(*) FROM students s WHERE s.group_id = g.id) AS student_count
             FROM student_groups g
             ORDER BY g.name, g.id",
        )
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    stmt.query_map([], |r| {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let student_count: i64 = r.get(2)?;
        Ok(json!({
            "id": id,
            "name": name,
            "studentCount": student_count,
        }))
    })
    .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    .map_err(|e| HandlerErr::db("db_query_failed", e))
}

/// Subject choices. With a group, only subjects that already have marks for
/// the group's students are offered.
pub fn list_subjects(
    conn: &Connection,
    group_id: Option<i64>,
) -> Result<Vec<serde_json::Value>, HandlerErr> {
    let (sql, args) = match group_id {
        None => ("SELECT id, name FROM subjects ORDER BY name, id", vec![]),
        Some(g) => (
            "SELECT DISTINCT sub.id, sub.name
             FROM subjects sub
             JOIN gradebook gb ON gb.subject_id = sub.id
             JOIN students s ON s.id = gb.student_id
             WHERE s.group_id = ?
             ORDER BY sub.name, sub.id",
            vec![g],
        ),
    };
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    stmt.query_map(params_from_iter(args), |r| {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        Ok(json!({ "id": id, "name": name }))
    })
    .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    .map_err(|e| HandlerErr::db("db_query_failed", e))
}

pub async fn groups(state: web::Data<AppState>) -> HttpResponse {
    let result = with_db(&state, |conn| Ok(json!({ "groups": list_groups(conn)? }))).await;
    respond(result)
}

pub async fn subjects(state: web::Data<AppState>) -> HttpResponse {
    let result = with_db(&state, |conn| Ok(json!({ "subjects": list_subjects(conn, None)? }))).await;
    respond(result)
}

fn insert_named(
    conn: &Connection,
    token: Option<&str>,
    table: &'static str,
    form: &NameForm,
) -> Result<serde_json::Value, HandlerErr> {
    let user = require_user(conn, token)?;
    let mut errors = FieldErrors::default();
    let name = clean_catalog_name(&mut errors, &form.name);
    if !errors.is_empty() {
        return Err(HandlerErr::invalid_form(&errors));
    }
    conn.execute(&format!("INSERT INTO {}(name) VALUES(?)", table), [&name])
        .map_err(|e| {
            HandlerErr::db("db_insert_failed", e).with_details(json!({ "table": table }))
        })?;
    let id = conn.last_insert_rowid();
    log::info!("{} {} ({}) created by {}", table, id, name, user.username);
    Ok(json!({ "id": id, "name": name }))
}

pub async fn create_group(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Json<NameForm>,
) -> HttpResponse {
    let token = session_token(&req);
    let form = form.into_inner();
    let result = with_db(&state, move |conn| {
        insert_named(conn, token.as_deref(), "student_groups", &form)
    })
    .await;
    respond(result.map(|group| json!({ "group": group })))
}

pub async fn create_subject(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Json<NameForm>,
) -> HttpResponse {
    let token = session_token(&req);
    let form = form.into_inner();
    let result = with_db(&state, move |conn| {
        insert_named(conn, token.as_deref(), "subjects", &form)
    })
    .await;
    respond(result.map(|subject| json!({ "subject": subject })))
}

fn student_exists(conn: &Connection, student_id: i64) -> rusqlite::Result<bool> {
    conn.query_row("SELECT COUNT(*) FROM students WHERE id = ?", [student_id], |r| {
        r.get::<_, i64>(0)
    })
    .map(|n| n > 0)
}

pub async fn add_entry(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Json<EntryForm>,
) -> HttpResponse {
    let token = session_token(&req);
    let form = form.into_inner();
    let result = with_db(&state, move |conn| {
        let user = require_user(conn, token.as_deref())?;
        let mut errors = FieldErrors::default();
        let clean = form.clean(&mut errors);

        if let Some(student_id) = form.student {
            if !student_exists(conn, student_id).map_err(|e| HandlerErr::db("db_query_failed", e))? {
                errors.add("student", INVALID_CHOICE);
            }
        }
        if let Some(subject_id) = form.subject {
            if !db::subject_exists(conn, subject_id)
                .map_err(|e| HandlerErr::db("db_query_failed", e))?
            {
                errors.add("subject", INVALID_CHOICE);
            }
        }
        let (Some(entry), true) = (clean, errors.is_empty()) else {
            return Err(HandlerErr::invalid_form(&errors));
        };

        conn.execute(
            "INSERT INTO gradebook(student_id, subject_id, date, mark) VALUES(?, ?, ?, ?)",
            (entry.student, entry.subject, entry.date, &entry.mark),
        )
        .map_err(|e| {
            HandlerErr::db("db_insert_failed", e).with_details(json!({ "table": "gradebook" }))
        })?;
        let entry_id = conn.last_insert_rowid();
        log::info!(
            "gradebook entry {} (student {}, subject {}, {}) recorded by {}",
            entry_id,
            entry.student,
            entry.subject,
            entry.date,
            user.username
        );
        Ok(json!({
            "entry": {
                "id": entry_id,
                "student": entry.student,
                "subject": entry.subject,
                "date": entry.date.format("%Y-%m-%d").to_string(),
                "mark": entry.mark,
            }
        }))
    })
    .await;
    respond(result)
}

pub async fn delete_entry(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> HttpResponse {
    let token = session_token(&req);
    let entry_id = path.into_inner();
    let result = with_db(&state, move |conn| {
        let user = require_user(conn, token.as_deref())?;
        let n = conn
            .execute("DELETE FROM gradebook WHERE id = ?", [entry_id])
            .map_err(|e| HandlerErr::db("db_delete_failed", e))?;
        if n == 0 {
            return Err(HandlerErr::not_found("gradebook entry"));
        }
        log::info!("gradebook entry {} deleted by {}", entry_id, user.username);
        Ok(json!({ "deleted": entry_id }))
    })
    .await;
    respond(result)
}
