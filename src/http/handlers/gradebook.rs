use crate::gradebook::{load_grid, ReportGrid};
use crate::http::error::{respond, HandlerErr};
use crate::http::handlers::catalog::{list_groups, list_subjects};
use crate::http::handlers::students::{group_students, ungrouped_students};
use crate::http::helpers::{current_user, optional_id, page_context, session_token};
use crate::http::types::{with_db, AppState};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
pub struct GradebookQuery {
    pub group: Option<String>,
    pub subject: Option<String>,
}

fn grid_json(grid: &ReportGrid) -> (serde_json::Value, serde_json::Value) {
    let dates: Vec<String> = grid
        .dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();
    let studs: Vec<serde_json::Value> = grid
        .rows
        .iter()
        .map(|row| json!({ "label": row.label, "marks": row.marks }))
        .collect();
    (json!(dates), json!(studs))
}

pub async fn view(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<GradebookQuery>,
) -> HttpResponse {
    let token = session_token(&req);
    let query = query.into_inner();
    let result = with_db(&state, move |conn| {
        let group = optional_id("group", query.group.as_deref())?;
        let subject = optional_id("subject", query.subject.as_deref())?;
        let auth = current_user(conn, token.as_deref())?.is_some();

        let grid = load_grid(conn, group, subject)
            .map_err(|e| HandlerErr::db("db_query_failed", e))?;
        let (dates, studs) = grid_json(&grid);
        // No group parameter lists the students without a group; a blank one
        // lists nobody.
        let students = match (query.group.as_deref(), group) {
            (_, Some(g)) => group_students(conn, g)?,
            (None, None) => ungrouped_students(conn)?,
            (Some(_), None) => Vec::new(),
        };

        let mut ctx = page_context("Gradebook", auth);
        ctx["group"] = json!(query.group);
        ctx["subject"] = json!(query.subject);
        ctx["groups"] = json!(list_groups(conn)?);
        ctx["subjects"] = json!(list_subjects(conn, group)?);
        ctx["students"] = json!(students);
        ctx["dates"] = dates;
        ctx["studs"] = studs;
        Ok(ctx)
    })
    .await;
    respond(result)
}
