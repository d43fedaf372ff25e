use crate::db;
use crate::http::error::HandlerErr;
use actix_web::web;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Mutex;

pub struct AppState {
    pub workspace: PathBuf,
    db: Mutex<Connection>,
}

impl AppState {
    pub fn new(workspace: PathBuf, conn: Connection) -> Self {
        AppState {
            workspace,
            db: Mutex::new(conn),
        }
    }

    pub fn media_root(&self) -> PathBuf {
        db::media_root(&self.workspace)
    }
}

/// Runs `f` against the workspace connection on the blocking pool.
pub async fn with_db<F, T>(state: &web::Data<AppState>, f: F) -> Result<T, HandlerErr>
where
    F: FnOnce(&Connection) -> Result<T, HandlerErr> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let joined = web::block(move || {
        let conn = state
            .db
            .lock()
            .map_err(|_| HandlerErr::new("internal", "database lock poisoned"))?;
        f(&conn)
    })
    .await;
    match joined {
        Ok(result) => result,
        Err(e) => Err(HandlerErr::new("internal", e.to_string())),
    }
}
