use axum::{extract::State, response::Html};
use parley_core::config::RunMode;
use std::borrow::Cow;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::app::AppState;

static INDEX_HTML: &str = include_str!("../../static/index.html");

static FALLBACK_WARNED: AtomicBool = AtomicBool::new(false);

/// Serve the chat page at `GET /`.
///
/// Production serves the copy embedded at build time. Development re-reads
/// `static_dir/index.html` on every request so edits show up on reload, and
/// falls back to the embedded copy when the file is missing.
pub async fn ui_handler(State(state): State<Arc<AppState>>) -> Html<Cow<'static, str>> {
    let gateway = &state.config.gateway;
    match gateway.mode {
        RunMode::Production => Html(Cow::Borrowed(INDEX_HTML)),
        RunMode::Development => match read_page(Path::new(&gateway.static_dir)).await {
            Ok(page) => Html(Cow::Owned(page)),
            Err(e) => {
                if first_fallback() {
                    warn!(
                        code = e.code(),
                        error = %e,
                        static_dir = %gateway.static_dir,
                        "chat page not found on disk, serving embedded copy"
                    );
                } else {
                    debug!(code = e.code(), error = %e, "serving embedded chat page");
                }
                Html(Cow::Borrowed(INDEX_HTML))
            }
        },
    }
}

/// True only for the first fallback in this process.
fn first_fallback() -> bool {
    !FALLBACK_WARNED.swap(true, Ordering::Relaxed)
}

async fn read_page(dir: &Path) -> parley_core::Result<String> {
    Ok(tokio::fs::read_to_string(dir.join("index.html")).await?)
}
