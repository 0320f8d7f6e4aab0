use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::App;
use crate::admin::AdminConsole;
use crate::auth::AuthGate;
use crate::data::DataService;

pub mod routes;

/// Uploaded photos and import documents stay well under this
const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Server state
pub struct AppState {
    pub data: Arc<DataService>,
    pub gate: Arc<AuthGate>,
    /// Admin commands run one at a time against a single view
    pub console: Mutex<AdminConsole>,
    pub site_dir: PathBuf,
}

impl AppState {
    pub fn new(app: &App) -> Self {
        Self {
            data: app.data.clone(),
            gate: app.gate.clone(),
            console: Mutex::new(AdminConsole::new(app.data.clone())),
            site_dir: app.config.site_path(),
        }
    }

    /// Take the console for one command, with no feedback left from the last
    pub async fn console(&self) -> MutexGuard<'_, AdminConsole> {
        let mut console = self.console.lock().await;
        console.notifier_mut().clear_all();
        console
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/view", get(routes::admin_view))
        .route("/projects", post(routes::submit_project))
        .route("/projects/editor", get(routes::open_project_editor).delete(routes::close_project_editor))
        .route("/projects/{id}", delete(routes::delete_project))
        .route("/services", post(routes::submit_service))
        .route("/services/editor", get(routes::open_service_editor).delete(routes::close_service_editor))
        .route("/services/{id}", delete(routes::delete_service))
        .route("/about/journey", put(routes::save_journey))
        .route("/about/stats", post(routes::add_stat))
        .route("/about/stats/{index}", patch(routes::update_stat).delete(routes::remove_stat))
        .route("/about/education", post(routes::add_education))
        .route("/about/education/{index}", patch(routes::update_education).delete(routes::remove_education))
        .route("/about/skills", post(routes::add_skill_category))
        .route(
            "/about/skills/{index}",
            patch(routes::update_skill_category).delete(routes::remove_skill_category),
        )
        .route("/about/skills/{index}/items", post(routes::add_skill))
        .route(
            "/about/skills/{index}/items/{item}",
            patch(routes::update_skill).delete(routes::remove_skill),
        )
        .route("/photo", post(routes::upload_photo).delete(routes::remove_photo))
        .route("/photo/url", put(routes::save_photo_url))
        .route("/credentials", put(routes::save_credentials))
        .route("/export", get(routes::export))
        .route("/import", post(routes::import))
        .route("/seed", post(routes::seed))
        .route_layer(middleware::from_fn_with_state(state.clone(), routes::require_admin));

    // Acting on the signed-in session takes that session's token
    let account = Router::new()
        .route("/logout", post(routes::logout))
        .route("/password", post(routes::update_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), routes::require_admin));

    let auth = Router::new()
        .route("/login", post(routes::login))
        .route("/reset", post(routes::reset_password))
        .route("/session", get(routes::session))
        .merge(account);

    let site = ServeDir::new(&state.site_dir);

    Router::new()
        .route("/", get(routes::page))
        .route("/index.html", get(routes::page))
        .route("/projects.html", get(routes::page))
        .route("/services.html", get(routes::page))
        .route("/about.html", get(routes::page))
        .nest("/api/auth", auth)
        .nest("/api/admin", admin)
        .fallback_service(site)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(app: App) -> anyhow::Result<()> {
    let port = app.config.port;
    let state = Arc::new(AppState::new(&app));
    let router = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {} ({} mode)", addr, app.mode().label());
    println!("🌍 Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
