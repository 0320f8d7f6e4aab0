use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode, Uri, header},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::admin::{AdminConsole, AdminView, EducationField, Outcome, PreConfirmed, ProjectForm, ServiceForm, StatField};
use crate::auth::{GateDecision, User};
use crate::backup::{ImportDocument, backup_filename};
use crate::imaging::ImageFile;
use crate::model::RecordId;
use crate::notify::Toast;
use crate::render::{PageData, PageId, render_page};
use crate::server::AppState;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: error.into() }))
}

// ========== Public pages ==========

pub async fn page(State(state): State<Arc<AppState>>, uri: Uri) -> Result<Html<String>, ApiError> {
    let page = PageId::from_path(uri.path());
    let template_name = page
        .template()
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Page not found"))?;

    let template = tokio::fs::read_to_string(state.site_dir.join(template_name))
        .await
        .map_err(|e| {
            tracing::warn!("Template {} unavailable: {}", template_name, e);
            api_error(StatusCode::NOT_FOUND, "Page not found")
        })?;

    let data = PageData::load(page, &state.data).await;
    Ok(Html(render_page(page, &template, &data)))
}

// ========== Auth ==========

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub admin: bool,
    pub user: Option<User>,
}

fn auth_status(success: bool) -> StatusCode {
    if success { StatusCode::OK } else { StatusCode::UNAUTHORIZED }
}

pub async fn login(State(state): State<Arc<AppState>>, Json(body): Json<LoginRequest>) -> impl IntoResponse {
    let result = state.gate.sign_in(&body.email, &body.password).await;
    (auth_status(result.success), Json(result))
}

pub async fn logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let result = state.gate.sign_out().await;
    let status = if result.success { StatusCode::OK } else { StatusCode::BAD_GATEWAY };
    (status, Json(result))
}

pub async fn reset_password(State(state): State<Arc<AppState>>, Json(body): Json<ResetRequest>) -> impl IntoResponse {
    let result = state.gate.reset_password(&body.email).await;
    let status = if result.success { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    (status, Json(result))
}

pub async fn update_password(State(state): State<Arc<AppState>>, Json(body): Json<PasswordRequest>) -> impl IntoResponse {
    let result = state.gate.update_password(&body.password).await;
    (auth_status(result.success), Json(result))
}

/// Describes the caller's own session; the user is only shown to its bearer
pub async fn session(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<SessionResponse> {
    let user = match bearer_token(&headers) {
        Some(token) => state.gate.authorize(Some(token)).await.ok().map(|s| s.user),
        None => None,
    };
    Json(SessionResponse {
        authenticated: user.is_some(),
        admin: user.is_some(),
        user,
    })
}

#[derive(Serialize)]
pub struct Rejection {
    pub error: String,
    pub redirect: String,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Admit only requests carrying the live admin session's token
pub async fn require_admin(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let token = bearer_token(request.headers()).map(str::to_string);
    match state.gate.authorize(token.as_deref()).await {
        Ok(_) => next.run(request).await,
        Err(decision) => {
            let redirect = match decision {
                GateDecision::Redirect(target) => target,
                GateDecision::Allow => String::new(),
            };
            tracing::debug!("Rejected admin request to {}", request.uri());
            let body = Rejection {
                error: "Authentication required".to_string(),
                redirect,
            };
            (StatusCode::UNAUTHORIZED, Json(body)).into_response()
        }
    }
}

// ========== Admin ==========

#[derive(Serialize)]
pub struct AdminResponse {
    pub outcome: Outcome,
    pub toasts: Vec<Toast>,
    pub field_errors: BTreeMap<String, String>,
    pub view: AdminView,
}

type AdminReply = (StatusCode, Json<AdminResponse>);

fn reply(console: &mut AdminConsole, outcome: Outcome) -> AdminReply {
    let status = match &outcome {
        Outcome::Done => StatusCode::OK,
        Outcome::Cancelled => StatusCode::PRECONDITION_REQUIRED,
        Outcome::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Outcome::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = AdminResponse {
        outcome,
        toasts: console.notifier_mut().drain(),
        field_errors: console.notifier().field_errors().clone(),
        view: console.view().clone(),
    };
    (status, Json(body))
}

/// `?confirm=true` stands in for the confirmation dialog
#[derive(Deserialize, Default)]
pub struct ConfirmParams {
    #[serde(default)]
    pub confirm: bool,
}

impl ConfirmParams {
    fn decision(&self) -> PreConfirmed {
        PreConfirmed(self.confirm)
    }
}

#[derive(Deserialize)]
pub struct EditorParams {
    pub id: Option<String>,
}

pub async fn admin_view(State(state): State<Arc<AppState>>) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.refresh().await;
    reply(&mut console, outcome)
}

pub async fn open_project_editor(State(state): State<Arc<AppState>>, Query(params): Query<EditorParams>) -> AdminReply {
    let mut console = state.console().await;
    let id = params.id.map(RecordId::new);
    let outcome = console.open_project_editor(id.as_ref()).await;
    reply(&mut console, outcome)
}

pub async fn close_project_editor(State(state): State<Arc<AppState>>) -> AdminReply {
    let mut console = state.console().await;
    console.close_project_editor();
    reply(&mut console, Outcome::Done)
}

pub async fn submit_project(State(state): State<Arc<AppState>>, Json(form): Json<ProjectForm>) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.submit_project(form).await;
    reply(&mut console, outcome)
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ConfirmParams>,
) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.delete_project(&RecordId::new(id), &params.decision()).await;
    reply(&mut console, outcome)
}

pub async fn open_service_editor(State(state): State<Arc<AppState>>, Query(params): Query<EditorParams>) -> AdminReply {
    let mut console = state.console().await;
    let id = params.id.map(RecordId::new);
    let outcome = console.open_service_editor(id.as_ref()).await;
    reply(&mut console, outcome)
}

pub async fn close_service_editor(State(state): State<Arc<AppState>>) -> AdminReply {
    let mut console = state.console().await;
    console.close_service_editor();
    reply(&mut console, Outcome::Done)
}

pub async fn submit_service(State(state): State<Arc<AppState>>, Json(form): Json<ServiceForm>) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.submit_service(form).await;
    reply(&mut console, outcome)
}

pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ConfirmParams>,
) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.delete_service(&RecordId::new(id), &params.decision()).await;
    reply(&mut console, outcome)
}

#[derive(Deserialize)]
pub struct JourneyRequest {
    pub journey: String,
}

#[derive(Deserialize)]
pub struct FieldUpdate<F> {
    pub field: F,
    pub value: String,
}

#[derive(Deserialize)]
pub struct NameUpdate {
    pub name: String,
}

#[derive(Deserialize)]
pub struct ValueUpdate {
    pub value: String,
}

pub async fn save_journey(State(state): State<Arc<AppState>>, Json(body): Json<JourneyRequest>) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.save_journey(&body.journey).await;
    reply(&mut console, outcome)
}

pub async fn add_stat(State(state): State<Arc<AppState>>) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.add_stat().await;
    reply(&mut console, outcome)
}

pub async fn update_stat(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(body): Json<FieldUpdate<StatField>>,
) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.update_stat(index, body.field, &body.value).await;
    reply(&mut console, outcome)
}

pub async fn remove_stat(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Query(params): Query<ConfirmParams>,
) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.remove_stat(index, &params.decision()).await;
    reply(&mut console, outcome)
}

pub async fn add_education(State(state): State<Arc<AppState>>) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.add_education().await;
    reply(&mut console, outcome)
}

pub async fn update_education(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(body): Json<FieldUpdate<EducationField>>,
) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.update_education(index, body.field, &body.value).await;
    reply(&mut console, outcome)
}

pub async fn remove_education(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Query(params): Query<ConfirmParams>,
) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.remove_education(index, &params.decision()).await;
    reply(&mut console, outcome)
}

pub async fn add_skill_category(State(state): State<Arc<AppState>>) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.add_skill_category().await;
    reply(&mut console, outcome)
}

pub async fn update_skill_category(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(body): Json<NameUpdate>,
) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.update_skill_category(index, &body.name).await;
    reply(&mut console, outcome)
}

pub async fn remove_skill_category(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Query(params): Query<ConfirmParams>,
) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.remove_skill_category(index, &params.decision()).await;
    reply(&mut console, outcome)
}

pub async fn add_skill(State(state): State<Arc<AppState>>, Path(index): Path<usize>) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.add_skill(index).await;
    reply(&mut console, outcome)
}

pub async fn update_skill(
    State(state): State<Arc<AppState>>,
    Path((index, item)): Path<(usize, usize)>,
    Json(body): Json<ValueUpdate>,
) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.update_skill(index, item, &body.value).await;
    reply(&mut console, outcome)
}

pub async fn remove_skill(
    State(state): State<Arc<AppState>>,
    Path((index, item)): Path<(usize, usize)>,
    Query(params): Query<ConfirmParams>,
) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.remove_skill(index, item, &params.decision()).await;
    reply(&mut console, outcome)
}

#[derive(Deserialize)]
pub struct UploadParams {
    pub name: Option<String>,
}

/// Raw image body; the file name rides in `?name=`
pub async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> AdminReply {
    let file = if body.is_empty() {
        None
    } else {
        let mime_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream");
        let name = params.name.unwrap_or_else(|| "photo".to_string());
        Some(ImageFile::new(name, mime_type, body.to_vec()))
    };

    let mut console = state.console().await;
    let outcome = console.upload_photo(file).await;
    reply(&mut console, outcome)
}

pub async fn remove_photo(State(state): State<Arc<AppState>>, Query(params): Query<ConfirmParams>) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.remove_photo(&params.decision()).await;
    reply(&mut console, outcome)
}

#[derive(Deserialize)]
pub struct PhotoUrlRequest {
    pub url: String,
}

pub async fn save_photo_url(State(state): State<Arc<AppState>>, Json(body): Json<PhotoUrlRequest>) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.save_photo_url(&body.url).await;
    reply(&mut console, outcome)
}

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

pub async fn save_credentials(State(state): State<Arc<AppState>>, Json(body): Json<CredentialsRequest>) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.save_credentials(&body.username, &body.password);
    reply(&mut console, outcome)
}

/// The backup as a JSON attachment
pub async fn export(State(state): State<Arc<AppState>>) -> Response {
    let mut console = state.console().await;
    let backup = match console.export().await {
        Ok(backup) => backup,
        Err(e) => return reply(&mut console, Outcome::Failed(e.to_string())).into_response(),
    };

    match backup.to_json_pretty() {
        Ok(body) => {
            let disposition = format!("attachment; filename=\"{}\"", backup_filename());
            (
                [
                    (header::CONTENT_TYPE, "application/json".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Error serializing backup: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub async fn import(State(state): State<Arc<AppState>>, Json(body): Json<serde_json::Value>) -> AdminReply {
    let mut console = state.console().await;
    let outcome = match ImportDocument::from_value(body) {
        Ok(doc) => console.import(doc).await,
        Err(e) => {
            tracing::warn!("Rejected import document: {}", e);
            console.notifier_mut().error(format!("Error importing data: {e}"));
            Outcome::Invalid(e.to_string())
        }
    };
    reply(&mut console, outcome)
}

pub async fn seed(State(state): State<Arc<AppState>>) -> AdminReply {
    let mut console = state.console().await;
    let outcome = console.seed_defaults().await;
    reply(&mut console, outcome)
}
