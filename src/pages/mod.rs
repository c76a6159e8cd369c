//! Page handler shared by the viewer and admin mounts.
//!
//! One handler surface; the admin mount composes it with an [`AdminConsole`]
//! capability that adds user management and the credential listing.

pub mod views;

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Form, Router,
};
use serde_json::Value;
use uuid::Uuid;

use crate::api;
use crate::auth::{basic_auth_layer, enroll_credential, AuthenticatedUser, REALMS};
use crate::badges::award_badge;
use crate::db::{FlightDocument, Repository};
use crate::errors::AppError;
use crate::flights::ViewerQuery;
use crate::models::{Credential, CredentialInfo, EnrollRequest};
use crate::AppState;

use views::IndexView;

/// Multipart field carrying the uploaded JSON array.
pub const UPLOAD_FIELD: &str = "starting_data";

/// User management available on the admin mount.
#[derive(Debug, Clone)]
pub struct AdminConsole {
    bcrypt_cost: u32,
}

impl AdminConsole {
    pub fn new(bcrypt_cost: u32) -> Self {
        Self { bcrypt_cost }
    }

    pub async fn credentials(&self, repo: &Repository) -> Result<Vec<CredentialInfo>, AppError> {
        repo.list_credentials().await
    }

    pub async fn enroll(
        &self,
        repo: &Repository,
        request: &EnrollRequest,
    ) -> Result<Credential, AppError> {
        enroll_credential(repo, request, self.bcrypt_cost).await
    }
}

/// Which realm a mount serves and what it is allowed to do.
#[derive(Debug, Clone)]
pub struct PageHandler {
    realm: &'static str,
    title: &'static str,
    admin: Option<AdminConsole>,
}

impl PageHandler {
    pub fn viewer(realm: &'static str) -> Self {
        Self {
            realm,
            title: "Plane Spotter",
            admin: None,
        }
    }

    pub fn admin(realm: &'static str, console: AdminConsole) -> Self {
        Self {
            realm,
            title: "Plane Spotter Admin",
            admin: Some(console),
        }
    }

    pub fn realm(&self) -> &'static str {
        self.realm
    }

    /// Path the handler is nested under.
    pub fn mount(&self) -> String {
        format!("/{}", self.realm)
    }

    pub fn is_admin(&self) -> bool {
        self.admin.is_some()
    }
}

/// State seen by the handlers of one mount.
#[derive(Clone)]
pub struct PageState {
    pub app: AppState,
    pub handler: Arc<PageHandler>,
}

/// An [`AppError`] rendered as an HTML page.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        PageError(err)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        (status, Html(views::error_page(status, self.0.message()))).into_response()
    }
}

type PageResult<T> = Result<T, PageError>;

/// GET {mount}/ - Flights around the viewer, plus the user list for admins.
async fn index(
    State(state): State<PageState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<ViewerQuery>,
) -> PageResult<Html<String>> {
    tracing::debug!(realm = %user.realm, username = %user.username, "rendering flight list");
    let repo = &state.app.repo;
    let flights = state.app.fetcher.nearby_flights(repo, &query).await?;
    let badges = repo.get_user_badges(&user.username).await?;

    let credentials = match &state.handler.admin {
        Some(console) => Some(console.credentials(repo).await?),
        None => None,
    };

    let mount = state.handler.mount();
    Ok(Html(views::index_page(&IndexView {
        title: state.handler.title,
        mount: &mount,
        admin_mode: state.handler.is_admin(),
        local_mode: state.app.config.local_mode,
        username: &user.username,
        flights: &flights,
        badges: &badges,
        catalog: &state.app.catalog,
        credentials: credentials.as_deref(),
    })))
}

/// GET {mount}/upload - Upload form in local mode, the index otherwise.
async fn upload(State(state): State<PageState>) -> Response {
    let mount = state.handler.mount();
    if state.app.config.local_mode {
        Html(views::upload_page(&mount)).into_response()
    } else {
        Redirect::to(&mount).into_response()
    }
}

/// POST {mount}/upload_file - Store an uploaded JSON array as raw records.
async fn upload_file(
    State(state): State<PageState>,
    mut multipart: Multipart,
) -> PageResult<Html<String>> {
    if !state.app.config.local_mode {
        return Err(AppError::NotFound("Uploads are disabled".to_string()).into());
    }

    let mut payload = None;
    while let Some(field) = multipart.next_field().await.map_err(AppError::from)? {
        if field.name() == Some(UPLOAD_FIELD) {
            payload = Some(field.bytes().await.map_err(AppError::from)?);
            break;
        }
    }
    let payload = payload.ok_or_else(|| {
        AppError::BadRequest(format!("Missing upload field {}", UPLOAD_FIELD))
    })?;

    let documents: Vec<Value> = serde_json::from_slice(&payload).map_err(AppError::from)?;
    let documents: Vec<FlightDocument> = documents
        .into_iter()
        .map(|document| FlightDocument {
            flight_id: document
                .pointer("/identification/id")
                .and_then(Value::as_str)
                .map(str::to_string),
            document,
        })
        .collect();

    let batch_id = Uuid::new_v4();
    let inserted = state
        .app
        .repo
        .insert_flight_records(batch_id, &documents)
        .await?;
    tracing::info!(%batch_id, "uploaded {} raw flight records", inserted);

    Ok(Html(views::upload_done_page(
        &state.handler.mount(),
        batch_id,
        inserted,
    )))
}

/// POST {mount}/upload/{batch_id}/delete - Drop the records of one upload.
async fn discard_upload(
    State(state): State<PageState>,
    Path(batch_id): Path<Uuid>,
) -> PageResult<Html<String>> {
    if !state.app.config.local_mode {
        return Err(AppError::NotFound("Uploads are disabled".to_string()).into());
    }

    let removed = state.app.repo.delete_flight_batch(batch_id).await?;
    if removed == 0 {
        return Err(AppError::NotFound(format!("Upload {} not found", batch_id)).into());
    }
    tracing::info!(%batch_id, "discarded {} raw flight records", removed);

    Ok(Html(views::message_page(
        "Upload discarded",
        &format!("Removed {} flight records", removed),
        &state.handler.mount(),
    )))
}

/// GET {mount}/download - All raw records as a JSON attachment.
async fn download(State(state): State<PageState>) -> PageResult<Response> {
    if !state.app.config.local_mode {
        return Err(AppError::NotFound("Downloads are disabled".to_string()).into());
    }

    let records = state.app.repo.list_flight_records().await?;
    let body = serde_json::to_vec(&records).map_err(AppError::from)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"data.json\""),
        ],
        body,
    )
        .into_response())
}

/// POST {mount}/badges/{badge} - Collect a badge and go back to the page.
async fn collect_badge(
    State(state): State<PageState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(badge): Path<String>,
) -> PageResult<Redirect> {
    award_badge(&state.app.repo, &state.app.catalog, &user.username, &badge).await?;
    Ok(Redirect::to(&state.handler.mount()))
}

/// GET /admin/add_user - Enrollment form.
async fn add_user(State(state): State<PageState>) -> Html<String> {
    Html(views::add_user_page(&state.handler.mount(), &REALMS))
}

/// POST /admin/POST_USER - Enroll a credential and return to the admin index.
async fn post_user(
    State(state): State<PageState>,
    Form(request): Form<EnrollRequest>,
) -> PageResult<Redirect> {
    let console = state
        .handler
        .admin
        .as_ref()
        .ok_or_else(|| AppError::NotFound("User management is not available".to_string()))?;
    console.enroll(&state.app.repo, &request).await?;
    Ok(Redirect::to(&state.handler.mount()))
}

/// Build the router for one mount, guarded by basic auth for its realm.
pub fn page_router(state: AppState, handler: PageHandler) -> Router {
    let repo = state.repo.clone();
    let realm = handler.realm();
    let is_admin = handler.is_admin();

    let page_state = PageState {
        app: state,
        handler: Arc::new(handler),
    };

    let mut router = Router::new()
        .route("/", get(index))
        .route("/upload", get(upload))
        .route("/upload_file", post(upload_file))
        .route("/upload/{batch_id}/delete", post(discard_upload))
        .route("/download", get(download))
        .route("/badges/{badge}", post(collect_badge))
        .route("/api/flights", get(api::nearby_flights))
        .route("/api/badges", get(api::list_badges))
        .route("/api/badges/{badge}", post(api::award));

    if is_admin {
        router = router
            .route("/add_user", get(add_user))
            .route("/POST_USER", post(post_user));
    }

    router
        .layer(middleware::from_fn(move |req, next| {
            basic_auth_layer(repo.clone(), realm, req, next)
        }))
        .with_state(page_state)
}
