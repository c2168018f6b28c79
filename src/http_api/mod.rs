use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::{
    Action, EXPORT_FILE_NAME, EditableFields, Mood, Outcome, PRIORITY_COUNT, PlannerError,
    PlannerSession, PlannerState, Planners, Timetable, Todo,
};

#[derive(Clone)]
pub struct AppState {
    session: Arc<RwLock<PlannerSession>>,
}

impl AppState {
    pub fn new(session: PlannerSession) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }

    pub fn with_shared(session: Arc<RwLock<PlannerSession>>) -> Self {
        Self { session }
    }

    fn session(&self) -> Arc<RwLock<PlannerSession>> {
        self.session.clone()
    }
}

/// Full view of the planner as served by `GET /state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub subjects: Vec<String>,
    pub timetable: Timetable,
    pub planners: Planners,
    pub selected_day: String,
    pub editable: EditableFields,
    pub todos: Vec<Todo>,
}

impl From<&PlannerState> for StateSnapshot {
    fn from(state: &PlannerState) -> Self {
        Self {
            subjects: state.subjects().to_vec(),
            timetable: state.timetable().clone(),
            planners: state.planners().clone(),
            selected_day: state.selected_day().to_string(),
            editable: state.editable().clone(),
            todos: state.todos().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub notice: Option<String>,
    pub state: StateSnapshot,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    Invalid(String),
    InvalidImport(String),
    Storage(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<PlannerError> for ApiError {
    fn from(value: PlannerError) -> Self {
        match value {
            PlannerError::MalformedImport(err) => ApiError::InvalidImport(err.to_string()),
            PlannerError::Storage(err) => ApiError::Storage(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::InvalidImport(message) => (StatusCode::BAD_REQUEST, "invalid_import", message),
            ApiError::Storage(message) => {
                error!("storage error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message)
            }
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct SubjectPayload {
    label: String,
}

#[derive(Debug, Deserialize)]
struct LessonPayload {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ResetPayload {
    #[serde(default)]
    confirm: bool,
}

#[derive(Debug, Deserialize)]
struct SelectDayPayload {
    day: String,
}

#[derive(Debug, Deserialize)]
struct TodoPayload {
    text: String,
}

/// Partial update of the editable fields; omitted fields stay as they are.
#[derive(Debug, Deserialize)]
struct EditablePayload {
    priorities: Option<Vec<String>>,
    notes: Option<String>,
    mood: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/state", get(get_state))
        .route("/export", get(export_state))
        .route("/import", post(import_state))
        .route("/subjects", get(list_subjects).post(add_subject))
        .route("/timetable", get(get_timetable))
        .route("/timetable/:day/:slot", put(set_lesson))
        .route("/timetable/reset", post(reset_timetable))
        .route("/timetable/example", post(autofill_example))
        .route("/selected-day", put(select_day))
        .route("/editable", get(get_editable).put(update_editable))
        .route("/editable/clear", post(clear_editable))
        .route("/planner/save", post(save_planner))
        .route("/todos", get(list_todos).post(add_todo))
        .route("/todos/:index/toggle", post(toggle_todo))
        .route("/todos/:index", delete(remove_todo))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, session: PlannerSession) -> std::io::Result<()> {
    let state = AppState::new(session);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", addr);
    axum::serve(listener, app).await
}

fn run_actions(state: &AppState, actions: Vec<Action>) -> Result<Json<ActionResponse>, ApiError> {
    let session = state.session();
    let mut guard = session.write();
    let mut notice = None;
    for action in actions {
        let Outcome {
            notice: action_notice,
            ..
        } = guard.dispatch(action)?;
        notice = action_notice.or(notice);
    }
    Ok(Json(ActionResponse {
        notice: notice.map(|n| n.to_string()),
        state: StateSnapshot::from(guard.state()),
    }))
}

fn run_action(state: &AppState, action: Action) -> Result<Json<ActionResponse>, ApiError> {
    run_actions(state, vec![action])
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_state(State(state): State<AppState>) -> Json<StateSnapshot> {
    let session = state.session();
    let snapshot = {
        let guard = session.read();
        StateSnapshot::from(guard.state())
    };
    Json(snapshot)
}

async fn export_state(State(state): State<AppState>) -> Result<Response, ApiError> {
    let session = state.session();
    let body = {
        let guard = session.read();
        guard.export_state()?
    };
    let disposition = format!("attachment; filename=\"{EXPORT_FILE_NAME}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

async fn import_state(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ActionResponse>, ApiError> {
    run_action(&state, Action::Import(body))
}

async fn list_subjects(State(state): State<AppState>) -> Json<Vec<String>> {
    let session = state.session();
    let subjects = session.read().state().subjects().to_vec();
    Json(subjects)
}

async fn add_subject(
    State(state): State<AppState>,
    Json(payload): Json<SubjectPayload>,
) -> Result<Json<ActionResponse>, ApiError> {
    run_action(&state, Action::AddSubject(payload.label))
}

async fn get_timetable(State(state): State<AppState>) -> Json<Timetable> {
    let session = state.session();
    let timetable = session.read().state().timetable().clone();
    Json(timetable)
}

async fn set_lesson(
    State(state): State<AppState>,
    Path((day, slot)): Path<(String, usize)>,
    Json(payload): Json<LessonPayload>,
) -> Result<Json<ActionResponse>, ApiError> {
    run_action(
        &state,
        Action::SetLesson {
            day,
            slot,
            text: payload.text,
        },
    )
}

async fn reset_timetable(
    State(state): State<AppState>,
    Json(payload): Json<ResetPayload>,
) -> Result<Json<ActionResponse>, ApiError> {
    run_action(
        &state,
        Action::ResetTimetable {
            confirmed: payload.confirm,
        },
    )
}

async fn autofill_example(State(state): State<AppState>) -> Result<Json<ActionResponse>, ApiError> {
    run_action(&state, Action::AutofillExample)
}

async fn select_day(
    State(state): State<AppState>,
    Json(payload): Json<SelectDayPayload>,
) -> Result<Json<ActionResponse>, ApiError> {
    run_action(&state, Action::SelectDay(payload.day))
}

async fn get_editable(State(state): State<AppState>) -> Json<EditableFields> {
    let session = state.session();
    let editable = session.read().state().editable().clone();
    Json(editable)
}

async fn update_editable(
    State(state): State<AppState>,
    Json(payload): Json<EditablePayload>,
) -> Result<Json<ActionResponse>, ApiError> {
    let mut actions = Vec::new();
    if let Some(priorities) = payload.priorities {
        if priorities.len() > PRIORITY_COUNT {
            return Err(ApiError::invalid(format!(
                "at most {PRIORITY_COUNT} priorities are allowed (got {})",
                priorities.len()
            )));
        }
        for (index, text) in priorities.into_iter().enumerate() {
            actions.push(Action::EditPriority { index, text });
        }
    }
    if let Some(notes) = payload.notes {
        actions.push(Action::EditNotes(notes));
    }
    if let Some(label) = payload.mood {
        let mood = if label.trim().is_empty() {
            None
        } else {
            Some(
                Mood::parse(&label)
                    .ok_or_else(|| ApiError::invalid(format!("unknown mood '{label}'")))?,
            )
        };
        actions.push(Action::SetMood(mood));
    }
    run_actions(&state, actions)
}

async fn clear_editable(State(state): State<AppState>) -> Result<Json<ActionResponse>, ApiError> {
    run_action(&state, Action::ClearEditable)
}

async fn save_planner(State(state): State<AppState>) -> Result<Json<ActionResponse>, ApiError> {
    run_action(&state, Action::SavePlanner)
}

async fn list_todos(State(state): State<AppState>) -> Json<Vec<Todo>> {
    let session = state.session();
    let todos = session.read().state().todos().to_vec();
    Json(todos)
}

async fn add_todo(
    State(state): State<AppState>,
    Json(payload): Json<TodoPayload>,
) -> Result<Json<ActionResponse>, ApiError> {
    run_action(&state, Action::AddTodo(payload.text))
}

async fn toggle_todo(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<ActionResponse>, ApiError> {
    run_action(&state, Action::ToggleTodo(index))
}

async fn remove_todo(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<ActionResponse>, ApiError> {
    run_action(&state, Action::RemoveTodo(index))
}
