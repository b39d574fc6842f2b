//! HTTP request handlers for the family tree API.
//!
//! Each handler takes the store lock for its whole load-edit-save cycle, so
//! edits to the same tree are applied one after another.

use crate::dto::{
    AddRelationRequest, AddRelationResponse, CreateTreeRequest, HealthCheckResponse,
    MessageResponse,
};
use crate::error::AppError;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use lineage_domain::traits::TreeStore;
use lineage_domain::{
    FamilyTree, Gender, Member, MemberId, MemberSeed, MemberUpdate, RelationshipEditor, TreeError,
    TreeId,
};
use lineage_store::SqliteStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Tree document store, one writer at a time
    pub store: Arc<Mutex<SqliteStore>>,
}

impl AppState {
    /// Wrap a store for sharing between handlers
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }
}

/// Unwrap a JSON body, reporting malformed input as 400
fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn load_tree(store: &SqliteStore, id: &str) -> Result<FamilyTree, AppError> {
    store
        .get_tree(&TreeId::from(id))?
        .ok_or_else(|| AppError::TreeNotFound(id.to_string()))
}

/// GET /api/family-trees - All trees with their members
async fn list_trees(State(state): State<AppState>) -> Result<Json<Vec<FamilyTree>>, AppError> {
    let store = state.store.lock().await;
    Ok(Json(store.list_trees()?))
}

/// GET /api/family-trees/:id
async fn get_tree(
    State(state): State<AppState>,
    Path(tree_id): Path<String>,
) -> Result<Json<FamilyTree>, AppError> {
    let store = state.store.lock().await;
    Ok(Json(load_tree(&store, &tree_id)?))
}

/// POST /api/family-trees - Create a tree from a name and initial members
async fn create_tree(
    State(state): State<AppState>,
    payload: Result<Json<CreateTreeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FamilyTree>), AppError> {
    let request = parse_body(payload)?;
    let (Some(name), Some(members)) = (request.name, request.members) else {
        return Err(AppError::BadRequest("Name and members are required".to_string()));
    };

    let tree = FamilyTree::new(name, members)?;

    let mut store = state.store.lock().await;
    store.insert_tree(&tree)?;

    info!(tree_id = %tree.id, name = %tree.name, members = tree.len(), "Created family tree");
    Ok((StatusCode::CREATED, Json(tree)))
}

/// DELETE /api/family-trees/:id
async fn delete_tree(
    State(state): State<AppState>,
    Path(tree_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut store = state.store.lock().await;
    if !store.delete_tree(&TreeId::from(tree_id.as_str()))? {
        return Err(AppError::TreeNotFound(tree_id));
    }

    info!(tree_id = %tree_id, "Deleted family tree");
    Ok(Json(MessageResponse {
        message: "Family tree deleted successfully".to_string(),
    }))
}

/// POST /api/family-trees/:id/members - Add a member with no relations
async fn add_member(
    State(state): State<AppState>,
    Path(tree_id): Path<String>,
    payload: Result<Json<MemberSeed>, JsonRejection>,
) -> Result<(StatusCode, Json<Member>), AppError> {
    let seed = parse_body(payload)?;
    if !seed.has_name() {
        return Err(TreeError::MissingName.into());
    }
    let member = seed.into_member(String::new, Gender::Male);

    let mut store = state.store.lock().await;
    let mut tree = load_tree(&store, &tree_id)?;
    let member = tree.insert_member(member)?.clone();
    store.save_tree(&tree)?;

    info!(
        tree_id = %tree_id,
        member_id = %member.id,
        gender = member.gender.as_str(),
        "Added member"
    );
    Ok((StatusCode::CREATED, Json(member)))
}

/// PUT /api/family-trees/:id/members/:member_id - Update display fields
async fn update_member(
    State(state): State<AppState>,
    Path((tree_id, member_id)): Path<(String, String)>,
    payload: Result<Json<MemberUpdate>, JsonRejection>,
) -> Result<Json<Member>, AppError> {
    let update = parse_body(payload)?;

    let mut store = state.store.lock().await;
    let mut tree = load_tree(&store, &tree_id)?;
    let member = tree.update_member(&MemberId::from(member_id), update)?.clone();
    store.save_tree(&tree)?;

    info!(tree_id = %tree_id, member_id = %member.id, "Updated member");
    Ok(Json(member))
}

/// POST /api/family-trees/:id/members/:member_id/relation - Add a relation
///
/// Runs the relationship editor and persists the edited tree. Responds 201
/// when a new member was created, 200 when an existing one was linked.
async fn add_relation(
    State(state): State<AppState>,
    Path((tree_id, member_id)): Path<(String, String)>,
    payload: Result<Json<AddRelationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddRelationResponse>), AppError> {
    let command = parse_body(payload)?.into_command(MemberId::from(member_id))?;

    let mut store = state.store.lock().await;
    let tree = load_tree(&store, &tree_id)?;
    let outcome = RelationshipEditor::new(&tree).apply(&command)?;
    store.save_tree(&outcome.tree)?;

    info!(
        tree_id = %tree_id,
        subject = %command.subject,
        mode = %command.mode,
        related = %outcome.related_member.id,
        edges = outcome.edge_mutations.len(),
        touched = outcome.touched_members().len(),
        "Added relation"
    );

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(AddRelationResponse {
            related_member: outcome.related_member,
            edge_mutations: outcome.edge_mutations,
        }),
    ))
}

/// GET /health - Store reachability check
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthCheckResponse>) {
    let store = state.store.lock().await;
    match store.tree_count() {
        Ok(tree_count) => (
            StatusCode::OK,
            Json(HealthCheckResponse {
                status: "healthy".to_string(),
                tree_count,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthCheckResponse {
                    status: "unhealthy".to_string(),
                    tree_count: 0,
                }),
            )
        }
    }
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/family-trees", get(list_trees).post(create_tree))
        .route("/api/family-trees/:id", get(get_tree).delete(delete_tree))
        .route("/api/family-trees/:id/members", post(add_member))
        .route("/api/family-trees/:id/members/:member_id", put(update_member))
        .route(
            "/api/family-trees/:id/members/:member_id/relation",
            post(add_relation),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
