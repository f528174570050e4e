use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use todos_core::pagination::PaginationInfo;
use todos_core::todos::{CreateTodoRequest, Todo, TodoStatus, UpdateTodoRequest};
use todos_core::validation::FieldError;
use utoipa::openapi::security::SecurityScheme;
use utoipa::Modify;
use utoipa::OpenApi;

use crate::api::error::{ErrorBody, ErrorResponse};
use crate::api::handlers::auth::{
    login_handler, signup_handler, Credentials, TokenResponse, __path_login_handler,
    __path_signup_handler,
};
use crate::api::handlers::health::{health_handler, HealthResponse, __path_health_handler};
use crate::api::handlers::todos::create::{create_todo_handler, __path_create_todo_handler};
use crate::api::handlers::todos::delete::{
    delete_todo_handler, DeleteResponse, __path_delete_todo_handler,
};
use crate::api::handlers::todos::list::{list_todos_handler, __path_list_todos_handler};
use crate::api::handlers::todos::update::{update_todo_handler, __path_update_todo_handler};
use crate::api::middleware::auth::require_user;
use crate::api::middleware::identity::resolve_identity;
use crate::api::rate_limiting::middleware::{rate_limit, RateLimitExceeded};
use crate::api::response_cache::middleware::response_cache;
use crate::app_state::SharedAppState;
use crate::db::users::UserView;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        signup_handler,
        login_handler,
        list_todos_handler,
        create_todo_handler,
        update_todo_handler,
        delete_todo_handler,
    ),
    components(
        schemas(
            Credentials, TokenResponse, UserView, Todo, TodoStatus, CreateTodoRequest,
            UpdateTodoRequest, PaginationInfo, DeleteResponse, HealthResponse,
            ErrorResponse, ErrorBody, FieldError, RateLimitExceeded
        )
    ),
    tags(
        (name = "todos", description = "todos api")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Bearer,
                )),
            )
        }
    }
}

async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub struct ApiRoutes;

impl ApiRoutes {
    /// The full route table with the request pipeline
    /// identity -> response cache -> rate limiter -> auth -> handler.
    pub fn create(state: SharedAppState) -> Router {
        let authenticated_router = Router::new()
            .route(
                "/todos",
                get(list_todos_handler).post(create_todo_handler),
            )
            .route("/todo/{uuid}", put(update_todo_handler))
            .route("/todos/{uuid}", delete(delete_todo_handler))
            .route_layer(middleware::from_fn(require_user));

        let public_router = Router::new()
            .route("/signup", post(signup_handler))
            .route("/auth", post(login_handler))
            .route("/health", get(health_handler))
            .route("/api-docs/openapi.json", get(openapi_handler));

        Router::new()
            .merge(authenticated_router)
            .merge(public_router)
            .layer(DefaultBodyLimit::max(state.settings.api.max_body_size))
            .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
            .layer(middleware::from_fn_with_state(state.clone(), response_cache))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                resolve_identity,
            ))
            .with_state(state)
    }
}
