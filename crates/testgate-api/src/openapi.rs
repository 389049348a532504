//! OpenAPI document

use crate::auth::{LoginRequest, RefreshRequest, RegisterRequest, TokenPair, UserInfo};
use crate::error::ApiError;
use crate::handlers::{auth, health, test_resource};
use crate::resources::CreateTestRequest;
use axum::Json;
use testgate_core::{Role, Test};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TestGate API",
        description = "Token-based identity and role-gated access to tests"
    ),
    paths(
        health::health_check,
        auth::register_handler,
        auth::login_handler,
        auth::refresh_handler,
        auth::me_handler,
        test_resource::get_test,
        test_resource::create_test,
        test_resource::delete_test,
    ),
    components(schemas(
        ApiError,
        Role,
        Test,
        RegisterRequest,
        LoginRequest,
        RefreshRequest,
        TokenPair,
        UserInfo,
        CreateTestRequest,
        health::HealthResponse,
        auth::RegisterResponse,
        test_resource::TestMutationResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Registration, login and token refresh"),
        (name = "tests", description = "Role-gated test resource"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
