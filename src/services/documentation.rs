use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the player KV backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::player_state::get_player_state,
        crate::routes::player_state::save_player_state,
        crate::routes::player_state::clear_player_state,
        crate::routes::save::get_save_data,
        crate::routes::save::store_save_data,
        crate::routes::save::clear_save_data,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::player_state::PlayerState,
            crate::dto::player_state::SavePlayerStateRequest,
            crate::dto::save_data::SaveDataSchema,
            crate::dto::envelope::AckResponse,
            crate::dto::envelope::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "player-state", description = "Anonymous player state keyed by user id"),
        (name = "save", description = "Save data of authenticated players"),
    )
)]
/// OpenAPI description of every public route.
pub struct ApiDoc;

/// Registers the `bearer` security scheme used by the save routes.
struct BearerAuth;

impl utoipa::Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}
