use axum::routing::get;
use axum::Router;
use lms_db::repositories::MaterialKind;

use super::workflow as workflow_routes;
use crate::handlers::{material, workflow};
use crate::state::AppState;

/// Routes mounted at `/materials`.
///
/// ```text
/// GET    /{id}              get_material
/// PUT    /{id}              update_material
/// DELETE /{id}              delete
/// ```
///
/// Plus the shared approval routes (materials keep no version history).
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(material::get_material)
                .put(material::update_material)
                .delete(workflow::delete::<MaterialKind>),
        )
        .merge(workflow_routes::router::<MaterialKind>())
}
