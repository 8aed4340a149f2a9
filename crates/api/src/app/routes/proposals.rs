use axum::Router;

use jarvis_proposals::Proposal;

use super::resources::crud_router;

pub fn router() -> Router {
    crud_router::<Proposal>()
}
