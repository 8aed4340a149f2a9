use axum::Router;

use jarvis_products::Product;

use super::resources::crud_router;

/// Reads are open to every user; writes are admin-only.
pub fn router() -> Router {
    crud_router::<Product>()
}
