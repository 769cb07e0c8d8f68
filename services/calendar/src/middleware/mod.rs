//! Request middlewares
//!
//! Authentication stashes an [`auth::AuthUser`]; resolvers stash the `User`,
//! `Calendar` or `Event` named by a path parameter. Handlers read them back
//! through extractors, never through shared state.

pub mod access;
pub mod auth;
pub mod resolve;

pub use access::calendar_access_middleware;
pub use auth::{
    AuthUser, RequiredRoles, admin_middleware, auth_middleware, bearer_token,
    optional_auth_middleware, roles_middleware,
};
pub use resolve::{PathParam, require_calendar, require_event, require_user};
