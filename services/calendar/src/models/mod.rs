//! Calendar service models

pub mod calendar;
pub mod event;
pub mod role;
pub mod session;
pub mod user;
pub mod user_calendar;

// Re-export for convenience
pub use calendar::{Calendar, CalendarChanges, CreateCalendarRequest, CreateCalendarResponse};
pub use event::{CreateEventRequest, CreateEventResponse, Event, EventChanges, NewEvent};
pub use role::{CreateRoleRequest, CreateRoleResponse, Role, RoleAssignmentRequest, RoleChanges};
pub use session::{
    LoginRequest, LoginResponse, NewSession, RefreshRequest, RefreshResponse, Session,
    SessionView,
};
pub use user::{
    CreateUserRequest, CreateUserResponse, NewUser, UpdateUserRequest, User, UserChanges,
    UserCredentials, UserProfile,
};
pub use user_calendar::{CreateUserCalendarRequest, UserCalendar};
