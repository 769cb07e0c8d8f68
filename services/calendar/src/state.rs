//! Application state shared across handlers

use chrono::{DateTime, Utc};
use mockable::Clock;
use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    config::Settings,
    error::ApiResult,
    geolocation::Geolocator,
    password::PasswordManager,
    repositories::{
        CalendarRepository, EventRepository, RoleRepository, SessionRepository,
        UserCalendarRepository, UserRepository,
    },
    role::RoleService,
    session::SessionService,
    token::TokenGenerator,
};

/// Clock handle shared by every component that stamps rows
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Arc<Settings>,
    pub clock: SharedClock,
    pub passwords: PasswordManager,
    pub user_repository: UserRepository,
    pub role_repository: RoleRepository,
    pub calendar_repository: CalendarRepository,
    pub event_repository: EventRepository,
    pub user_calendar_repository: UserCalendarRepository,
    pub session_service: SessionService,
    pub role_service: RoleService,
}

impl AppState {
    /// Wire every component around one pool, clock and token source
    pub fn new(
        pool: PgPool,
        settings: Settings,
        clock: SharedClock,
        tokens: Arc<dyn TokenGenerator>,
    ) -> ApiResult<Self> {
        let settings = Arc::new(settings);
        let passwords =
            PasswordManager::new(settings.password_memory_kib, settings.password_iterations)?;

        let user_repository = UserRepository::new(pool.clone());
        let role_repository = RoleRepository::new(pool.clone());

        let session_service = SessionService::new(
            SessionRepository::new(pool.clone()),
            user_repository.clone(),
            role_repository.clone(),
            passwords.clone(),
            tokens,
            Geolocator::new(&settings),
            clock.clone(),
            settings.session_ttl(),
        );
        let role_service =
            RoleService::new(role_repository.clone(), user_repository.clone(), clock.clone());

        Ok(Self {
            calendar_repository: CalendarRepository::new(pool.clone()),
            event_repository: EventRepository::new(pool.clone()),
            user_calendar_repository: UserCalendarRepository::new(pool.clone()),
            db_pool: pool,
            settings,
            clock,
            passwords,
            user_repository,
            role_repository,
            session_service,
            role_service,
        })
    }

    /// Current instant according to the application clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }
}
