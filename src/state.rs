use std::sync::Arc;

use crate::{
    config::JwtConfig,
    db::{DbPool, OrmConn, orm_from_pool},
    store::{MemoryStore, SessionStore},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub sessions: Arc<dyn SessionStore>,
    pub jwt: JwtConfig,
}

impl AppState {
    /// State backed by the given pool with carts and orders kept in memory.
    pub fn new(pool: DbPool, jwt: JwtConfig) -> Self {
        Self::with_sessions(pool, jwt, Arc::new(MemoryStore::new()))
    }

    pub fn with_sessions(pool: DbPool, jwt: JwtConfig, sessions: Arc<dyn SessionStore>) -> Self {
        let orm = orm_from_pool(&pool);
        Self {
            pool,
            orm,
            sessions,
            jwt,
        }
    }
}
