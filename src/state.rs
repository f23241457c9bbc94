use crate::access::{AuthorizationEngine, OrmStore};
use crate::db::{DbPool, OrmConn};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub engine: AuthorizationEngine<OrmStore>,
    pub jwt_secret: String,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn, jwt_secret: impl Into<String>) -> Self {
        let jwt_secret = jwt_secret.into();
        let engine = AuthorizationEngine::new(OrmStore::new(orm.clone()), jwt_secret.clone());
        Self {
            pool,
            orm,
            engine,
            jwt_secret,
        }
    }
}
