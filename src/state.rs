use std::sync::Arc;

use crate::repo::Repo;
use crate::session::SessionStore;

/// Long-lived application state shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repo>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(repo: Repo) -> Self {
        AppState {
            repo: Arc::new(repo),
            sessions: SessionStore::new(),
        }
    }

    pub fn ctx<'a>(&'a self, session_id: &'a str) -> crate::commands::Ctx<'a> {
        crate::commands::Ctx::new(&self.repo, &self.sessions, session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreHandle;

    #[test]
    fn ctx_borrows_the_shared_repo() {
        let state = AppState::new(Repo::new(StoreHandle::in_memory()));
        let ctx = state.ctx("cli");
        assert_eq!(ctx.session_id, "cli");
        assert!(std::ptr::eq(ctx.repo, state.repo.as_ref()));
    }
}
