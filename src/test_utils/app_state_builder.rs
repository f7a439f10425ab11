//! Test app state builder for HTTP-level testing.

use std::sync::Arc;

use crate::{
    adapters::http::app_state::AppState,
    domain::entities::user::User,
    test_utils::{InMemoryRefreshTokenRepo, InMemoryUserRepo, test_auth_use_cases, test_config},
};

/// Builder for an `AppState` backed by in-memory stores.
///
/// ```ignore
/// let (app_state, users, tokens) = TestAppStateBuilder::new()
///     .with_user(create_test_user(|u| u.email = "a@x.com".to_string()))
///     .build();
/// ```
#[derive(Default)]
pub struct TestAppStateBuilder {
    users: Vec<User>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user into the store.
    pub fn with_user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    /// Returns the state plus both stores for assertions.
    pub fn build(
        self,
    ) -> (
        AppState,
        Arc<InMemoryUserRepo>,
        Arc<InMemoryRefreshTokenRepo>,
    ) {
        let refresh_tokens = Arc::new(InMemoryRefreshTokenRepo::new());
        let users = Arc::new(InMemoryUserRepo::with_ledger(refresh_tokens.clone()));
        for user in self.users {
            users.insert(user);
        }

        let auth_use_cases = test_auth_use_cases(users.clone(), refresh_tokens.clone());

        let app_state = AppState {
            config: Arc::new(test_config()),
            auth_use_cases: Arc::new(auth_use_cases),
        };

        (app_state, users, refresh_tokens)
    }
}
