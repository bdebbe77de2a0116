use std::sync::Arc;

use http::{Method, StatusCode};
use mockall::Sequence;
use serde_json::json;

use super::*;
use crate::{
    cookies::MockCookieSource,
    transport::{MockHttpTransport, TransportError},
};

const XSRF_TOKEN: &str = "test-xsrf-token";

fn cookies_with_token() -> MockCookieSource {
    let mut cookies = MockCookieSource::new();
    cookies
        .expect_get_cookie()
        .returning(|name| (name == "XSRF-TOKEN").then(|| XSRF_TOKEN.to_string()));
    cookies
}

fn store_with(transport: MockHttpTransport) -> AuthenticationStore {
    AuthenticationStore::new(Arc::new(transport), Arc::new(cookies_with_token()))
}

fn test_account() -> Account {
    serde_json::from_value(json!({"activated": true, "email": "test@test.com", "id": 1})).unwrap()
}

fn account_response() -> HttpResponse {
    HttpResponse::with_json(
        StatusCode::OK,
        &json!({"activated": true, "email": "test@test.com", "id": 1}),
    )
}

fn is_account_request(request: &HttpRequest) -> bool {
    request.method == Method::GET
        && request.path == "/api/account"
        && request.header_value("X-XSRF-TOKEN") == Some(XSRF_TOKEN)
}

#[test]
fn initial_state_is_anonymous() {
    let state = store_with(MockHttpTransport::new()).get_state();

    assert_eq!(state.account, None);
    assert!(!state.authenticated);
    assert!(!state.loading);
    assert!(!state.login_error);
    assert!(!state.session_has_been_fetched);
    assert!(!state.show_login);
}

mod get_account {
    use super::*;

    #[tokio::test]
    async fn success_populates_account() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_request()
            .withf(is_account_request)
            .times(1)
            .returning(|_| Ok(account_response()));
        let store = store_with(transport);

        let result = store.get_account().await.unwrap();

        let state = store.get_state();
        assert_eq!(result, Some(test_account()));
        assert_eq!(state.account, Some(test_account()));
        assert!(state.authenticated);
        assert!(!state.loading);
        assert!(state.session_has_been_fetched);
        assert!(!state.show_login);
    }

    #[tokio::test]
    async fn unauthorized_marks_session_fetched_and_shows_login() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_request()
            .times(1)
            .returning(|_| Ok(HttpResponse::empty(StatusCode::UNAUTHORIZED)));
        let store = store_with(transport);

        let result = store.get_account().await.unwrap();

        let state = store.get_state();
        assert_eq!(result, None);
        assert!(!state.loading);
        assert!(state.session_has_been_fetched);
        assert!(state.show_login);
        assert!(!state.authenticated);
        assert_eq!(state.account, None);
    }

    #[tokio::test]
    async fn skipped_while_loading() {
        let mut transport = MockHttpTransport::new();
        transport.expect_request().never();
        let store = store_with(transport);
        store.set_state(|state| state.loading = true);

        assert_eq!(store.get_account().await.unwrap(), None);
        assert!(!store.get_state().session_has_been_fetched);
    }

    #[tokio::test]
    async fn empty_object_body_is_anonymous() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_request()
            .times(1)
            .returning(|_| Ok(HttpResponse::with_json(StatusCode::OK, &json!({}))));
        let store = store_with(transport);

        assert_eq!(store.get_account().await.unwrap(), None);

        let state = store.get_state();
        assert!(!state.authenticated);
        assert!(state.show_login);
        assert!(state.session_has_been_fetched);
    }

    #[tokio::test]
    async fn header_omitted_without_cookie() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_request()
            .withf(|request| request.header_value("X-XSRF-TOKEN").is_none())
            .times(1)
            .returning(|_| Ok(account_response()));
        let mut cookies = MockCookieSource::new();
        cookies.expect_get_cookie().returning(|_| None);
        let store = AuthenticationStore::new(Arc::new(transport), Arc::new(cookies));

        assert!(store.get_account().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn custom_xsrf_names_are_used() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_request()
            .withf(|request| request.header_value("X-CSRF-TOKEN") == Some("custom"))
            .times(1)
            .returning(|_| Ok(account_response()));
        let mut cookies = MockCookieSource::new();
        cookies
            .expect_get_cookie()
            .withf(|name| name == "CSRF-TOKEN")
            .returning(|_| Some("custom".to_string()));
        let store = AuthenticationStore::new(Arc::new(transport), Arc::new(cookies))
            .with_xsrf_names("CSRF-TOKEN", "X-CSRF-TOKEN");

        assert!(store.get_account().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn transport_failure_releases_guard() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_request()
            .times(1)
            .returning(|_| Err(TransportError::Connection("reset by peer".to_string())));
        let store = store_with(transport);

        let err = store.get_account().await.unwrap_err();

        assert!(matches!(err, StoreError::Transport(_)));
        let state = store.get_state();
        assert!(!state.loading);
        assert!(!state.session_has_been_fetched);
        assert!(!state.show_login);
    }

    #[tokio::test]
    async fn malformed_account_is_a_decode_error() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_request()
            .times(1)
            .returning(|_| Ok(HttpResponse::with_json(StatusCode::OK, &json!({"id": "one"}))));
        let store = store_with(transport);

        let err = store.get_account().await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::Decode {
                endpoint: "/api/account",
                ..
            }
        ));
        assert_eq!(store.get_state(), AuthenticationState::default());
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn success_posts_form_then_fetches_account() {
        let mut transport = MockHttpTransport::new();
        let mut sequence = Sequence::new();
        transport
            .expect_request()
            .withf(|request| {
                let body = request.body.as_deref().unwrap_or_default();
                request.method == Method::POST
                    && request.path == "/api/authentication"
                    && body.contains("username=test%40test.com")
                    && body.contains("password=password")
                    && body.contains("rememberMe=true")
                    && request.header_value("content-type")
                        == Some("application/x-www-form-urlencoded")
            })
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(HttpResponse::empty(StatusCode::OK)));
        transport
            .expect_request()
            .withf(is_account_request)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(account_response()));
        let store = store_with(transport);

        let account = store
            .login("test@test.com", "password", true)
            .await
            .unwrap();

        let state = store.get_state();
        assert_eq!(account, Some(test_account()));
        assert!(!state.login_error);
        assert!(!state.show_login);
        assert!(state.authenticated);
        assert_eq!(state.account, Some(test_account()));
    }

    #[tokio::test]
    async fn rejection_sets_error_and_stops() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_request()
            .withf(|request| request.path == "/api/authentication")
            .times(1)
            .returning(|_| Ok(HttpResponse::empty(StatusCode::UNAUTHORIZED)));
        let store = store_with(transport);

        let account = store
            .login("test@test.com", "password", true)
            .await
            .unwrap();

        let state = store.get_state();
        assert_eq!(account, None);
        assert!(state.login_error);
        assert!(state.show_login);
        assert!(!state.authenticated);
        assert!(!state.session_has_been_fetched);
    }

    #[tokio::test]
    async fn remember_me_false_is_encoded() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_request()
            .withf(|request| {
                request
                    .body
                    .as_deref()
                    .is_some_and(|body| body.ends_with("rememberMe=false"))
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::empty(StatusCode::FORBIDDEN)));
        let store = store_with(transport);

        store.login("u", "p", false).await.unwrap();
    }

    #[tokio::test]
    async fn retry_after_failure_clears_error() {
        let mut transport = MockHttpTransport::new();
        let mut sequence = Sequence::new();
        transport
            .expect_request()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(HttpResponse::empty(StatusCode::UNAUTHORIZED)));
        transport
            .expect_request()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(HttpResponse::empty(StatusCode::OK)));
        transport
            .expect_request()
            .withf(is_account_request)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(account_response()));
        let store = store_with(transport);

        store.login("u", "wrong", false).await.unwrap();
        assert!(store.get_state().login_error);

        store.login("u", "right", false).await.unwrap();

        let state = store.get_state();
        assert!(!state.login_error);
        assert!(state.authenticated);
    }

    #[tokio::test]
    async fn transport_failure_leaves_state_untouched() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_request()
            .times(1)
            .returning(|_| Err(TransportError::Connection("timed out".to_string())));
        let store = store_with(transport);
        store.set_state(|state| state.login_error = true);
        let before = store.get_state();

        assert!(store.login("u", "p", true).await.is_err());
        assert_eq!(store.get_state(), before);
    }

    #[tokio::test]
    async fn account_step_failure_shows_login_again() {
        let mut transport = MockHttpTransport::new();
        let mut sequence = Sequence::new();
        transport
            .expect_request()
            .withf(|request| request.path == "/api/authentication")
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(HttpResponse::empty(StatusCode::OK)));
        transport
            .expect_request()
            .withf(is_account_request)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Err(TransportError::Connection("reset by peer".to_string())));
        let store = store_with(transport);
        store.set_state(|state| {
            state.show_login = true;
            state.login_error = true;
        });

        let err = store.login("u", "p", true).await.unwrap_err();

        assert!(matches!(err, StoreError::Transport(_)));
        let state = store.get_state();
        assert!(state.show_login);
        assert!(!state.authenticated);
        assert!(!state.loading);
        assert_eq!(state.account, None);
    }
}

mod logout {
    use super::*;

    #[tokio::test]
    async fn clears_account_and_shows_login() {
        let mut transport = MockHttpTransport::new();
        let mut sequence = Sequence::new();
        transport
            .expect_request()
            .withf(|request| request.method == Method::POST && request.path == "/api/logout")
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(HttpResponse::empty(StatusCode::OK)));
        transport
            .expect_request()
            .withf(is_account_request)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(HttpResponse::with_json(StatusCode::OK, &json!({}))));
        let store = store_with(transport);
        store.set_state(|state| {
            state.account = Some(Account {
                id: Some(1),
                ..Account::default()
            });
            state.authenticated = true;
        });

        store.logout().await.unwrap();

        let state = store.get_state();
        assert!(state.show_login);
        assert_eq!(state.account, None);
        assert!(!state.authenticated);
    }

    #[tokio::test]
    async fn server_error_still_clears_locally() {
        let mut transport = MockHttpTransport::new();
        let mut sequence = Sequence::new();
        transport
            .expect_request()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(HttpResponse::empty(StatusCode::INTERNAL_SERVER_ERROR)));
        transport
            .expect_request()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(HttpResponse::empty(StatusCode::UNAUTHORIZED)));
        let store = store_with(transport);
        store.set_state(|state| {
            state.account = Some(test_account());
            state.authenticated = true;
        });

        store.logout().await.unwrap();

        let state = store.get_state();
        assert_eq!(state.account, None);
        assert!(state.show_login);
        assert!(!state.authenticated);
    }

    #[tokio::test]
    async fn live_session_on_recheck_stays_signed_out() {
        let mut transport = MockHttpTransport::new();
        let mut sequence = Sequence::new();
        transport
            .expect_request()
            .withf(|request| request.path == "/api/logout")
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(HttpResponse::empty(StatusCode::INTERNAL_SERVER_ERROR)));
        transport
            .expect_request()
            .withf(is_account_request)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(account_response()));
        let store = store_with(transport);
        store.set_state(|state| {
            state.account = Some(test_account());
            state.authenticated = true;
        });

        store.logout().await.unwrap();

        let state = store.get_state();
        assert_eq!(state.account, None);
        assert!(!state.authenticated);
        assert!(state.show_login);
        assert!(!state.loading);
        assert!(state.session_has_been_fetched);
    }

    #[tokio::test]
    async fn transport_failure_keeps_session() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_request()
            .times(1)
            .returning(|_| Err(TransportError::Connection("offline".to_string())));
        let store = store_with(transport);
        store.set_state(|state| {
            state.account = Some(test_account());
            state.authenticated = true;
        });

        assert!(store.logout().await.is_err());

        let state = store.get_state();
        assert!(state.authenticated);
        assert_eq!(state.account, Some(test_account()));
    }
}

mod other_actions {
    use super::*;

    #[test]
    fn clear_authentication_resets_auth_flags() {
        let mut transport = MockHttpTransport::new();
        transport.expect_request().never();
        let store = store_with(transport);
        store.set_state(|state| {
            state.authenticated = true;
            state.loading = true;
        });

        store.clear_authentication();

        let state = store.get_state();
        assert!(!state.authenticated);
        assert!(!state.loading);
        assert!(state.show_login);
    }

    #[test]
    fn reset_restores_initial_state() {
        let store = store_with(MockHttpTransport::new());
        store.set_state(|state| {
            state.authenticated = true;
            state.show_login = true;
            state.login_error = true;
            state.account = Some(test_account());
        });

        store.reset();

        let state = store.get_state();
        assert!(!state.authenticated);
        assert!(!state.show_login);
        assert_eq!(state, AuthenticationState::default());
    }

    #[test]
    fn replace_state_overwrites_snapshot() {
        let store = store_with(MockHttpTransport::new());
        let replacement = AuthenticationState {
            authenticated: true,
            account: Some(test_account()),
            ..AuthenticationState::default()
        };

        store.replace_state(replacement.clone());

        assert_eq!(store.get_state(), replacement);
    }

    #[tokio::test]
    async fn subscribers_see_login_transitions() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_request()
            .times(1)
            .returning(|_| Ok(HttpResponse::empty(StatusCode::UNAUTHORIZED)));
        let store = store_with(transport);
        let mut receiver = store.subscribe();

        store.login("u", "p", false).await.unwrap();

        assert!(receiver.has_changed().unwrap());
        assert!(receiver.borrow_and_update().login_error);
    }
}
