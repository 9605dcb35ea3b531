#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
//! # Navigation Gate Properties
//!
//! Properties that must hold for every session snapshot, checked against the
//! pure gate and through the fail-open guard and router driver.

use assert_matches::assert_matches;
use botsify_app::navigation::gate::{CHOOSE_PLAN_PATH, HOME_PATH, LOGIN_PATH, SELECT_AGENT_PATH};
use botsify_app::{
    AuthorizationGate, Decision, GateError, NavigationConfig, NavigationGuard, NavigationTarget,
    Navigator, RouteTable, Session, SessionSource,
};
use proptest::prelude::*;

const EXEMPT: &str = "shopify";

// ============================================================================
// Strategies
// ============================================================================

fn source_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just(EXEMPT.to_string()),
        Just("wix".to_string()),
    ]
}

prop_compose! {
    fn session_strategy()(
        is_authenticated in any::<bool>(),
        email_verified in any::<bool>(),
        has_subscription in any::<bool>(),
        is_app_sumo_user in any::<bool>(),
        is_bot_admin in any::<bool>(),
        source in source_strategy(),
        email in "[a-z]{1,8}@[a-z]{1,6}\\.com",
    ) -> Session {
        Session {
            is_authenticated,
            email_verified,
            has_subscription,
            is_app_sumo_user,
            is_bot_admin,
            source,
            email,
        }
    }
}

fn path_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("/".to_string()),
        Just("/auth/login".to_string()),
        Just("/auth/forgot-password".to_string()),
        Just("/auth/verify-email".to_string()),
        Just("/choose-plan".to_string()),
        Just("/select-agent".to_string()),
        Just("/whitelabel".to_string()),
        "/subscription/[a-z]{3,8}",
        "/agent/[a-z0-9]{4}/(users|conversations|dashboard)",
        "/[a-z]{2,10}/[a-z]{2,10}",
    ]
}

fn auth_path_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("/auth/login".to_string()),
        Just("/auth/signup".to_string()),
        Just("/auth/forgot-password".to_string()),
        Just("/auth/verify-email".to_string()),
        "/auth/[a-z]{2,12}",
    ]
}

fn target(path: &str, requires_auth: bool) -> NavigationTarget {
    let mut target = RouteTable::botsify().resolve(path);
    target.requires_auth = requires_auth;
    target
}

fn evaluate(to: &NavigationTarget, from: &NavigationTarget, session: &Session) -> Decision {
    AuthorizationGate::new(EXEMPT)
        .evaluate(to, from, session, &true)
        .unwrap()
        .decision
}

// ============================================================================
// Gate Properties
// ============================================================================

proptest! {
    /// Property: signed-out users reach every public page
    #[test]
    fn prop_signed_out_public_proceeds(
        mut session in session_strategy(),
        to in path_strategy(),
        from in path_strategy(),
    ) {
        session.is_authenticated = false;
        let decision = evaluate(&target(&to, false), &target(&from, true), &session);
        prop_assert_eq!(decision, Decision::Proceed);
    }

    /// Property: signed-out users are sent to login for protected pages
    #[test]
    fn prop_signed_out_protected_redirects_to_login(
        mut session in session_strategy(),
        to in path_strategy(),
        from in path_strategy(),
    ) {
        session.is_authenticated = false;
        let decision = evaluate(&target(&to, true), &target(&from, false), &session);
        prop_assert_eq!(decision, Decision::redirect(LOGIN_PATH));
    }

    /// Property: subscribers never see auth pages
    #[test]
    fn prop_subscriber_auth_pages_redirect_home(
        mut session in session_strategy(),
        to in auth_path_strategy(),
        from in path_strategy(),
    ) {
        session.is_authenticated = true;
        session.has_subscription = true;
        let decision = evaluate(&target(&to, false), &target(&from, true), &session);
        prop_assert_eq!(decision, Decision::redirect(HOME_PATH));
    }

    /// Property: verified users without a plan can always open the plan page
    #[test]
    fn prop_verified_without_plan_reaches_choose_plan(
        mut session in session_strategy(),
        from in path_strategy(),
        repeats in 1usize..4,
    ) {
        session.is_authenticated = true;
        session.email_verified = true;
        session.has_subscription = false;
        session.source = String::new();

        let to = target(CHOOSE_PLAN_PATH, true);
        let mut from = target(&from, true);
        for _ in 0..repeats {
            prop_assert_eq!(evaluate(&to, &from, &session), Decision::Proceed);
            from = to.clone();
        }
    }

    /// Property: subscribers reach the plan page only when changing plans
    #[test]
    fn prop_subscriber_plan_page_only_from_agent_selection(
        mut session in session_strategy(),
        from in path_strategy(),
    ) {
        session.is_authenticated = true;
        session.has_subscription = true;
        let to = target(CHOOSE_PLAN_PATH, true);

        prop_assert_eq!(
            evaluate(&to, &target(SELECT_AGENT_PATH, true), &session),
            Decision::Proceed
        );
        prop_assume!(from != SELECT_AGENT_PATH);
        prop_assert_eq!(
            evaluate(&to, &target(&from, true), &session),
            Decision::redirect(HOME_PATH)
        );
    }

    /// Property: collaborator failures never block a navigation
    #[test]
    fn prop_broken_session_store_fails_open(to in path_strategy(), from in path_strategy()) {
        let guard = NavigationGuard::new(NavigationConfig::default(), BrokenStore, true, "k1");
        let routes = RouteTable::botsify();
        let resolution = guard.before_each(&routes.resolve(&to), &routes.resolve(&from));
        prop_assert_eq!(resolution.decision, Decision::Proceed);
    }

    /// Property: every navigation settles for well-formed sessions
    #[test]
    fn prop_navigation_settles(session in session_strategy(), to in path_strategy()) {
        let guard = NavigationGuard::new(NavigationConfig::default(), session, true, "k1");
        let mut navigator = Navigator::new(&guard, RouteTable::botsify());
        let report = navigator.navigate(&to);
        prop_assert!(report.is_ok(), "navigation to {} did not settle: {:?}", to, report);
    }
}

struct BrokenStore;

impl SessionSource for BrokenStore {
    fn session_snapshot(&self) -> Result<Session, GateError> {
        Err(GateError::session("store offline"))
    }
}

// ============================================================================
// Router Scenarios
// ============================================================================

#[test]
fn test_signup_disabled_sends_to_login() {
    let guard = NavigationGuard::new(NavigationConfig::default(), Session::default(), false, "k1");
    let mut navigator = Navigator::new(&guard, RouteTable::botsify());

    let report = navigator.navigate("/auth/signup").unwrap();
    assert_eq!(report.location.path, LOGIN_PATH);
    assert_eq!(report.hops[0].rule, "signup-disabled");
}

#[test]
fn test_new_customer_onboarding() {
    let session = Session {
        is_authenticated: true,
        email_verified: true,
        email: "new@example.com".to_string(),
        ..Session::default()
    };
    let guard = NavigationGuard::new(NavigationConfig::default(), session, true, "k1");
    let mut navigator = Navigator::new(&guard, RouteTable::botsify());

    let report = navigator.navigate("/agent/k1/users").unwrap();
    assert_eq!(report.location.path, CHOOSE_PLAN_PATH);

    let report = navigator.navigate("/subscription/pro").unwrap();
    assert_eq!(report.location.name.as_deref(), Some("subscription"));
}

#[test]
fn test_exempt_marketplace_user_skips_plan() {
    let session = Session {
        is_authenticated: true,
        source: EXEMPT.to_string(),
        ..Session::default()
    };
    let guard = NavigationGuard::new(NavigationConfig::default(), session, true, "k1");
    let mut navigator = Navigator::new(&guard, RouteTable::botsify());

    let report = navigator.navigate("/whitelabel").unwrap();
    assert_eq!(report.redirects(), 0);
    assert_eq!(report.location.path, "/whitelabel");
}

#[test]
fn test_redirect_loop_surfaces_error() {
    let routes = RouteTable::new(vec![]).with_unresolved_requires_auth(true);
    let config = NavigationConfig {
        max_redirects: 2,
        ..NavigationConfig::default()
    };
    let guard = NavigationGuard::new(config, Session::default(), true, "k1");
    let mut navigator = Navigator::new(&guard, routes);

    assert_matches!(
        navigator.navigate("/anything"),
        Err(GateError::RedirectLoop { hops: 3, .. })
    );
}
