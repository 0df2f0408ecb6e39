// src/browser/linkedin.rs
//! LinkedIn login gate. Checked on every rendered page, since LinkedIn links
//! may redirect through a login wall from anywhere.

use super::session::{try_step, BrowserSession, Target};
use crate::config::Credentials;
use std::time::Duration;
use tracing::{info, warn};

const LOGIN_URL_MARKER: &str = "linkedin.com/login";
const SESSION_PASSWORD: &str = "input#session_password";
const USERNAME_INPUT: &str = "#username";
const PASSWORD_INPUT: &str = "#password";
const SUBMIT_BUTTON: &str = "button[type='submit']";

const STEP_TIMEOUT: Duration = Duration::from_secs(5);
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(9);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkedInState {
    CheckingGate,
    ReturningToTarget,
    Done,
}

/// What the driver observed on the page before a transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkedInSignals {
    pub on_login_page: bool,
    pub has_credentials: bool,
    pub at_target: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkedInAction {
    SubmitCredentials,
    ReturnToTarget,
    Skip,
}

pub fn transition(state: LinkedInState, signals: &LinkedInSignals) -> (LinkedInAction, LinkedInState) {
    match state {
        LinkedInState::CheckingGate if signals.on_login_page && signals.has_credentials => {
            (LinkedInAction::SubmitCredentials, LinkedInState::ReturningToTarget)
        }
        LinkedInState::ReturningToTarget if !signals.at_target => {
            (LinkedInAction::ReturnToTarget, LinkedInState::Done)
        }
        _ => (LinkedInAction::Skip, LinkedInState::Done),
    }
}

/// Log in if the page is a LinkedIn login gate, then go back to `target`.
pub async fn run(
    session: &mut dyn BrowserSession,
    target: &str,
    credentials: Option<&Credentials>,
) -> LinkedInState {
    let mut state = LinkedInState::CheckingGate;

    while state != LinkedInState::Done {
        let signals = observe(session, state, target, credentials.is_some()).await;
        let (action, next) = transition(state, &signals);

        match (action, credentials) {
            (LinkedInAction::SubmitCredentials, Some(credentials)) => {
                submit_credentials(session, credentials).await
            }
            (LinkedInAction::ReturnToTarget, _) => {
                info!("LinkedIn: returning to {}", target);
                try_step(
                    "LinkedIn: return to job",
                    NAVIGATION_TIMEOUT,
                    session.navigate(target, NAVIGATION_TIMEOUT),
                )
                .await;
            }
            _ => {
                if state == LinkedInState::CheckingGate && signals.on_login_page {
                    warn!("LinkedIn login wall detected but no credentials configured; skipping login");
                }
            }
        }

        state = next;
    }

    state
}

async fn observe(
    session: &mut dyn BrowserSession,
    state: LinkedInState,
    target: &str,
    has_credentials: bool,
) -> LinkedInSignals {
    match state {
        LinkedInState::CheckingGate => {
            let url = session.current_url().await.unwrap_or_default();
            let on_login_page = url.contains(LOGIN_URL_MARKER)
                || session.exists(Target::Css(SESSION_PASSWORD)).await;
            LinkedInSignals {
                on_login_page,
                has_credentials,
                at_target: false,
            }
        }
        LinkedInState::ReturningToTarget => LinkedInSignals {
            at_target: session.current_url().await.as_deref() == Some(target),
            ..LinkedInSignals::default()
        },
        LinkedInState::Done => LinkedInSignals::default(),
    }
}

async fn submit_credentials(session: &mut dyn BrowserSession, credentials: &Credentials) {
    info!("LinkedIn login wall detected, signing in");

    try_step(
        "LinkedIn: username",
        STEP_TIMEOUT,
        session.type_text(USERNAME_INPUT, &credentials.email),
    )
    .await;
    try_step(
        "LinkedIn: password",
        STEP_TIMEOUT,
        session.type_text(PASSWORD_INPUT, &credentials.password),
    )
    .await;

    if try_step(
        "LinkedIn: submit",
        STEP_TIMEOUT,
        session.click(Target::Css(SUBMIT_BUTTON)),
    )
    .await
    {
        try_step(
            "LinkedIn: no navigation after login",
            NAVIGATION_TIMEOUT,
            session.wait_for_navigation(NAVIGATION_TIMEOUT),
        )
        .await;
    }
}
