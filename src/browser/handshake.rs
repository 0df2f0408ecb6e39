// src/browser/handshake.rs
//! Handshake's multi-screen login: email, "continue with email", password.
//! Screens vary between accounts, so every step is optional.

use super::session::{try_step, BrowserSession, Target};
use super::FlowTimings;
use crate::config::Credentials;
use std::time::Duration;
use tracing::{info, warn};

const EMAIL_INPUT: &str = "input[type='email']";
const CONTINUE_LINK: &str = "a[href*='requested_authentication_method=standard']";
const PASSWORD_INPUT: &str = "input[type='password']";
const NEXT_BUTTON: &str = "Next";
const LOGIN_BUTTON: &str = "Log in";

const JOB_CONTENT: &str =
    "main [data-test='jobs-show'], main .jobs-show, h1, .job-title, [data-test='job-title']";

const SELECTOR_TIMEOUT: Duration = Duration::from_secs(15);
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(10);
const STEP_TIMEOUT: Duration = Duration::from_secs(5);
const BODY_AFTER_LOGIN: Duration = Duration::from_secs(4);
const SETTLE_AFTER_LOGIN: Duration = Duration::from_millis(500);
const RETURN_RACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    AwaitingEmail,
    AwaitingContinue,
    AwaitingPassword,
    Authenticated,
    Unauthenticated,
}

impl HandshakeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Authenticated | Self::Unauthenticated)
    }
}

/// Elements found on the current screen. Only the ones relevant to the
/// current state are probed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandshakeSignals {
    pub email_input: bool,
    pub next_button: bool,
    pub continue_link: bool,
    pub login_button: bool,
    pub password_input: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeAction {
    SubmitEmail { click_next: bool },
    FollowContinueLink,
    DirectLogin,
    SubmitPassword { click_login: bool },
    Skip,
}

pub fn transition(
    state: HandshakeState,
    signals: &HandshakeSignals,
) -> (HandshakeAction, HandshakeState) {
    use HandshakeAction as A;
    use HandshakeState as S;

    match state {
        S::AwaitingEmail if signals.email_input => (
            A::SubmitEmail {
                click_next: signals.next_button,
            },
            S::AwaitingContinue,
        ),
        S::AwaitingEmail => (A::Skip, S::AwaitingContinue),
        S::AwaitingContinue if signals.continue_link => (A::FollowContinueLink, S::AwaitingPassword),
        S::AwaitingContinue if signals.login_button => (A::DirectLogin, S::AwaitingPassword),
        S::AwaitingContinue => (A::Skip, S::AwaitingPassword),
        S::AwaitingPassword if signals.password_input && signals.login_button => (
            A::SubmitPassword { click_login: true },
            S::Authenticated,
        ),
        S::AwaitingPassword if signals.password_input => (
            A::SubmitPassword { click_login: false },
            S::Unauthenticated,
        ),
        S::AwaitingPassword => (A::Skip, S::Unauthenticated),
        terminal => (A::Skip, terminal),
    }
}

/// Drive the login screens, return to `target` if login did not land there,
/// and give the job content a moment to render.
pub async fn run(
    session: &mut dyn BrowserSession,
    target: &str,
    credentials: Option<&Credentials>,
    timings: &FlowTimings,
) -> HandshakeState {
    let state = match credentials {
        Some(credentials) => log_in(session, credentials).await,
        None => {
            warn!("Handshake credentials not configured; skipping login");
            HandshakeState::Unauthenticated
        }
    };

    if state != HandshakeState::Authenticated
        && session.current_url().await.as_deref() != Some(target)
    {
        info!("Handshake: returning to {}", target);
        let returned =
            tokio::time::timeout(RETURN_RACE, session.navigate(target, RETURN_RACE)).await;
        if !matches!(returned, Ok(Ok(()))) {
            warn!("Handshake: return to job did not finish within {:?}. Continuing...", RETURN_RACE);
        }
    }

    wait_for_job_content(session, timings).await;
    state
}

async fn log_in(session: &mut dyn BrowserSession, credentials: &Credentials) -> HandshakeState {
    let mut state = HandshakeState::AwaitingEmail;

    while !state.is_terminal() {
        let signals = observe(session, state).await;
        let (action, next) = transition(state, &signals);
        perform(session, state, action, credentials).await;
        state = next;
    }

    info!("Handshake login finished: {:?}", state);
    state
}

async fn observe(session: &mut dyn BrowserSession, state: HandshakeState) -> HandshakeSignals {
    let mut signals = HandshakeSignals::default();

    match state {
        HandshakeState::AwaitingEmail => {
            signals.email_input = try_step(
                "Handshake: email input",
                SELECTOR_TIMEOUT,
                session.wait_for(Target::Css(EMAIL_INPUT), false, SELECTOR_TIMEOUT),
            )
            .await;
            if signals.email_input {
                signals.next_button = session.exists(Target::ButtonText(NEXT_BUTTON)).await;
            }
        }
        HandshakeState::AwaitingContinue => {
            signals.continue_link = try_step(
                "Handshake: 'Continue with email' link",
                SELECTOR_TIMEOUT,
                session.wait_for(Target::Css(CONTINUE_LINK), true, SELECTOR_TIMEOUT),
            )
            .await;
            if !signals.continue_link {
                signals.login_button = session.exists(Target::ButtonText(LOGIN_BUTTON)).await;
            }
        }
        HandshakeState::AwaitingPassword => {
            signals.password_input = try_step(
                "Handshake: password input",
                SELECTOR_TIMEOUT,
                session.wait_for(Target::Css(PASSWORD_INPUT), false, SELECTOR_TIMEOUT),
            )
            .await;
            if signals.password_input {
                signals.login_button = session.exists(Target::ButtonText(LOGIN_BUTTON)).await;
            }
        }
        HandshakeState::Authenticated | HandshakeState::Unauthenticated => {}
    }

    signals
}

async fn perform(
    session: &mut dyn BrowserSession,
    state: HandshakeState,
    action: HandshakeAction,
    credentials: &Credentials,
) {
    match action {
        HandshakeAction::SubmitEmail { click_next } => {
            try_step(
                "Handshake: email",
                STEP_TIMEOUT,
                session.type_text(EMAIL_INPUT, &credentials.email),
            )
            .await;
            if click_next {
                click_and_wait(session, Target::ButtonText(NEXT_BUTTON), "email Next").await;
            } else {
                warn!("Handshake: Could not find 'Next' button after typing email.");
            }
        }
        HandshakeAction::FollowContinueLink => {
            click_and_wait(session, Target::Css(CONTINUE_LINK), "'Continue with email'").await;
        }
        HandshakeAction::DirectLogin => {
            click_and_wait(session, Target::ButtonText(LOGIN_BUTTON), "direct Log in").await;
        }
        HandshakeAction::SubmitPassword { click_login } => {
            try_step(
                "Handshake: password",
                STEP_TIMEOUT,
                session.type_text(PASSWORD_INPUT, &credentials.password),
            )
            .await;
            if click_login {
                click_and_wait(session, Target::ButtonText(LOGIN_BUTTON), "Login").await;
                // Modal logins never navigate
                try_step(
                    "Handshake: body after login",
                    BODY_AFTER_LOGIN,
                    session.wait_for(Target::Css("body"), false, BODY_AFTER_LOGIN),
                )
                .await;
                tokio::time::sleep(SETTLE_AFTER_LOGIN).await;
            } else {
                warn!("Handshake: Could not find 'Log in' button.");
            }
        }
        HandshakeAction::Skip => match state {
            HandshakeState::AwaitingEmail => warn!(
                "Handshake: Email input field not found. Assuming already past email step or different flow."
            ),
            HandshakeState::AwaitingContinue => {
                warn!("Handshake: Could not find 'Continue with email' link or it was not visible.")
            }
            HandshakeState::AwaitingPassword => warn!(
                "Handshake: Password input field not found. Assuming login not required or different flow."
            ),
            _ => {}
        },
    }
}

async fn click_and_wait(session: &mut dyn BrowserSession, target: Target<'_>, what: &str) {
    if try_step(&format!("Handshake: click {}", what), STEP_TIMEOUT, session.click(target)).await {
        try_step(
            &format!("Handshake: No nav after {}", what),
            NAVIGATION_TIMEOUT,
            session.wait_for_navigation(NAVIGATION_TIMEOUT),
        )
        .await;
    }
}

/// Wait briefly for job-content indicators, falling back to `body`, then
/// let the page settle.
pub async fn wait_for_job_content(session: &mut dyn BrowserSession, timings: &FlowTimings) {
    let has_content = try_step(
        "Job content",
        timings.content_selector,
        session.wait_for(Target::Css(JOB_CONTENT), false, timings.content_selector),
    )
    .await;

    if !has_content {
        try_step(
            "Page body",
            timings.content_body,
            session.wait_for(Target::Css("body"), false, timings.content_body),
        )
        .await;
    }

    tokio::time::sleep(timings.content_settle).await;
}
