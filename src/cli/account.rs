use std::{sync::Arc, time::Duration};

use crate::{
    api::{CallbackState, SignInOutcome},
    cli::{describe, spinner},
    error, info,
    management::Session,
    server, success, warning,
};

const SIGN_IN_TIMEOUT: Duration = Duration::from_secs(120);

/// Signs in through the browser and the local callback server.
pub async fn auth(session: &Session) {
    let Some(url) = session.credentials.sign_in_url() else {
        error!(
            "Cannot build the sign-in URL. Check SPOTIFY_API_AUTH_CLIENT_ID and SPOTIFY_API_REDIRECT_URI."
        )
    };

    let state = CallbackState::new(Arc::clone(&session.credentials));
    let mut outcomes = state.subscribe();
    let addr = session.api.server_addr.clone();
    let mut server = tokio::spawn(async move { server::start_api_server(&addr, state).await });

    if webbrowser::open(url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            url
        )
    }
    info!("Waiting for the sign-in to complete...");

    let outcome = tokio::select! {
        res = &mut server => match res {
            Ok(Err(e)) => error!("{}", e),
            _ => error!("The callback server stopped unexpectedly."),
        },
        res = tokio::time::timeout(SIGN_IN_TIMEOUT, outcomes.wait_for(Option::is_some)) => {
            match res {
                Ok(Ok(outcome)) => (*outcome).clone(),
                _ => None,
            }
        }
    };
    server.abort();

    match outcome {
        Some(SignInOutcome::SignedIn) => success!("Authentication successful!"),
        Some(SignInOutcome::Failed(reason)) => error!("Authentication failed: {}", reason),
        None => error!("Authentication timed out."),
    }
}

pub async fn logout(session: &Session) {
    if !session.credentials.is_signed_in() {
        info!("Not signed in.");
        return;
    }
    session.credentials.sign_out();
    match session.credentials.persist().await {
        Ok(()) => success!("Signed out."),
        Err(e) => error!("Failed to remove the stored credential: {}", e),
    }
}

pub async fn status(session: &Session) {
    let Some(credential) = session.credentials.credential() else {
        info!("Not signed in. Run `spotlite auth` to sign in.");
        return;
    };

    let pb = spinner("Fetching profile...");
    let profile = session.gateway.current_user_profile().await;
    pb.finish_and_clear();

    match profile {
        Ok(profile) => {
            success!(
                "Signed in as {} ({})",
                profile.display_name.as_deref().unwrap_or(&profile.id),
                profile.product.as_deref().unwrap_or("unknown plan")
            );
        }
        Err(e) => warning!("Signed in, but the profile is unavailable: {}", describe(&e)),
    }

    // The credential may have been refreshed by the profile request.
    let expires_at = session
        .credentials
        .credential()
        .unwrap_or(credential)
        .expires_at;
    match expires_at {
        Some(at) => info!("Access token valid until {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => info!("Access token has no recorded expiry"),
    }
}
