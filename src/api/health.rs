use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::{
    api::CallbackState,
    management::{PreferenceStore, TokenEndpoint},
};

pub async fn health<S, E>(Extension(state): Extension<CallbackState<S, E>>) -> Json<Value>
where
    S: PreferenceStore + 'static,
    E: TokenEndpoint + 'static,
{
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "signed_in": state.credentials.is_signed_in(),
    }))
}
