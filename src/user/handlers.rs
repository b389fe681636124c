use axum::{
    extract::{rejection::FormRejection, State},
    Form,
};
use tracing::{info, instrument};

use crate::session::CredentialsForm;
use crate::shared::{AppError, AppState};

/// HTTP handler for registering a new user
///
/// POST /create (form: username, password)
#[instrument(name = "create_user", skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> Result<&'static str, AppError> {
    let form = CredentialsForm::or_empty(form);
    let user = state
        .credentials
        .register(&form.username, &form.password)
        .await?;

    info!(user_id = user.id, username = %user.username, "User created successfully");
    Ok("User created")
}
