use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    ApiResponse, AppState, Error,
    app_state::lock_connection,
    family::{Family, FamilyCode, UserName, db::join_family},
};

/// The state needed to join a family.
#[derive(Debug, Clone)]
pub struct FamilyState {
    /// The database connection for managing families.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for FamilyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for joining a family.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinFamilyRequest {
    /// The shared code of the family to join or create.
    pub family_code: Option<String>,
    /// The display name of the member joining.
    pub user_name: Option<String>,
}

/// The member that joined, as stored by the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    name: UserName,
    family_code: FamilyCode,
}

/// The response body after joining a family.
#[derive(Debug, Serialize)]
pub struct JoinFamilyResponse {
    user: Member,
    family: Family,
}

/// A route handler for joining a family by code and name.
///
/// Unknown codes create a new family with the caller as the first member.
pub async fn join_family_endpoint(
    State(state): State<FamilyState>,
    body: Result<Json<JoinFamilyRequest>, JsonRejection>,
) -> Response {
    match join(&state, body) {
        Ok(response) => ApiResponse::success(response).into_response(),
        Err(error) => error.into_response(),
    }
}

fn join(
    state: &FamilyState,
    body: Result<Json<JoinFamilyRequest>, JsonRejection>,
) -> Result<JoinFamilyResponse, Error> {
    let Json(request) = body.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;

    let family_code = request
        .family_code
        .ok_or(Error::MissingField("familyCode"))?;
    let user_name = request.user_name.ok_or(Error::MissingField("userName"))?;
    let family_code = FamilyCode::new(&family_code)?;
    let user_name = UserName::new(&user_name)?;

    tracing::info!("{user_name} is joining family {family_code}");

    let connection = lock_connection(&state.db_connection)?;
    let family = join_family(&family_code, &user_name, &connection)?;

    Ok(JoinFamilyResponse {
        user: Member {
            name: user_name,
            family_code,
        },
        family,
    })
}
