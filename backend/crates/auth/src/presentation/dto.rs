//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::application::handshake::CallbackParams;
use crate::domain::entity::session::SessionState;

/// Query string on `GET /auth/{provider}/callback`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl From<CallbackQuery> for CallbackParams {
    fn from(query: CallbackQuery) -> Self {
        Self {
            code: query.code,
            state: query.state,
            error: query.error,
            error_description: query.error_description,
        }
    }
}

/// Session status response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub user_id: Option<String>,
}

impl From<SessionState> for SessionStatusResponse {
    fn from(session: SessionState) -> Self {
        Self {
            authenticated: session.is_authenticated(),
            user_id: session.user_id().map(|id| id.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_id::UserId;

    #[test]
    fn test_session_status_json() {
        let user_id = UserId::new();
        let json = serde_json::to_value(SessionStatusResponse::from(
            SessionState::authenticated(user_id),
        ))
        .unwrap();
        assert_eq!(json["authenticated"], true);
        assert_eq!(json["userId"], user_id.to_string());

        let json =
            serde_json::to_value(SessionStatusResponse::from(SessionState::anonymous())).unwrap();
        assert_eq!(json["authenticated"], false);
        assert!(json["userId"].is_null());
    }
}
