use axum::{extract::FromRequestParts, http::header};
use chrono::{DateTime, Utc};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    entity::{
        RevokedTokens, Users,
        sea_orm_active_enums::{Role, UserStatus},
    },
    error::AppError,
    services::{auth_service::decode_token, business_gate},
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    pub jti: Uuid,
    pub expires_at: DateTime<Utc>,
}

pub fn ensure_role(user: &AuthUser, role: Role, message: &str) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden(message.to_string()));
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin, "Access denied. Admins only.")
}

/// Callers may act on their own resources; admins on anyone's.
pub fn ensure_self_or_admin(user: &AuthUser, owner_id: Uuid) -> Result<(), AppError> {
    if user.user_id == owner_id || user.role == Role::Admin {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "You may only manage your own resources.".into(),
    ))
}

fn bearer_token(parts: &axum::http::request::Parts) -> Result<&str, AppError> {
    let auth_str = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AppError::Unauthorized)?
        .to_str()
        .map_err(|_| AppError::Unauthorized)?;

    auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims =
            decode_token(&state.config.jwt_secret, token).map_err(|_| AppError::Unauthorized)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
        let jti = Uuid::parse_str(&claims.jti).map_err(|_| AppError::Unauthorized)?;

        if RevokedTokens::find_by_id(jti).one(&state.orm).await?.is_some() {
            return Err(AppError::Unauthorized);
        }

        // role and status come from the row, not the token, so bans apply immediately
        let user = Users::find_by_id(user_id)
            .one(&state.orm)
            .await?
            .ok_or(AppError::Unauthorized)?;
        if user.status == UserStatus::Banned {
            return Err(AppError::Forbidden("Your account has been banned.".into()));
        }

        let expires_at =
            DateTime::<Utc>::from_timestamp(claims.exp as i64, 0).unwrap_or_else(Utc::now);

        Ok(AuthUser {
            user_id,
            role: user.role,
            jti,
            expires_at,
        })
    }
}

/// A business account that passed the subscription gate.
#[derive(Debug, Clone)]
pub struct BusinessUser(pub AuthUser);

impl FromRequestParts<AppState> for BusinessUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        business_gate::authorize(&state.orm, &user, Utc::now()).await?;
        Ok(BusinessUser(user))
    }
}

#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        ensure_admin(&user)?;
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header_value: Option<&str>) -> axum::http::request::Parts {
        let mut builder = Request::builder().uri("/api/me");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_token_requires_scheme_and_value() {
        assert!(matches!(bearer_token(&parts_with(None)), Err(AppError::Unauthorized)));
        assert!(matches!(
            bearer_token(&parts_with(Some("Basic abc"))),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            bearer_token(&parts_with(Some("Bearer   "))),
            Err(AppError::Unauthorized)
        ));
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))).unwrap(), "abc.def");
    }

    #[test]
    fn self_or_admin_guard() {
        let owner = Uuid::new_v4();
        let user = AuthUser {
            user_id: owner,
            role: Role::Normal,
            jti: Uuid::new_v4(),
            expires_at: Utc::now(),
        };
        assert!(ensure_self_or_admin(&user, owner).is_ok());
        assert!(ensure_self_or_admin(&user, Uuid::new_v4()).is_err());

        let admin = AuthUser {
            role: Role::Admin,
            ..user
        };
        assert!(ensure_self_or_admin(&admin, Uuid::new_v4()).is_ok());
        assert!(ensure_admin(&admin).is_ok());
    }
}
