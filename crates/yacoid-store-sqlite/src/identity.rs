//! Token-based [`IdentityProvider`] over the `users` table.
//!
//! Tokens are opaque random strings handed out when a user is added; there
//! is no login flow here.

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;
use yacoid_core::identity::{Identity, IdentityProvider, User};

use crate::{
  Result, SqliteStore,
  encode::{RawUser, encode_dt, encode_uuid},
};

impl SqliteStore {
  /// Register a user and return it together with its freshly minted auth
  /// token.
  pub async fn add_user(&self, name: &str, is_admin: bool) -> Result<(User, String)> {
    let user = User {
      user_id: Uuid::new_v4(),
      name: name.trim().to_owned(),
      is_admin,
      created_at: Utc::now(),
    };
    let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());

    let id_str = encode_uuid(user.user_id);
    let at_str = encode_dt(user.created_at);
    let name = user.name.clone();
    let token_str = token.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, name, is_admin, auth_token, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, is_admin, token_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(user_id = %user.user_id, is_admin, "user added");
    Ok((user, token))
  }

  /// Look up the user holding `token`.
  pub async fn user_by_token(&self, token: &str) -> Result<Option<User>> {
    let token = token.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, name, is_admin, created_at FROM users WHERE auth_token = ?1",
              rusqlite::params![token],
              |row| {
                Ok(RawUser {
                  user_id:    row.get(0)?,
                  name:       row.get(1)?,
                  is_admin:   row.get(2)?,
                  created_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }
}

impl IdentityProvider for SqliteStore {
  type Error = crate::Error;

  async fn resolve(&self, token: &str) -> Result<Option<Identity>> {
    Ok(self.user_by_token(token).await?.map(|u| u.identity()))
  }
}
