//! MySQL implementation of the AccountDirectory trait.
//!
//! Reads `users` and `user_authorities`; the only write is the status
//! change used to suspend an account after a security incident.

use async_trait::async_trait;
use sqlx::{MySqlPool, Row};
use std::collections::BTreeSet;
use uuid::Uuid;

use mk_core::domain::entities::account::{Account, AccountStatus, Authority};
use mk_core::errors::DomainError;
use mk_core::repositories::AccountDirectory;

/// MySQL implementation of AccountDirectory
pub struct MySqlAccountDirectory {
    pool: MySqlPool,
}

impl MySqlAccountDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn authorities_of(&self, owner_id: Uuid) -> Result<BTreeSet<Authority>, DomainError> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT authority FROM user_authorities WHERE user_id = ?")
                .bind(owner_id.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| DomainError::Internal {
                    message: format!("Failed to load authorities: {}", e),
                })?;

        let mut authorities = BTreeSet::new();
        for name in names {
            match name.parse::<Authority>() {
                Ok(authority) => {
                    authorities.insert(authority);
                }
                Err(_) => {
                    tracing::warn!(
                        owner_id = %owner_id,
                        authority = %name,
                        "Skipping unknown authority"
                    )
                }
            }
        }
        Ok(authorities)
    }
}

#[async_trait]
impl AccountDirectory for MySqlAccountDirectory {
    async fn find_by_id(&self, owner_id: Uuid) -> Result<Option<Account>, DomainError> {
        let row = sqlx::query("SELECT email, status FROM users WHERE id = ? LIMIT 1")
            .bind(owner_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to find account: {}", e),
            })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let email: String = row.try_get("email").map_err(|e| DomainError::Internal {
            message: format!("Failed to get email: {}", e),
        })?;
        let status: String = row.try_get("status").map_err(|e| DomainError::Internal {
            message: format!("Failed to get status: {}", e),
        })?;
        let status = status
            .parse::<AccountStatus>()
            .map_err(|message| DomainError::Internal { message })?;

        Ok(Some(Account {
            id: owner_id,
            email,
            status,
            authorities: self.authorities_of(owner_id).await?,
        }))
    }

    async fn change_status(
        &self,
        owner_id: Uuid,
        status: AccountStatus,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query("UPDATE users SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(owner_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to update account status: {}", e),
            })?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // MySQL reports zero affected rows when the value is unchanged
        let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(owner_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to check account existence: {}", e),
            })?;

        Ok(exists != 0)
    }
}
