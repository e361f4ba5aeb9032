//! Postgres-backed user store

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::{NewUser, PublicUser, User};

use super::{BillingFields, UserStore, UserUpdate};

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let id = Uuid::new_v4();
        let created: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash,
                      stripe_customer_id, stripe_subscription_id, subscription_status
            "#,
        )
        .bind(id)
        .bind(&user.name)
        .bind(user.email.to_lowercase())
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn read_all(&self) -> Result<Vec<PublicUser>, StoreError> {
        let users: Vec<PublicUser> = sqlx::query_as(
            r#"
            SELECT id, name, email,
                   stripe_customer_id, stripe_subscription_id, subscription_status
            FROM users
            ORDER BY email
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, name, email, password_hash,
                   stripe_customer_id, stripe_subscription_id, subscription_status
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, name, email, password_hash,
                   stripe_customer_id, stripe_subscription_id, subscription_status
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, StoreError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, name, email, password_hash,
                   stripe_customer_id, stripe_subscription_id, subscription_status
            FROM users
            WHERE stripe_customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update(
        &self,
        id: Uuid,
        update: UserUpdate,
    ) -> Result<Option<PublicUser>, StoreError> {
        let updated: Option<PublicUser> = sqlx::query_as(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash)
            WHERE id = $1
            RETURNING id, name, email,
                      stripe_customer_id, stripe_subscription_id, subscription_status
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.email.map(|e| e.to_lowercase()))
        .bind(update.password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn update_billing_fields(
        &self,
        id: Uuid,
        fields: BillingFields,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET stripe_customer_id = COALESCE($2, stripe_customer_id),
                stripe_subscription_id = COALESCE($3, stripe_subscription_id),
                subscription_status = COALESCE($4, subscription_status)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(fields.stripe_customer_id)
        .bind(fields.stripe_subscription_id)
        .bind(fields.subscription_status)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
