//! In-memory user store
//!
//! Backs local development without Postgres and doubles as the test
//! double for webhook-handler tests. Unlike the relational store there is
//! no unique index, so the email and customer-id uniqueness checks are
//! enforced explicitly.

use async_trait::async_trait;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::{NewUser, PublicUser, User};

use super::{BillingFields, UserStore, UserUpdate};

#[derive(Default)]
pub struct MemoryUserStore {
    data: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user directly, bypassing registration. Test helper.
    pub fn insert(&self, user: User) {
        #[allow(clippy::unwrap_used)]
        self.data.write().unwrap().push(user);
    }

    fn lock_read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<User>>, StoreError> {
        self.data
            .read()
            .map_err(|_| StoreError::Database("user store lock poisoned".to_string()))
    }

    fn lock_write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<User>>, StoreError> {
        self.data
            .write()
            .map_err(|_| StoreError::Database("user store lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut data = self.lock_write()?;
        let email = user.email.to_lowercase();
        if data.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict(format!(
                "email already registered: {}",
                email
            )));
        }
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email,
            password_hash: user.password_hash,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            subscription_status: None,
        };
        data.push(created.clone());
        Ok(created)
    }

    async fn read_all(&self) -> Result<Vec<PublicUser>, StoreError> {
        let data = self.lock_read()?;
        Ok(data.iter().cloned().map(User::into_public).collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = email.to_lowercase();
        let data = self.lock_read()?;
        Ok(data.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let data = self.lock_read()?;
        Ok(data.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, StoreError> {
        let data = self.lock_read()?;
        Ok(data
            .iter()
            .find(|u| u.stripe_customer_id.as_deref() == Some(customer_id))
            .cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        update: UserUpdate,
    ) -> Result<Option<PublicUser>, StoreError> {
        let mut data = self.lock_write()?;
        let Some(user) = data.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email.to_lowercase();
        }
        if let Some(password_hash) = update.password_hash {
            user.password_hash = password_hash;
        }
        Ok(Some(user.clone().into_public()))
    }

    async fn update_billing_fields(
        &self,
        id: Uuid,
        fields: BillingFields,
    ) -> Result<(), StoreError> {
        let mut data = self.lock_write()?;

        if let Some(customer_id) = &fields.stripe_customer_id {
            // Mirror the relational unique index on stripe_customer_id
            if data
                .iter()
                .any(|u| u.id != id && u.stripe_customer_id.as_deref() == Some(customer_id))
            {
                return Err(StoreError::Conflict(format!(
                    "stripe customer already linked: {}",
                    customer_id
                )));
            }
        }

        let Some(user) = data.iter_mut().find(|u| u.id == id) else {
            return Ok(());
        };
        if fields.stripe_customer_id.is_some() {
            user.stripe_customer_id = fields.stripe_customer_id;
        }
        if fields.stripe_subscription_id.is_some() {
            user.stripe_subscription_id = fields.stripe_subscription_id;
        }
        if fields.subscription_status.is_some() {
            user.subscription_status = fields.subscription_status;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::SubscriptionStatus;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@example.com")).await.unwrap();
        let err = store.create(new_user("A@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn billing_update_is_partial() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("a@example.com")).await.unwrap();

        store
            .update_billing_fields(
                user.id,
                BillingFields {
                    stripe_customer_id: Some("cus_1".to_string()),
                    stripe_subscription_id: Some("sub_1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // Status-only update must not disturb the ids
        store
            .update_billing_fields(
                user.id,
                BillingFields {
                    subscription_status: Some(SubscriptionStatus::Active),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let user = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.stripe_customer_id.as_deref(), Some("cus_1"));
        assert_eq!(user.stripe_subscription_id.as_deref(), Some("sub_1"));
        assert_eq!(user.subscription_status, Some(SubscriptionStatus::Active));
    }

    #[tokio::test]
    async fn customer_id_lookup_and_uniqueness() {
        let store = MemoryUserStore::new();
        let a = store.create(new_user("a@example.com")).await.unwrap();
        let b = store.create(new_user("b@example.com")).await.unwrap();

        store
            .update_billing_fields(
                a.id,
                BillingFields {
                    stripe_customer_id: Some("cus_1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let found = store.find_by_stripe_customer_id("cus_1").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(a.id));

        let err = store
            .update_billing_fields(
                b.id,
                BillingFields {
                    stripe_customer_id: Some("cus_1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
