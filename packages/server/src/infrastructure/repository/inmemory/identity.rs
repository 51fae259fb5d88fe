//! InMemory Identity Store 実装
//!
//! ドメイン層が定義する IdentityStore trait の具体的な実装。
//! ユーザーとグループを HashMap に保持します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Email, Group, GroupId, IdentityStore, RepositoryError, User, UserId};

/// インメモリ Identity Store 実装
#[derive(Default)]
pub struct InMemoryIdentityStore {
    users: RwLock<HashMap<UserId, User>>,
    groups: RwLock<HashMap<GroupId, Group>>,
}

impl InMemoryIdentityStore {
    /// 新しい InMemoryIdentityStore を作成
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_name(mut groups: Vec<Group>) -> Vec<Group> {
    groups.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    groups
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn get_user(&self, id: &UserId) -> Result<User, RepositoryError> {
        let users = self.users.read().await;
        users
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<User, RepositoryError> {
        let users = self.users.read().await;
        users
            .values()
            .find(|user| &user.email == email)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("user with e-mail {email}")))
    }

    async fn insert_user(&self, user: User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(RepositoryError::Conflict(format!(
                "e-mail {} already registered",
                user.email
            )));
        }
        if users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict(format!("user {} exists", user.id)));
        }
        users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn update_user(&self, user: User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound(format!("user {}", user.id)));
        }
        if users
            .values()
            .any(|existing| existing.id != user.id && existing.email == user.email)
        {
            return Err(RepositoryError::Conflict(format!(
                "e-mail {} already registered",
                user.email
            )));
        }
        users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        if users.remove(id).is_none() {
            return Err(RepositoryError::NotFound(format!("user {id}")));
        }
        // ユーザーを消してからメンバー一覧を掃除する（ロック順: users → groups）
        let mut groups = self.groups.write().await;
        for group in groups.values_mut() {
            group.remove_member(id);
        }
        Ok(())
    }

    async fn get_group(&self, id: &GroupId) -> Result<Group, RepositoryError> {
        let groups = self.groups.read().await;
        groups
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("group {id}")))
    }

    async fn insert_group(&self, group: Group) -> Result<(), RepositoryError> {
        let mut groups = self.groups.write().await;
        if groups.contains_key(&group.id) {
            return Err(RepositoryError::Conflict(format!("group {} exists", group.id)));
        }
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, RepositoryError> {
        let groups = self.groups.read().await;
        Ok(sorted_by_name(groups.values().cloned().collect()))
    }

    async fn list_groups_for_member(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Group>, RepositoryError> {
        let groups = self.groups.read().await;
        Ok(sorted_by_name(
            groups
                .values()
                .filter(|group| group.is_member(user_id))
                .cloned()
                .collect(),
        ))
    }

    async fn add_member(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<bool, RepositoryError> {
        let mut groups = self.groups.write().await;
        let group = groups
            .get_mut(group_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("group {group_id}")))?;
        Ok(group.add_member(user_id.clone()))
    }
}
