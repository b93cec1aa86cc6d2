use reqwest::Method;

use super::{CloudApi, to_body};
use crate::error::Result;
use crate::query::QueryParams;
use crate::types::{
    CreatePolicyOptions, CreateRoleOptions, CreateUserOptions, Policy, Role, User,
};

impl CloudApi {
    /// `GET /:account/users`.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.get_json(&self.path(&["users"]), QueryParams::new()).await
    }

    /// `GET /:account/users/:login-or-id`, with role membership when asked.
    pub async fn get_user(&self, login_or_id: &str, membership: bool) -> Result<User> {
        let mut q = QueryParams::new();
        if membership {
            q.insert("membership", "true");
        }
        self.get_json(&self.path(&["users", login_or_id]), q).await
    }

    /// `POST /:account/users`.
    pub async fn create_user(&self, options: &CreateUserOptions) -> Result<User> {
        self.send_json(
            Method::POST,
            &self.path(&["users"]),
            QueryParams::new(),
            Some(to_body(options)?),
        )
        .await
    }

    /// `POST /:account/users/:id`.
    pub async fn update_user(&self, id: &str, options: &CreateUserOptions) -> Result<User> {
        self.send_json(
            Method::POST,
            &self.path(&["users", id]),
            QueryParams::new(),
            Some(to_body(options)?),
        )
        .await
    }

    /// `DELETE /:account/users/:id`.
    pub async fn delete_user(&self, id: &str) -> Result<()> {
        self.send_empty(Method::DELETE, &self.path(&["users", id]), QueryParams::new(), None)
            .await
    }

    /// `GET /:account/roles`.
    pub async fn list_roles(&self) -> Result<Vec<Role>> {
        self.get_json(&self.path(&["roles"]), QueryParams::new()).await
    }

    /// `GET /:account/roles/:name-or-id`.
    pub async fn get_role(&self, name_or_id: &str) -> Result<Role> {
        self.get_json(&self.path(&["roles", name_or_id]), QueryParams::new())
            .await
    }

    /// `POST /:account/roles`.
    pub async fn create_role(&self, options: &CreateRoleOptions) -> Result<Role> {
        self.send_json(
            Method::POST,
            &self.path(&["roles"]),
            QueryParams::new(),
            Some(to_body(options)?),
        )
        .await
    }

    /// `POST /:account/roles/:id`.
    pub async fn update_role(&self, id: &str, options: &CreateRoleOptions) -> Result<Role> {
        self.send_json(
            Method::POST,
            &self.path(&["roles", id]),
            QueryParams::new(),
            Some(to_body(options)?),
        )
        .await
    }

    /// `DELETE /:account/roles/:id`.
    pub async fn delete_role(&self, id: &str) -> Result<()> {
        self.send_empty(Method::DELETE, &self.path(&["roles", id]), QueryParams::new(), None)
            .await
    }

    /// `GET /:account/policies`.
    pub async fn list_policies(&self) -> Result<Vec<Policy>> {
        self.get_json(&self.path(&["policies"]), QueryParams::new()).await
    }

    /// `GET /:account/policies/:name-or-id`.
    pub async fn get_policy(&self, name_or_id: &str) -> Result<Policy> {
        self.get_json(&self.path(&["policies", name_or_id]), QueryParams::new())
            .await
    }

    /// `POST /:account/policies`.
    pub async fn create_policy(&self, options: &CreatePolicyOptions) -> Result<Policy> {
        self.send_json(
            Method::POST,
            &self.path(&["policies"]),
            QueryParams::new(),
            Some(to_body(options)?),
        )
        .await
    }

    /// `POST /:account/policies/:id`.
    pub async fn update_policy(&self, id: &str, options: &CreatePolicyOptions) -> Result<Policy> {
        self.send_json(
            Method::POST,
            &self.path(&["policies", id]),
            QueryParams::new(),
            Some(to_body(options)?),
        )
        .await
    }

    /// `DELETE /:account/policies/:id`.
    pub async fn delete_policy(&self, id: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &self.path(&["policies", id]),
            QueryParams::new(),
            None,
        )
        .await
    }
}
