//! User endpoints

use super::{ClientError, PncClient};
use crate::types::{Singleton, User};
use reqwest::Method;

impl PncClient {
    /// The user owning the bearer token of this request
    pub async fn get_authenticated_user(&self) -> Result<User, ClientError> {
        let request = self.request(Method::GET, "/users/loggedUser");
        let user: Singleton<User> = self.execute(request).await?;
        Ok(user.content)
    }
}
