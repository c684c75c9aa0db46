//! Build record endpoints

use super::{ClientError, PncClient};
use crate::types::{BuildRecord, Page, PageQuery};
use reqwest::Method;

impl PncClient {
    /// List the build records started by `user_id`.
    ///
    /// Paging, search and sort are applied by the server.
    pub async fn get_build_records_by_user(
        &self,
        user_id: i64,
        query: &PageQuery,
    ) -> Result<Page<BuildRecord>, ClientError> {
        let request = self
            .request(Method::GET, &format!("/users/{user_id}/build-records"))
            .query(&query.to_params());

        Ok(self
            .execute_optional(request)
            .await?
            .unwrap_or_else(|| Page::empty(query)))
    }
}
