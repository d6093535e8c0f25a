use usos_auth_proto::constants::uri::{COURSES_USER, USERS_USER};
use usos_auth_proto::constants::{COURSE_FIELDS, USER_FIELDS};
use usos_auth_proto::v1::{Profile, UserCourses, UsosUser};

use crate::{AccessToken, ClientError, UsosClient};

impl UsosClient {
    #[instrument(level = "debug", skip_all)]
    pub async fn usos_user_get(&self, token: &AccessToken) -> Result<UsosUser, ClientError> {
        let mut dest = self.endpoint(USERS_USER)?;
        dest.query_pairs_mut().append_pair("fields", USER_FIELDS);
        self.perform_signed_get_request(dest, token).await
    }

    #[instrument(level = "debug", skip_all)]
    pub async fn usos_user_courses_get(
        &self,
        token: &AccessToken,
    ) -> Result<UserCourses, ClientError> {
        let mut dest = self.endpoint(COURSES_USER)?;
        dest.query_pairs_mut().append_pair("fields", COURSE_FIELDS);
        self.perform_signed_get_request(dest, token).await
    }

    /// The user and every course edition they attend, across all terms.
    #[instrument(level = "debug", skip_all)]
    pub async fn usos_profile_get(&self, token: &AccessToken) -> Result<Profile, ClientError> {
        let user = self.usos_user_get(token).await?;
        let courses = self.usos_user_courses_get(token).await?;
        debug!(usos_id = %user.id, "fetched usos profile");
        Ok(Profile::new(user, courses))
    }
}
