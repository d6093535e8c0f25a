//! USOS API paths, relative to the instance address.

pub const OAUTH_REQUEST_TOKEN: &str = "services/oauth/request_token";
pub const OAUTH_AUTHORIZE: &str = "services/oauth/authorize";
pub const OAUTH_ACCESS_TOKEN: &str = "services/oauth/access_token";

pub const USERS_USER: &str = "services/users/user";
pub const COURSES_USER: &str = "services/courses/user";
