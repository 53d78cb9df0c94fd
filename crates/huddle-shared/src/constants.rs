/// Application name
pub const APP_NAME: &str = "Huddle";

/// REST API version prefix appended to the server URL
pub const DEFAULT_API_VERSION: &str = "/api/v4";

/// Number of posts requested per page
pub const POST_CHUNK_SIZE: u32 = 60;

/// Default page size for paged listings (jobs, emoji, profiles)
pub const PAGE_SIZE_DEFAULT: u32 = 60;

/// Maximum number of sent messages kept for up/down-arrow recall
pub const MAX_PREV_MSGS: usize = 100;

/// HTTP header names
pub const HEADER_AUTH: &str = "Authorization";
pub const HEADER_BEARER: &str = "BEARER";
pub const HEADER_REQUESTED_WITH: &str = "X-Requested-With";
pub const HEADER_TOKEN: &str = "Token";
pub const HEADER_X_VERSION_ID: &str = "X-Version-Id";
pub const HEADER_USER_AGENT: &str = "User-Agent";
pub const HEADER_ACCEPT_LANGUAGE: &str = "Accept-Language";

/// Intl id used when the server answers with a body that is not JSON
pub const INTL_INVALID_RESPONSE: &str = "mobile.request.invalid_response";
pub const INTL_INVALID_RESPONSE_DEFAULT: &str = "Received invalid response from the server.";
