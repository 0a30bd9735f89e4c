pub mod cookies;
pub mod middleware;
pub mod request_id;

pub use cookies::{token_from_jar, CookieSettings, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use middleware::{auth_middleware, AuthUser};
pub use request_id::{request_id_middleware, RequestId};
