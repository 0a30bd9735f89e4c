pub mod dto;
pub mod error;
pub mod jwt;
pub mod service;

pub use dto::{ChangePasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest, TokenPair};
pub use error::AuthServiceError;
pub use jwt::{Claims, JwtError, JwtManager};
pub use service::{AuthService, TokenConfig};
