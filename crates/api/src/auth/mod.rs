//! Authentication module for Memberly

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, JwtError, JwtManager, TokenType};
pub use middleware::{require_auth, AuthUser};
pub use password::{hash_password, verify_password};
