pub mod auth_service;
pub mod auth_service_impl;
pub mod provisioning;
pub mod rate_limit;
pub mod token;

pub use auth_service::{AdminInfo, AuthError, AuthService, LoginOutcome, ResolvedSession, Role};
pub use auth_service_impl::SeaOrmAuthService;
pub use provisioning::{ProvisioningService, RegisterVillageRequest, RegisteredVillage};
pub use rate_limit::RateLimiter;
pub use token::{Claims, TokenCodec, TokenError};
