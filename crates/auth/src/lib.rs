//! `trafo-auth` — authentication boundary.
//!
//! Two directions, both decoupled from HTTP frameworks:
//! - incoming: bearer tokens are decoded and their claims validated,
//! - outgoing: header sets are acquired for calls to the runtime and to callback URLs.

pub mod claims;
pub mod jwt;
pub mod outgoing;
pub mod principal;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator, encode_hs256};
pub use outgoing::{
    AuthHeaderProvider, AuthHeaders, NoAuthHeaders, ServiceAuthenticationError, ServiceTokenMinter,
    StaticBearerToken,
};
pub use principal::PrincipalId;
