//! Access-token validation for identities issued by the authentication service.

pub mod jwt;
