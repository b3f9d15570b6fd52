pub mod claims;
pub mod codec;
pub mod credentials;
pub mod signing_key;
pub mod token_issuer;

pub use claims::Claims;
pub use codec::{TokenCodec, TokenError};
pub use credentials::{
    AuthenticatedPrincipal, CredentialAuthenticator, CredentialError, InMemoryCredentialStore,
    UserSeed,
};
pub use signing_key::SigningKey;
pub use token_issuer::{IssueError, IssuedToken, TokenIssuer};
