//! Compact signed token codec (`base64url(header).base64url(payload).base64url(signature)`).
//!
//! Signing and verification go through `jsonwebtoken` with HS256. The expiry check is done here
//! against the injected `Clock` so that a token whose `exp` equals "now" is already expired.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::services::auth::claims::Claims;
use crate::services::auth::signing_key::SigningKey;
use crate::services::clock::Clock;

pub const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
}

impl TokenError {
    /// Short label for logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired",
            Self::Encoding(_) => "encoding",
        }
    }
}

// Untrusted wire shape; only turned into `Claims` after the signature checks out.
#[derive(Debug, Clone, Deserialize)]
struct Payload {
    sub: String,
    iat: i64,
    exp: i64,
    #[serde(default)]
    roles: BTreeSet<String>,
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(key: &SigningKey, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked against `clock` in `decode` (no leeway, `exp == now` is expired).
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            validation,
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        let mut header = Header::new(ALGORITHM);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign access token");
            TokenError::Encoding(e)
        })
    }

    /// Verify the signature, then parse the payload, then check expiry.
    ///
    /// Nothing in the payload is looked at before the signature has been verified.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let signature = split_signature(token)?;
        if URL_SAFE_NO_PAD.decode(signature).is_err() {
            return Err(TokenError::InvalidSignature);
        }

        let data = jsonwebtoken::decode::<Payload>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "token rejected by verifier");
                match e.kind() {
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        TokenError::InvalidSignature
                    }
                    _ => TokenError::Malformed,
                }
            })?;

        let Payload {
            sub,
            iat,
            exp,
            roles,
        } = data.claims;

        let claims = Claims::new(sub, iat, exp, roles).map_err(|e| {
            debug!(error = %e, "signed payload has inconsistent claims");
            TokenError::Malformed
        })?;

        if claims.expires_at() <= self.clock.now() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

// Returns the third segment; header and payload must be present.
fn split_signature(token: &str) -> Result<&str, TokenError> {
    let mut parts = token.splitn(3, '.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature))
            if !header.is_empty() && !payload.is_empty() =>
        {
            if signature.is_empty() {
                Err(TokenError::InvalidSignature)
            } else {
                Ok(signature)
            }
        }
        _ => Err(TokenError::Malformed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::FixedClock;

    const NOW: i64 = 1_700_000_000;
    const SECRET: &str = "test-secret-test-secret-test-secret!!";

    fn codec_at(now: i64) -> (TokenCodec, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(now));
        let key = SigningKey::from_secret(SECRET).unwrap();
        (TokenCodec::new(&key, clock.clone()), clock)
    }

    fn alice(expires_at: i64) -> Claims {
        Claims::new("alice", NOW - 10, expires_at, ["USER"]).unwrap()
    }

    #[test]
    fn decode_returns_what_was_encoded() {
        let (codec, _) = codec_at(NOW);
        let claims = Claims::new("alice", NOW, NOW + 3600, ["USER", "ADMIN"]).unwrap();

        let token = codec.encode(&claims).unwrap();

        assert_eq!(codec.decode(&token).unwrap(), claims);
    }

    #[test]
    fn unprivileged_claims_survive_encoding() {
        let (codec, _) = codec_at(NOW);
        let claims = Claims::new("bob", NOW, NOW + 60, Vec::<String>::new()).unwrap();

        let decoded = codec.decode(&codec.encode(&claims).unwrap()).unwrap();

        assert!(decoded.roles().is_empty());
        assert_eq!(decoded, claims);
    }

    #[test]
    fn encode_is_deterministic() {
        let (codec, _) = codec_at(NOW);
        let claims = alice(NOW + 60);
        assert_eq!(codec.encode(&claims).unwrap(), codec.encode(&claims).unwrap());
    }

    #[test]
    fn token_has_three_segments_and_hs256_header() {
        let (codec, _) = codec_at(NOW);
        let token = codec.encode(&alice(NOW + 60)).unwrap();

        let segments: Vec<&str> = token.split('.').collect();
        assert_eq!(segments.len(), 3);

        let header = URL_SAFE_NO_PAD.decode(segments[0]).unwrap();
        let header: serde_json::Value = serde_json::from_slice(&header).unwrap();
        assert_eq!(header["alg"], "HS256");
        assert_eq!(header["typ"], "JWT");

        let payload = URL_SAFE_NO_PAD.decode(segments[1]).unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(payload["sub"], "alice");
        assert_eq!(payload["roles"], serde_json::json!(["USER"]));
    }

    #[test]
    fn any_single_character_flip_in_signature_is_rejected() {
        let (codec, _) = codec_at(NOW);
        let token = codec.encode(&alice(NOW + 60)).unwrap();
        let sig_start = token.rfind('.').unwrap() + 1;

        for i in sig_start..token.len() {
            let original = token.as_bytes()[i] as char;
            let replacement = ['A', 'B', 'a', '0']
                .into_iter()
                .find(|c| *c != original)
                .unwrap();
            let mut tampered = token.clone();
            tampered.replace_range(i..i + 1, &replacement.to_string());

            assert!(
                matches!(codec.decode(&tampered), Err(TokenError::InvalidSignature)),
                "flip at {i} was accepted"
            );
        }
    }

    #[test]
    fn forged_payload_is_rejected() {
        let (codec, _) = codec_at(NOW);
        let token = codec.encode(&alice(NOW + 60)).unwrap();
        let segments: Vec<&str> = token.split('.').collect();

        let forged = serde_json::json!({
            "sub": "alice", "iat": NOW - 10, "exp": NOW + 60, "roles": ["ADMIN"]
        });
        let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let forged_token = format!("{}.{}.{}", segments[0], forged, segments[2]);

        assert!(matches!(
            codec.decode(&forged_token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn token_from_another_key_is_rejected() {
        let (codec, clock) = codec_at(NOW);
        let other_key = SigningKey::from_secret("another-secret-another-secret-123").unwrap();
        let other = TokenCodec::new(&other_key, clock);

        let token = other.encode(&alice(NOW + 60)).unwrap();

        assert!(matches!(
            codec.decode(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn token_with_foreign_algorithm_is_rejected() {
        let (codec, _) = codec_at(NOW);
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &alice(NOW + 60),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            codec.decode(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn expiry_equal_to_now_is_expired() {
        let (codec, clock) = codec_at(NOW);
        let token = codec.encode(&alice(NOW + 1)).unwrap();

        assert_eq!(codec.decode(&token).unwrap().subject(), "alice");

        clock.advance(1);
        assert!(matches!(codec.decode(&token), Err(TokenError::Expired)));

        clock.advance(100);
        assert!(matches!(codec.decode(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn structurally_broken_tokens_are_malformed() {
        let (codec, _) = codec_at(NOW);
        for token in ["", "not-a-token", "a.b", ".payload.sig", "header..sig"] {
            assert!(
                matches!(codec.decode(token), Err(TokenError::Malformed)),
                "{token:?} was not malformed"
            );
        }
    }

    #[test]
    fn missing_signature_is_invalid_signature() {
        let (codec, _) = codec_at(NOW);
        let token = codec.encode(&alice(NOW + 60)).unwrap();
        let unsigned = &token[..=token.rfind('.').unwrap()];

        assert!(matches!(
            codec.decode(unsigned),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn extra_segment_lands_in_the_signature() {
        let (codec, _) = codec_at(NOW);
        let token = codec.encode(&alice(NOW + 60)).unwrap();

        assert!(matches!(
            codec.decode(&format!("{token}.extra")),
            Err(TokenError::InvalidSignature)
        ));
        assert!(matches!(
            codec.decode("header.payload."),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn signature_character_turned_into_delimiter_is_invalid_signature() {
        let (codec, _) = codec_at(NOW);
        let mut token = codec.encode(&alice(NOW + 60)).unwrap();
        let last = token.len() - 1;
        token.replace_range(last.., ".");

        assert!(matches!(
            codec.decode(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn signed_but_unparseable_payload_is_malformed() {
        let (codec, _) = codec_at(NOW);
        let token = jsonwebtoken::encode(
            &Header::new(ALGORITHM),
            &serde_json::json!({"iat": NOW, "exp": NOW + 60}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(codec.decode(&token), Err(TokenError::Malformed)));
    }

    #[test]
    fn signed_payload_with_exp_before_iat_is_malformed() {
        let (codec, _) = codec_at(NOW);
        let token = jsonwebtoken::encode(
            &Header::new(ALGORITHM),
            &serde_json::json!({"sub": "alice", "iat": NOW + 100, "exp": NOW + 50, "roles": []}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(codec.decode(&token), Err(TokenError::Malformed)));
    }
}
