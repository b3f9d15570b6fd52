use serde::Deserialize;

/// Request body for `POST /login`.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().is_empty() {
            return Err("username is required");
        }
        if self.password.is_empty() {
            return Err("password is required");
        }
        Ok(())
    }
}
