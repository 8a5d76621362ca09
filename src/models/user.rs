//! Authenticated principal and member roles

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Member role as stored by the hosted auth platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    AdminPrincipal,
    AdminSecondaire,
    Redacteur,
    Membre,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::AdminPrincipal => "admin_principal",
            Role::AdminSecondaire => "admin_secondaire",
            Role::Redacteur => "redacteur",
            Role::Membre => "membre",
        }
    }

    /// Either of the two administrator roles
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::AdminPrincipal | Role::AdminSecondaire)
    }

    pub fn is_editor(&self) -> bool {
        *self == Role::Redacteur
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin_principal" => Ok(Role::AdminPrincipal),
            "admin_secondaire" => Ok(Role::AdminSecondaire),
            "redacteur" => Ok(Role::Redacteur),
            "membre" => Ok(Role::Membre),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Role::Membre)
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or(Role::Membre)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// JWT claims of an authenticated member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// Member id on the auth platform
    pub sub: String,
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Dashboard read access (editors and administrators)
    pub fn require_read_popups(&self) -> Result<(), AppError> {
        if self.role.is_admin() || self.role.is_editor() {
            Ok(())
        } else {
            Err(AppError::Authorization("Insufficient rights to read popups".to_string()))
        }
    }

    pub fn require_write_popups(&self) -> Result<(), AppError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }
}
