use anyhow::Context;
use serde::Deserialize;

const DEFAULT_TOKEN_TTL: &str = "30d";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => anyhow::bail!("unknown APP_ENV `{other}`"),
        }
    }
}

/// Admin account created at startup when configured.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub admin: Option<AdminSeed>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "portfolio".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "portfolio-users".into()),
            ttl_seconds: parse_ttl(
                &std::env::var("JWT_EXPIRE").unwrap_or_else(|_| DEFAULT_TOKEN_TTL.into()),
            )?,
        };
        let environment = match std::env::var("APP_ENV") {
            Ok(raw) => Environment::parse(&raw)?,
            Err(_) => Environment::Development,
        };
        let admin = match (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminSeed {
                name: std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin User".into()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            jwt,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(3000),
            environment,
            admin,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with("memory://")
    }
}

const MAX_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

/// Parses a token lifetime such as `30d`, `12h`, `45m`, `90s` or a bare
/// number of seconds.
pub fn parse_ttl(raw: &str) -> anyhow::Result<i64> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], c.to_ascii_lowercase()),
        _ => (raw, 's'),
    };
    let amount: i64 = digits
        .parse()
        .with_context(|| format!("invalid token lifetime `{raw}`"))?;
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 60 * 60 * 24,
        other => anyhow::bail!("unknown token lifetime unit `{other}`"),
    };
    anyhow::ensure!(amount > 0, "token lifetime must be positive");
    let seconds = amount
        .checked_mul(multiplier)
        .filter(|s| *s <= MAX_TTL_SECONDS)
        .with_context(|| format!("token lifetime `{raw}` exceeds 10 years"))?;
    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ttl_understands_units() {
        assert_eq!(parse_ttl("30d").unwrap(), 30 * 24 * 3600);
        assert_eq!(parse_ttl("12h").unwrap(), 12 * 3600);
        assert_eq!(parse_ttl("45m").unwrap(), 45 * 60);
        assert_eq!(parse_ttl("90s").unwrap(), 90);
        assert_eq!(parse_ttl("3600").unwrap(), 3600);
        assert_eq!(parse_ttl(" 7D ").unwrap(), 7 * 24 * 3600);
    }

    #[test]
    fn parse_ttl_rejects_garbage() {
        assert!(parse_ttl("").is_err());
        assert!(parse_ttl("abc").is_err());
        assert!(parse_ttl("10w").is_err());
        assert!(parse_ttl("0d").is_err());
        assert!(parse_ttl("3000000d").is_err());
        assert!(parse_ttl("9223372036854775807d").is_err());
        assert!(parse_ttl("3651d").is_err());
        assert_eq!(parse_ttl("3650d").unwrap(), MAX_TTL_SECONDS);
    }

    #[test]
    fn environment_parse() {
        assert_eq!(Environment::parse("production").unwrap(), Environment::Production);
        assert_eq!(Environment::parse("DEV").unwrap(), Environment::Development);
        assert!(Environment::parse("staging").is_err());
    }
}
