use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub pagseguro: PagSeguroConfig,
    pub mail: MailConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. Requests without an Origin header are not
    /// subject to the check (covers non-browser callers).
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Shared secret of the auth provider that issues the bearer tokens.
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagSeguroConfig {
    pub token: String,
    #[serde(default = "default_pagseguro_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
    /// Operator mailbox that receives withdrawal requests.
    pub operator_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Minimum deposit and withdrawal, in decimal BRL.
    pub min_deposit: f64,
    pub min_withdrawal: f64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            min_deposit: 10.0,
            min_withdrawal: 20.0,
        }
    }
}

fn default_pagseguro_base_url() -> String {
    "https://pix.api.pagseguro.com".to_string()
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                // File present: parse, then apply env overrides below.
                toml::from_str(&config_str)
                    .map_err(|e| format!("Failed to parse config file: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // No file: build entirely from environment variables.
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and no config.toml was found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                        allowed_origins: parse_origins(get_env("ALLOWED_ORIGINS")),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                    },
                    pagseguro: PagSeguroConfig {
                        token: get_env("PAGSEGURO_TOKEN").unwrap_or_default(),
                        base_url: get_env("PAGSEGURO_BASE_URL")
                            .unwrap_or_else(default_pagseguro_base_url),
                    },
                    mail: MailConfig {
                        smtp_host: get_env("MAIL_HOST")
                            .unwrap_or_else(|| "smtp.gmail.com".to_string()),
                        smtp_username: get_env("MAIL_USER").unwrap_or_default(),
                        smtp_password: get_env("MAIL_PASS").unwrap_or_default(),
                        from_address: get_env("MAIL_FROM")
                            .or_else(|| get_env("MAIL_USER"))
                            .unwrap_or_default(),
                        operator_address: get_env("MAIL_OPERATOR").unwrap_or_default(),
                    },
                    payment: PaymentConfig {
                        min_deposit: get_env_parse("MIN_DEPOSIT", 10.0f64),
                        min_withdrawal: get_env_parse("MIN_WITHDRAWAL", 20.0f64),
                    },
                }
            }
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        // Env overrides, applied even when the file exists.
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("ALLOWED_ORIGINS") {
            config.server.allowed_origins = parse_origins(Some(v));
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("PAGSEGURO_TOKEN") {
            config.pagseguro.token = v;
        }
        if let Ok(v) = env::var("PAGSEGURO_BASE_URL") {
            config.pagseguro.base_url = v;
        }
        if let Ok(v) = env::var("MAIL_HOST") {
            config.mail.smtp_host = v;
        }
        if let Ok(v) = env::var("MAIL_USER") {
            config.mail.smtp_username = v;
        }
        if let Ok(v) = env::var("MAIL_PASS") {
            config.mail.smtp_password = v;
        }
        if let Ok(v) = env::var("MAIL_FROM") {
            config.mail.from_address = v;
        }
        if let Ok(v) = env::var("MAIL_OPERATOR") {
            config.mail.operator_address = v;
        }
        if let Ok(v) = env::var("MIN_DEPOSIT")
            && let Ok(n) = v.parse()
        {
            config.payment.min_deposit = n;
        }
        if let Ok(v) = env::var("MIN_WITHDRAWAL")
            && let Ok(n) = v.parse()
        {
            config.payment.min_withdrawal = n;
        }

        Ok(config)
    }
}

fn parse_origins(raw: Option<String>) -> Vec<String> {
    raw.map(|v| {
        v.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
