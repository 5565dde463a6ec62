use crate::domain::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub commission: CommissionConfig,
}

/// Commission parameters captured once at startup.
///
/// The calculator receives this struct by value; calculation logic never
/// reads process environment.
#[derive(Debug, Clone, Copy)]
pub struct CommissionConfig {
    /// Global affiliate payout model. Agents are always revenue-share.
    pub affiliate_model: CommissionModel,
    /// Fixed payout per first-time deposit under the CPA model.
    pub affiliate_cpa_ftd: Decimal,
    /// Affiliate share of each deposit under the REVSHARE model, in [0, 1].
    pub affiliate_revshare_pct: Decimal,
    /// Agent share of player net losses, in [0, 1].
    pub agent_revshare_pct: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissionModel {
    Cpa,
    Revshare,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let affiliate_model = match env_map
            .get("AFFILIATE_MODEL")
            .map(|s| s.as_str())
            .unwrap_or("CPA")
        {
            "CPA" => CommissionModel::Cpa,
            "REVSHARE" => CommissionModel::Revshare,
            other => {
                return Err(ConfigError::InvalidValue(
                    "AFFILIATE_MODEL".to_string(),
                    format!("must be CPA or REVSHARE, got {}", other),
                ))
            }
        };

        let affiliate_cpa_ftd = parse_decimal(&env_map, "AFFILIATE_CPA_FTD", "30")?;
        if !affiliate_cpa_ftd.is_positive() {
            return Err(ConfigError::InvalidValue(
                "AFFILIATE_CPA_FTD".to_string(),
                "must be positive".to_string(),
            ));
        }

        let affiliate_revshare_pct = parse_pct(&env_map, "AFFILIATE_REVSHARE_PCT", "0.1")?;
        let agent_revshare_pct = parse_pct(&env_map, "AGENT_REVSHARE_PCT", "0.1")?;

        Ok(Config {
            port,
            database_path,
            commission: CommissionConfig {
                affiliate_model,
                affiliate_cpa_ftd,
                affiliate_revshare_pct,
                agent_revshare_pct,
            },
        })
    }
}

fn parse_decimal(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<Decimal, ConfigError> {
    let raw = env_map.get(key).map(|s| s.as_str()).unwrap_or(default);
    Decimal::from_str(raw).map_err(|_| {
        ConfigError::InvalidValue(key.to_string(), "must be a valid decimal".to_string())
    })
}

fn parse_pct(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<Decimal, ConfigError> {
    let value = parse_decimal(env_map, key, default)?;
    let one = Decimal::from_str("1").map_err(|_| {
        ConfigError::InvalidValue(key.to_string(), "internal decimal parse".to_string())
    })?;
    if value < Decimal::zero() || value > one {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be between 0 and 1".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_env_map(setup_required_env()).expect("config failed");
        assert_eq!(config.port, 8080);
        assert_eq!(config.commission.affiliate_model, CommissionModel::Cpa);
        assert_eq!(
            config.commission.affiliate_cpa_ftd.to_canonical_string(),
            "30"
        );
        assert_eq!(
            config
                .commission
                .affiliate_revshare_pct
                .to_canonical_string(),
            "0.1"
        );
        assert_eq!(
            config.commission.agent_revshare_pct.to_canonical_string(),
            "0.1"
        );
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_revshare_model_selected() {
        let mut env_map = setup_required_env();
        env_map.insert("AFFILIATE_MODEL".to_string(), "REVSHARE".to_string());
        let config = Config::from_env_map(env_map).expect("config failed");
        assert_eq!(config.commission.affiliate_model, CommissionModel::Revshare);
    }

    #[test]
    fn test_invalid_affiliate_model() {
        let mut env_map = setup_required_env();
        env_map.insert("AFFILIATE_MODEL".to_string(), "HYBRID".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "AFFILIATE_MODEL"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_cpa_must_be_positive() {
        let mut env_map = setup_required_env();
        env_map.insert("AFFILIATE_CPA_FTD".to_string(), "0".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "AFFILIATE_CPA_FTD"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_pct_out_of_range() {
        for key in ["AFFILIATE_REVSHARE_PCT", "AGENT_REVSHARE_PCT"] {
            let mut env_map = setup_required_env();
            env_map.insert(key.to_string(), "1.5".to_string());
            let result = Config::from_env_map(env_map);
            match result {
                Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, key),
                _ => panic!("Expected InvalidValue error for {}", key),
            }

            let mut env_map = setup_required_env();
            env_map.insert(key.to_string(), "-0.1".to_string());
            assert!(Config::from_env_map(env_map).is_err());
        }
    }

    #[test]
    fn test_pct_bounds_inclusive() {
        let mut env_map = setup_required_env();
        env_map.insert("AGENT_REVSHARE_PCT".to_string(), "1".to_string());
        env_map.insert("AFFILIATE_REVSHARE_PCT".to_string(), "0".to_string());
        let config = Config::from_env_map(env_map).expect("bounds are inclusive");
        assert_eq!(
            config.commission.agent_revshare_pct.to_canonical_string(),
            "1"
        );
    }
}
