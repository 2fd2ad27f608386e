//! Daemon configuration.
//!
//! | Variable                  | Default     |
//! |---------------------------|-------------|
//! | `SEATINGD_ID_COLUMN`      | `ID number` |
//! | `SEATINGD_INCLUDE_COLUMN` | `Include?`  |
//! | `SEATINGD_MAX_CLASSROOMS` | `20`        |
//! | `SEATINGD_MAX_CAPACITY`   | `500`       |
//! | `SEATINGD_LOG`            | `seatingd=info` (`RUST_LOG` wins when set) |

pub const DEFAULT_ID_COLUMN: &str = "ID number";
pub const DEFAULT_INCLUDE_COLUMN: &str = "Include?";
pub const DEFAULT_MAX_CLASSROOMS: usize = 20;
pub const DEFAULT_MAX_CAPACITY: u32 = 500;
pub const DEFAULT_LOG_FILTER: &str = "seatingd=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub id_column: String,
    pub include_column: String,
    pub max_classrooms: usize,
    pub max_capacity: u32,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id_column: DEFAULT_ID_COLUMN.to_string(),
            include_column: DEFAULT_INCLUDE_COLUMN.to_string(),
            max_classrooms: DEFAULT_MAX_CLASSROOMS,
            max_capacity: DEFAULT_MAX_CAPACITY,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, fallback: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
        };

        Self {
            id_column: text("SEATINGD_ID_COLUMN", defaults.id_column),
            include_column: text("SEATINGD_INCLUDE_COLUMN", defaults.include_column),
            max_classrooms: parse_limit(
                "SEATINGD_MAX_CLASSROOMS",
                lookup("SEATINGD_MAX_CLASSROOMS"),
                defaults.max_classrooms,
            ),
            max_capacity: parse_limit(
                "SEATINGD_MAX_CAPACITY",
                lookup("SEATINGD_MAX_CAPACITY"),
                defaults.max_capacity,
            ),
            log_filter: text("SEATINGD_LOG", defaults.log_filter),
        }
    }
}

fn parse_limit<T>(key: &str, raw: Option<String>, fallback: T) -> T
where
    T: std::str::FromStr + PartialOrd + Default + Copy + std::fmt::Display,
{
    let Some(raw) = raw else {
        return fallback;
    };
    match raw.trim().parse::<T>() {
        Ok(v) if v > T::default() => v,
        _ => {
            tracing::warn!(key, value = %raw, default = %fallback, "ignoring invalid limit");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_keys_use_defaults() {
        let cfg = Config::from_lookup(|_| None);
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.id_column, "ID number");
        assert_eq!(cfg.max_classrooms, 20);
    }

    #[test]
    fn overrides_and_bad_numbers() {
        let env: HashMap<&str, &str> = [
            ("SEATINGD_ID_COLUMN", " Student No "),
            ("SEATINGD_MAX_CLASSROOMS", "abc"),
            ("SEATINGD_MAX_CAPACITY", "40"),
        ]
        .into_iter()
        .collect();
        let cfg = Config::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.id_column, "Student No");
        assert_eq!(cfg.max_classrooms, DEFAULT_MAX_CLASSROOMS);
        assert_eq!(cfg.max_capacity, 40);
    }

    #[test]
    fn zero_limit_is_rejected() {
        let cfg = Config::from_lookup(|k| (k == "SEATINGD_MAX_CAPACITY").then(|| "0".to_string()));
        assert_eq!(cfg.max_capacity, DEFAULT_MAX_CAPACITY);
    }
}
