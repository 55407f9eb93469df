//! Shared environment configuration for widget binaries.
//!
//! Reads `WIDGET_NUM_DICE`, `WIDGET_NUM_FACES`, `WIDGET_NUM_ROLLS`,
//! `WIDGET_KEEP_ALL_OPTIMAL`, `WIDGET_USE_DP`, and `RAYON_NUM_THREADS`.
//! Unset variables fall back to [`WidgetConfig::default`].

use crate::error::{WidgetError, WidgetResult};
use crate::types::WidgetConfig;

/// Read `RAYON_NUM_THREADS` (fallback `OMP_NUM_THREADS`, default 8) and build
/// the rayon global pool. Tolerates an already-initialized pool. Returns thread count.
pub fn init_rayon_threads_lenient() -> usize {
    let num_threads = std::env::var("RAYON_NUM_THREADS")
        .or_else(|_| std::env::var("OMP_NUM_THREADS"))
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .ok(); // May fail if already initialized
    num_threads
}

/// Widget configuration from the process environment.
pub fn widget_config_from_env() -> WidgetResult<WidgetConfig> {
    widget_config_from_lookup(|name| std::env::var(name).ok())
}

/// Widget configuration from any variable lookup, validated.
pub fn widget_config_from_lookup<F>(lookup: F) -> WidgetResult<WidgetConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = WidgetConfig::default();
    let config = WidgetConfig {
        num_dice: parse_usize(&lookup, "WIDGET_NUM_DICE", defaults.num_dice)?,
        num_faces: parse_usize(&lookup, "WIDGET_NUM_FACES", defaults.num_faces)?,
        num_rolls: parse_usize(&lookup, "WIDGET_NUM_ROLLS", defaults.num_rolls)?,
        keep_all_optimal: parse_bool(
            &lookup,
            "WIDGET_KEEP_ALL_OPTIMAL",
            defaults.keep_all_optimal,
        )?,
        use_dynamic_programming: parse_bool(
            &lookup,
            "WIDGET_USE_DP",
            defaults.use_dynamic_programming,
        )?,
    };
    config.validate()?;
    Ok(config)
}

fn parse_usize<F>(lookup: &F, name: &str, default: usize) -> WidgetResult<usize>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            WidgetError::InvalidConfig(format!("{}={:?} is not a non-negative integer", name, raw))
        }),
    }
}

fn parse_bool<F>(lookup: &F, name: &str, default: bool) -> WidgetResult<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(WidgetError::InvalidConfig(format!(
                "{}={:?} is not a boolean",
                name, raw
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = widget_config_from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, WidgetConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = widget_config_from_lookup(lookup_from(&[
            ("WIDGET_NUM_DICE", "3"),
            ("WIDGET_NUM_FACES", " 4 "),
            ("WIDGET_NUM_ROLLS", "2"),
            ("WIDGET_KEEP_ALL_OPTIMAL", "true"),
            ("WIDGET_USE_DP", "0"),
        ]))
        .unwrap();
        assert_eq!(
            config,
            WidgetConfig {
                num_dice: 3,
                num_faces: 4,
                num_rolls: 2,
                keep_all_optimal: true,
                use_dynamic_programming: false,
            }
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            widget_config_from_lookup(lookup_from(&[("WIDGET_NUM_DICE", "five")])),
            Err(WidgetError::InvalidConfig(_))
        ));
        assert!(matches!(
            widget_config_from_lookup(lookup_from(&[("WIDGET_USE_DP", "maybe")])),
            Err(WidgetError::InvalidConfig(_))
        ));
        assert!(matches!(
            widget_config_from_lookup(lookup_from(&[("WIDGET_NUM_FACES", "0")])),
            Err(WidgetError::InvalidConfig(_))
        ));
    }
}
