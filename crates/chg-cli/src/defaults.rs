//! Defaults file loading
//!
//! Reads a TOML or YAML defaults file and flattens it to dotted keys.
//! `[database]` describes the target database and `missingPropertyMode`
//! picks the expander policy; every other entry is passed on as-is.

use anyhow::{bail, Context, Result};
use chg_params::{DatabaseProfile, MissingPropertyMode, ParameterValue};
use std::fs;
use std::path::Path;

const DATABASE_KEY: &str = "database";
const MISSING_PROPERTY_MODE_KEY: &str = "missingPropertyMode";

/// Parsed defaults file
#[derive(Debug, Default)]
pub(crate) struct Defaults {
    /// Flattened entries, sorted by key within each table
    pub(crate) entries: Vec<(String, ParameterValue)>,
    pub(crate) database: Option<DatabaseProfile>,
    pub(crate) missing_property_mode: Option<MissingPropertyMode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Yaml,
}

fn format_of(path: &Path) -> Result<Format> {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("toml") => Ok(Format::Toml),
        Some("yaml" | "yml") => Ok(Format::Yaml),
        _ => bail!("unsupported defaults file '{}' (expected .toml, .yaml or .yml)", path.display()),
    }
}

/// Load and split a defaults file
pub(crate) fn load(path: &Path) -> Result<Defaults> {
    let format = format_of(path)?;
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read defaults file '{}'", path.display()))?;
    let defaults = parse(&text, format)
        .with_context(|| format!("failed to parse defaults file '{}'", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        entries = defaults.entries.len(),
        database = defaults.database.is_some(),
        "loaded defaults file"
    );
    Ok(defaults)
}

fn parse(text: &str, format: Format) -> Result<Defaults> {
    let root: ParameterValue = match format {
        Format::Toml => toml::from_str(text)?,
        Format::Yaml => serde_yaml::from_str(text)?,
    };

    let mut table = match root {
        ParameterValue::Object(map) => map,
        ParameterValue::Null => return Ok(Defaults::default()),
        other => bail!("top level must be a table, found {other}"),
    };

    let database = table
        .remove(DATABASE_KEY)
        .map(serde_json::from_value::<DatabaseProfile>)
        .transpose()
        .context("invalid [database] table")?;

    let missing_property_mode = match table.remove(MISSING_PROPERTY_MODE_KEY) {
        None => None,
        Some(ParameterValue::String(mode)) => Some(mode.parse::<MissingPropertyMode>()?),
        Some(other) => bail!("{MISSING_PROPERTY_MODE_KEY} must be a string, found {other}"),
    };

    let mut entries = Vec::new();
    for (key, value) in table {
        flatten(key, value, &mut entries);
    }

    Ok(Defaults {
        entries,
        database,
        missing_property_mode,
    })
}

fn flatten(prefix: String, value: ParameterValue, out: &mut Vec<(String, ParameterValue)>) {
    match value {
        ParameterValue::Object(map) if !map.is_empty() => {
            for (key, nested) in map {
                flatten(format!("{prefix}.{key}"), nested, out);
            }
        }
        leaf => out.push((prefix, leaf)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;

    fn keys(defaults: &Defaults) -> Vec<&str> {
        defaults.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn toml_tables_flatten_to_dotted_keys() {
        let defaults = parse(
            r#"
            url = "jdbc:postgresql://localhost/app"

            [parameter]
            schema = "app"
            batch = 500

            [parameter.table]
            users = "app_users"
            "#,
            Format::Toml,
        )
        .unwrap();

        assert_eq!(
            keys(&defaults),
            vec!["parameter.batch", "parameter.schema", "parameter.table.users", "url"]
        );
        assert_eq!(defaults.entries[0].1, json!(500));
    }

    #[test]
    fn yaml_dotted_and_nested_keys() {
        let defaults = parse(
            "parameter.schema: app\nparameter:\n  table: users\n",
            Format::Yaml,
        )
        .unwrap();

        assert_eq!(keys(&defaults), vec!["parameter.table", "parameter.schema"]);
    }

    #[test]
    fn database_table_becomes_profile() {
        let defaults = parse(
            r#"
            missingPropertyMode = "error"

            [database]
            shortName = "postgresql"
            productName = "PostgreSQL"
            defaultSchemaName = "public"
            "#,
            Format::Toml,
        )
        .unwrap();

        let profile = defaults.database.unwrap();
        assert_eq!(profile.short_name, "postgresql");
        assert_eq!(profile.default_schema_name.as_deref(), Some("public"));
        assert_eq!(defaults.missing_property_mode, Some(MissingPropertyMode::Error));
        assert!(defaults.entries.is_empty());
    }

    #[test]
    fn bad_missing_property_mode_is_rejected() {
        let err = parse("missingPropertyMode = \"loud\"", Format::Toml).unwrap_err();
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn load_picks_format_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "parameter:\n  schema: app").unwrap();

        let defaults = load(file.path()).unwrap();
        assert_eq!(defaults.entries, vec![("parameter.schema".to_string(), json!("app"))]);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = load(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported defaults file"));
    }
}
