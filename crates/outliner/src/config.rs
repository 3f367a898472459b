use std::path::Path;

use outliner_core::LayoutConfig;

use crate::prelude::*;

/// Load the layout configuration, falling back to the defaults when no file
/// is given.
pub fn load(path: Option<&Path>) -> Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };

    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| f!("Failed to read config file {}", path.display()))?;
    let config = LayoutConfig::from_toml_str(&raw)
        .wrap_err_with(|| f!("Invalid config file {}", path.display()))?;

    log::debug!("loaded layout config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = load(None).unwrap();
        assert_eq!(config.headings.max_entries, 10);
    }

    #[test]
    fn test_partial_file_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[headings]\nmax_entries = 3\n\n[grouping]\nline_tolerance = 4.0").unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.headings.max_entries, 3);
        assert_eq!(config.grouping.line_tolerance, 4.0);
        assert_eq!(config.title.region_height, 120.0);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[headings]\nh1_percentile = 10.0\nh2_percentile = 50.0").unwrap();

        assert!(load(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load(Some(Path::new("/nonexistent/outliner.toml"))).is_err());
    }
}
