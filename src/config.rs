/*!
 * Run configuration: which storage roots to scan and how they are laid out.
 *
 * ```yaml
 * rootpath:
 *   CMIP6:
 *     - /badc/cmip6/data/CMIP6
 *   CMIP5: /badc/cmip5/data/cmip5/output1
 * drs:
 *   CMIP6: BADC
 *   CMIP5: BADC
 * log_level: info
 * ```
 *
 * The DRS scheme names are opaque layout labels; the scanner only needs to
 * know where to start walking.
 */
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use strum::IntoEnumIterator;

use crate::{
    catalog::{DrsScheme, ScanRoot},
    error::ConfigError,
};

/// File names probed, in order, when no configuration path is given.
static DEFAULT_CONFIG_PATHS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    let mut paths = vec![PathBuf::from("recfill.yml")];

    if let Some(home) = std::env::var_os("HOME") {
        paths.push(Path::new(&home).join(".recfill.yml"));
    }

    paths
});

/// A single path or a list of paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PathList {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

impl PathList {
    fn to_vec(&self) -> Vec<PathBuf> {
        match self {
            PathList::One(p) => vec![p.clone()],
            PathList::Many(ps) => ps.clone(),
        }
    }
}

/// The run configuration as loaded from YAML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunConfig {
    /// Project name to storage roots holding that project's data.
    #[serde(default)]
    rootpath: BTreeMap<String, PathList>,

    /// Project name to DRS scheme identifier. Missing projects scan with the
    /// default flat layout.
    #[serde(default)]
    drs: BTreeMap<String, String>,

    /// Log verbosity (`off`, `error`, `warn`, `info`, `debug`, `trace`).
    /// The command line verbosity flag wins over this.
    #[serde(default)]
    pub log_level: Option<String>,
}

impl RunConfig {
    /// Parse a run configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text)
            .map_err(|err| ConfigError::new(format!("malformed run configuration: {}", err)))
    }

    /// Load the configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let p = path.as_ref();
        let text = fs::read_to_string(p).map_err(|err| {
            ConfigError::new(format!("unable to read run configuration {}: {}", p.display(), err))
        })?;

        Self::from_yaml(&text)
    }

    /// Load from an explicit path, or from the first default location found.
    pub fn load_or_default_locations(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(p) = path {
            return Self::load(p);
        }

        for candidate in DEFAULT_CONFIG_PATHS.iter() {
            if candidate.is_file() {
                log::debug!("using run configuration {}", candidate.display());
                return Self::load(candidate);
            }
        }

        Err(ConfigError::new(
            "no run configuration found; pass one with --config or create ./recfill.yml",
        ))
    }

    /// The parsed log level from the configuration, if any.
    pub fn log_level(&self) -> Result<Option<log::LevelFilter>, ConfigError> {
        self.log_level
            .as_deref()
            .map(|level| {
                log::LevelFilter::from_str(level).map_err(|_| {
                    ConfigError::new(format!("unknown log_level \"{}\"", level))
                })
            })
            .transpose()
    }

    /// Resolve the configuration into concrete roots for the scanner.
    ///
    /// Every project named under `rootpath` becomes one `ScanRoot` per path,
    /// labeled with its DRS scheme. An unknown scheme name is a
    /// configuration error; a `drs` entry for a project with no roots is
    /// only worth a warning.
    pub fn scan_roots(&self) -> Result<Vec<ScanRoot>, ConfigError> {
        for project in self.drs.keys() {
            if !self.rootpath.contains_key(project) {
                log::warn!("drs entry for {} has no rootpath entry", project);
            }
        }

        let mut roots = vec![];

        for (project, paths) in &self.rootpath {
            let scheme = match self.drs.get(project) {
                None => DrsScheme::default(),
                Some(name) => DrsScheme::from_str(name).map_err(|_| {
                    let known: Vec<&str> = DrsScheme::iter().map(|s| s.name()).collect();
                    ConfigError::new(format!(
                        "unknown DRS scheme \"{}\" for {} (known schemes: {})",
                        name,
                        project,
                        known.join(", ")
                    ))
                })?,
            };

            for path in paths.to_vec() {
                roots.push(ScanRoot {
                    project: project.clone(),
                    scheme,
                    path,
                });
            }
        }

        Ok(roots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = "\
rootpath:
  CMIP6:
    - /data/cmip6
    - /more/cmip6
  CMIP5: /data/cmip5
drs:
  CMIP6: BADC
log_level: debug
";

    #[test]
    fn config_parses_and_resolves_roots() {
        let config = RunConfig::from_yaml(CONFIG).unwrap();
        let roots = config.scan_roots().unwrap();

        assert_eq!(roots.len(), 3);

        // BTreeMap ordering: CMIP5 before CMIP6.
        assert_eq!(roots[0].project, "CMIP5");
        assert_eq!(roots[0].scheme, DrsScheme::Default);
        assert_eq!(roots[0].path, PathBuf::from("/data/cmip5"));

        assert_eq!(roots[1].project, "CMIP6");
        assert_eq!(roots[1].scheme, DrsScheme::Badc);
        assert_eq!(roots[2].path, PathBuf::from("/more/cmip6"));
    }

    #[test]
    fn unknown_drs_scheme_is_a_config_error() {
        let config = RunConfig::from_yaml("rootpath:\n  CMIP6: /data\ndrs:\n  CMIP6: NCAR\n").unwrap();
        let err = config.scan_roots().unwrap_err();

        assert!(err.msg.contains("NCAR"));
        assert!(err.msg.contains("BADC"));
    }

    #[test]
    fn log_level_parses() {
        let config = RunConfig::from_yaml(CONFIG).unwrap();
        assert_eq!(config.log_level().unwrap(), Some(log::LevelFilter::Debug));

        let config = RunConfig::from_yaml("log_level: chatty\n").unwrap();
        assert!(config.log_level().is_err());
    }

    #[test]
    fn malformed_config_does_not_parse() {
        assert!(RunConfig::from_yaml("rootpath: [").is_err());
    }

    #[test]
    fn empty_config_has_no_roots() {
        let config = RunConfig::from_yaml("{}").unwrap();
        assert!(config.scan_roots().unwrap().is_empty());
    }
}
