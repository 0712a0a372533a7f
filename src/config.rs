//! Verifier configuration.
//!
//! Settings are read from a TOML file. An explicit `--config` path must
//! exist; otherwise `caddy-verify/config.toml` under the platform config
//! directory is used when present, and built-in defaults apply when it is
//! not. Every key is optional.
//!
//! ```toml
//! host = "github.com"
//! project = "caddyserver/caddy"
//! timeout_secs = 60
//! cosign = "/usr/local/bin/cosign"
//! ```

use crate::attest::{
    CosignSettings, DEFAULT_OIDC_ISSUER, DEFAULT_PROVENANCE_TYPE, DEFAULT_SBOM_TYPE,
};
use crate::fetch::{DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT};
use crate::identity::resources::{DEFAULT_HOST, DEFAULT_PROJECT};
use crate::identity::{DEFAULT_ARTIFACT_PREFIX, ReleaseHost};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;
use std::time::Duration;

/// Directory under the platform config dir holding `config.toml`.
pub const CONFIG_DIR_NAME: &str = "caddy-verify";

/// File name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Project whose reusable workflows sign SLSA provenance.
pub const SLSA_GENERATOR_PROJECT: &str = "slsa-framework/slsa-github-generator";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// The file that was read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration TOML.
    #[error("invalid config file {path}: {reason}")]
    Parse {
        /// The file that was parsed.
        path: Utf8PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// An explicitly requested file does not exist.
    #[error("config file not found: {path}")]
    NotFound {
        /// The requested path.
        path: Utf8PathBuf,
    },
}

/// Platform directory lookup, injectable for tests.
pub trait BaseDirs {
    /// The per-user configuration directory, if the platform has one.
    fn config_dir(&self) -> Option<Utf8PathBuf>;
}

/// [`BaseDirs`] backed by `directories-next`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn config_dir(&self) -> Option<Utf8PathBuf> {
        let dirs = directories_next::BaseDirs::new()?;
        Utf8PathBuf::from_path_buf(dirs.config_dir().to_path_buf()).ok()
    }
}

/// Runtime settings for a verification run.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Release host name.
    pub host: String,
    /// `owner/repo` path of the project on the host.
    pub project: String,
    /// Leading segment of artifact names.
    pub artifact_prefix: String,
    /// Global timeout for each download, in seconds.
    pub timeout_secs: u64,
    /// Redirects followed before a download is treated as a loop.
    pub max_redirects: u32,
    /// The cosign binary.
    pub cosign: String,
    /// Certificate identity pattern; derived from host and project when unset.
    pub certificate_identity_regexp: Option<String>,
    /// Expected OIDC issuer of the signing certificate.
    pub certificate_oidc_issuer: String,
    /// cosign `--type` for the provenance attestation.
    pub provenance_type: String,
    /// cosign `--type` for the SBOM attestation.
    pub sbom_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            project: DEFAULT_PROJECT.to_owned(),
            artifact_prefix: DEFAULT_ARTIFACT_PREFIX.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            cosign: "cosign".to_owned(),
            certificate_identity_regexp: None,
            certificate_oidc_issuer: DEFAULT_OIDC_ISSUER.to_owned(),
            provenance_type: DEFAULT_PROVENANCE_TYPE.to_owned(),
            sbom_type: DEFAULT_SBOM_TYPE.to_owned(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML, mistyped values, or
    /// unknown keys.
    pub fn from_toml(source: &str, path: &Utf8Path) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            reason: e.message().to_owned(),
        })
    }

    /// Load configuration following the lookup order described above.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `explicit` does not exist, and
    /// read or parse errors for whichever file is selected.
    pub fn load(explicit: Option<&Utf8Path>, dirs: &dyn BaseDirs) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::NotFound {
                    path: path.to_owned(),
                });
            }
            Some(path) => path.to_owned(),
            None => match default_path(dirs) {
                Some(path) if path.is_file() => path,
                _ => {
                    debug!("no config file found; using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!("loading config from {path}");
        let source = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&source, &path)
    }

    /// The release host template described by this configuration.
    #[must_use]
    pub fn release_host(&self) -> ReleaseHost {
        ReleaseHost::new(&self.host, &self.project)
    }

    /// Global download timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The certificate identity pattern passed to cosign.
    ///
    /// When unset, both the project's own workflows and the SLSA generator's
    /// reusable workflows on the same host are accepted. The generator signs
    /// provenance under its own identity, while the project signs the SBOM.
    ///
    /// # Examples
    ///
    /// ```
    /// use caddy_verify::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(
    ///     config.identity_regexp(),
    ///     r"^https://github\.com/(caddyserver/caddy|slsa\-framework/slsa\-github\-generator)/"
    /// );
    /// ```
    #[must_use]
    pub fn identity_regexp(&self) -> String {
        self.certificate_identity_regexp.clone().unwrap_or_else(|| {
            let host = self.release_host();
            format!(
                "^https://{}/({}|{})/",
                regex::escape(host.host()),
                regex::escape(host.project()),
                regex::escape(SLSA_GENERATOR_PROJECT)
            )
        })
    }

    /// The parameters handed to cosign.
    #[must_use]
    pub fn cosign_settings(&self) -> CosignSettings {
        CosignSettings {
            binary: self.cosign.clone(),
            certificate_identity_regexp: self.identity_regexp(),
            certificate_oidc_issuer: self.certificate_oidc_issuer.clone(),
            provenance_type: self.provenance_type.clone(),
            sbom_type: self.sbom_type.clone(),
        }
    }
}

/// `<config dir>/caddy-verify/config.toml`, if the platform has a config dir.
#[must_use]
pub fn default_path(dirs: &dyn BaseDirs) -> Option<Utf8PathBuf> {
    dirs.config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct TestBaseDirs {
        config_dir: Option<Utf8PathBuf>,
    }

    impl BaseDirs for TestBaseDirs {
        fn config_dir(&self) -> Option<Utf8PathBuf> {
            self.config_dir.clone()
        }
    }

    struct ConfigHome {
        _temp: TempDir,
        dir: Utf8PathBuf,
    }

    impl ConfigHome {
        fn dirs(&self) -> TestBaseDirs {
            TestBaseDirs {
                config_dir: Some(self.dir.clone()),
            }
        }

        fn write_default(&self, contents: &str) -> Utf8PathBuf {
            let dir = self.dir.join(CONFIG_DIR_NAME);
            std::fs::create_dir_all(&dir).expect("create config dir");
            let path = dir.join(CONFIG_FILE_NAME);
            std::fs::write(&path, contents).expect("write config");
            path
        }
    }

    #[fixture]
    fn home() -> ConfigHome {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        ConfigHome { _temp: temp, dir }
    }

    #[rstest]
    fn defaults_target_caddy_releases() {
        let config = Config::default();
        assert_eq!(config.host, "github.com");
        assert_eq!(config.project, "caddyserver/caddy");
        assert_eq!(config.artifact_prefix, "caddy");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.cosign_settings().provenance_type, "slsaprovenance");
        assert_eq!(config.cosign_settings().sbom_type, "cyclonedx");
    }

    #[rstest]
    fn missing_default_file_yields_defaults(home: ConfigHome) {
        let config = Config::load(None, &home.dirs()).expect("defaults");
        assert_eq!(config, Config::default());
    }

    #[rstest]
    fn absent_config_dir_yields_defaults() {
        let dirs = TestBaseDirs { config_dir: None };
        let config = Config::load(None, &dirs).expect("defaults");
        assert_eq!(config, Config::default());
    }

    #[rstest]
    fn default_file_is_used_when_present(home: ConfigHome) {
        home.write_default("project = \"example/fork\"\ntimeout_secs = 5\n");

        let config = Config::load(None, &home.dirs()).expect("loads");

        assert_eq!(config.project, "example/fork");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.host, "github.com");
    }

    #[rstest]
    fn explicit_path_wins_over_default(home: ConfigHome) {
        home.write_default("cosign = \"/default/cosign\"\n");
        let explicit = home.dir.join("other.toml");
        std::fs::write(&explicit, "cosign = \"/explicit/cosign\"\n").expect("write");

        let config = Config::load(Some(&explicit), &home.dirs()).expect("loads");

        assert_eq!(config.cosign, "/explicit/cosign");
    }

    #[rstest]
    fn missing_explicit_path_is_an_error(home: ConfigHome) {
        let explicit = home.dir.join("nope.toml");
        let err = Config::load(Some(&explicit), &home.dirs()).expect_err("must fail");
        assert!(matches!(err, ConfigError::NotFound { ref path } if *path == explicit));
    }

    #[rstest]
    #[case::unknown_key("unexpected = true\n")]
    #[case::wrong_type("timeout_secs = \"soon\"\n")]
    #[case::not_toml("host = \n")]
    fn invalid_files_are_parse_errors(home: ConfigHome, #[case] contents: &str) {
        let path = home.write_default(contents);
        let err = Config::load(None, &home.dirs()).expect_err("must fail");
        assert!(matches!(err, ConfigError::Parse { path: ref p, .. } if *p == path));
    }

    #[rstest]
    fn identity_regexp_follows_project() {
        let config = Config {
            project: "example/fork.rs".to_owned(),
            ..Config::default()
        };
        assert_eq!(
            config.identity_regexp(),
            r"^https://github\.com/(example/fork\.rs|slsa\-framework/slsa\-github\-generator)/"
        );
    }

    #[rstest]
    #[case::release_workflow(
        "https://github.com/caddyserver/caddy/.github/workflows/release.yml@refs/tags/v2.7.6",
        true
    )]
    #[case::slsa_generator(
        "https://github.com/slsa-framework/slsa-github-generator/.github/workflows/generator_generic_slsa3.yml@refs/tags/v1.9.0",
        true
    )]
    #[case::other_project(
        "https://github.com/caddyserver/caddy-docker/.github/workflows/release.yml@refs/heads/master",
        false
    )]
    #[case::dot_is_literal("https://githubXcom/caddyserver/caddy/release.yml", false)]
    fn default_identity_regexp_matches_signers(#[case] identity: &str, #[case] expected: bool) {
        let pattern = regex::Regex::new(&Config::default().identity_regexp()).expect("valid regex");
        assert_eq!(pattern.is_match(identity), expected);
    }

    #[rstest]
    fn explicit_identity_regexp_is_kept() {
        let config = Config::from_toml(
            "certificate_identity_regexp = \"^https://github\\\\.com/caddyserver/\"\n",
            Utf8Path::new("inline.toml"),
        )
        .expect("parses");
        assert_eq!(config.identity_regexp(), r"^https://github\.com/caddyserver/");
    }

    #[rstest]
    fn release_host_uses_configured_values() {
        let config = Config {
            host: "git.example.test".to_owned(),
            project: "mirror/caddy".to_owned(),
            ..Config::default()
        };
        let host = config.release_host();
        assert_eq!(host.host(), "git.example.test");
        assert_eq!(host.project(), "mirror/caddy");
    }
}
