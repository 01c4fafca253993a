use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use toml::{Table, Value};

use super::resolve::resolve_references;
use super::{DefaultsDiscovery, DiscoveryError, HadoopConf};
use crate::options::catalog::{HADOOP_CONF_DIR, HADOOP_PREFIX};
use crate::Options;

/// Site files read from each configuration directory, in merge order.
const SITE_FILES: [&str; 2] = ["core-site.toml", "hdfs-site.toml"];

/// Loads default Hadoop configuration from the local environment.
///
/// Configuration directories are merged from lowest to highest priority:
///
/// 1. `$HADOOP_HOME/conf`
/// 2. `$HADOOP_HOME/etc/hadoop`
/// 3. `$HADOOP_CONF_DIR`
/// 4. the `hadoop-conf-dir` option
///
/// Each directory may hold `core-site.toml` and `hdfs-site.toml`; missing files
/// are skipped. Later files override earlier ones property by property. Nested
/// tables are flattened into dotted names, so
///
/// ```toml
/// [fs]
/// defaultFS = "hdfs://namenode:8020"
/// ```
///
/// yields the property `fs.defaultFS`. After the files, every option prefixed
/// with `hadoop.` is applied with the prefix removed, and finally `${...}`
/// references are resolved.
///
/// A directory named by the `hadoop-conf-dir` option must exist. Directories
/// named by environment variables are skipped with a warning when missing.
#[derive(Debug, Clone, Default)]
pub struct HadoopDiscovery {
    env: Option<BTreeMap<String, String>>,
}

impl HadoopDiscovery {
    /// Creates a discovery that reads the process environment on every run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the process environment with a fixed set of variables.
    pub fn with_environment<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Variables that are not valid UTF-8 are skipped.
    fn environment(&self) -> BTreeMap<String, String> {
        match &self.env {
            Some(vars) => vars.clone(),
            None => std::env::vars_os()
                .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                    (Ok(key), Ok(value)) => Some((key, value)),
                    (key, _) => {
                        tracing::debug!(key = ?key, "skipping non-UTF-8 environment variable");
                        None
                    }
                })
                .collect(),
        }
    }

    fn conf_dirs(
        &self,
        options: &Options,
        env: &BTreeMap<String, String>,
    ) -> Result<Vec<PathBuf>, DiscoveryError> {
        let mut dirs = Vec::new();

        if let Some(home) = env.get("HADOOP_HOME").filter(|h| !h.is_empty()) {
            let home = Path::new(home);
            for candidate in [home.join("conf"), home.join("etc").join("hadoop")] {
                if candidate.is_dir() {
                    dirs.push(candidate);
                }
            }
        }

        if let Some(dir) = env.get("HADOOP_CONF_DIR").filter(|d| !d.is_empty()) {
            let dir = PathBuf::from(dir);
            if dir.is_dir() {
                dirs.push(dir);
            } else {
                tracing::warn!(dir = %dir.display(), "HADOOP_CONF_DIR does not exist, skipping");
            }
        }

        let explicit = options.get_option(&HADOOP_CONF_DIR);
        if !explicit.is_empty() {
            let dir = PathBuf::from(explicit);
            if !dir.is_dir() {
                return Err(DiscoveryError::ConfDirNotFound(dir));
            }
            dirs.push(dir);
        }

        Ok(dirs)
    }
}

impl DefaultsDiscovery for HadoopDiscovery {
    fn discover(&self, options: &Options) -> Result<HadoopConf, DiscoveryError> {
        let env = self.environment();
        let mut props = BTreeMap::new();
        let mut sources = Vec::new();

        for dir in self.conf_dirs(options, &env)? {
            for name in SITE_FILES {
                let path = dir.join(name);
                if let Some(table) = load_site_file(&path)? {
                    tracing::debug!(path = %path.display(), "loaded hadoop site file");
                    flatten_into(&mut props, "", &table);
                    sources.push(path);
                }
            }
        }

        props.extend(options.strip_prefix(HADOOP_PREFIX));

        resolve_references(&mut props, &env)?;

        tracing::debug!(
            properties = props.len(),
            files = sources.len(),
            "discovered default hadoop configuration"
        );
        Ok(HadoopConf::new(props, sources))
    }
}

/// Reads a site file, or `None` when it is absent.
fn load_site_file(path: &Path) -> Result<Option<Table>, DiscoveryError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(DiscoveryError::ReadError {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| DiscoveryError::ParseError {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes every leaf of `table` into `props` under its dotted name, replacing
/// values set by earlier files.
fn flatten_into(props: &mut BTreeMap<String, String>, prefix: &str, table: &Table) {
    for (key, value) in table {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Table(nested) => flatten_into(props, &name, nested),
            Value::Array(items) => {
                let joined: Vec<String> = items.iter().map(scalar_to_string).collect();
                props.insert(name, joined.join(","));
            }
            other => {
                props.insert(name, scalar_to_string(other));
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    fn isolated() -> HadoopDiscovery {
        HadoopDiscovery::new().with_environment(Vec::<(String, String)>::new())
    }

    #[test]
    fn test_no_directories_yields_only_prefixed_options() {
        let options: Options = [("hadoop.fs.defaultFS", "file:///"), ("warehouse", "/wh")]
            .into_iter()
            .collect();

        let conf = isolated().discover(&options).unwrap();

        assert_eq!(conf.len(), 1);
        assert_eq!(conf.get("fs.defaultFS"), Some("file:///"));
        assert!(conf.sources().is_empty());
    }

    #[test]
    fn test_site_files_are_flattened_and_merged() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "core-site.toml",
            r#"
            [fs]
            defaultFS = "hdfs://nn:8020"
            [io.file]
            buffer.size = 4096
            "#,
        );
        write(
            dir.path(),
            "hdfs-site.toml",
            r#"
            "dfs.replication" = 2
            "dfs.ha.namenodes" = ["nn1", "nn2"]
            "#,
        );
        let options: Options = [("hadoop-conf-dir", dir.path().to_str().unwrap())]
            .into_iter()
            .collect();

        let conf = isolated().discover(&options).unwrap();

        assert_eq!(conf.get("fs.defaultFS"), Some("hdfs://nn:8020"));
        assert_eq!(conf.get("io.file.buffer.size"), Some("4096"));
        assert_eq!(conf.get("dfs.replication"), Some("2"));
        assert_eq!(conf.get("dfs.ha.namenodes"), Some("nn1,nn2"));
        assert_eq!(conf.sources().len(), 2);
    }

    #[test]
    fn test_priority_order() {
        let home = TempDir::new().unwrap();
        let home_conf = home.path().join("etc").join("hadoop");
        fs::create_dir_all(&home_conf).unwrap();
        write(&home_conf, "core-site.toml", "a = \"home\"\nb = \"home\"\nc = \"home\"");

        let env_dir = TempDir::new().unwrap();
        write(env_dir.path(), "core-site.toml", "b = \"env\"\nc = \"env\"");

        let explicit = TempDir::new().unwrap();
        write(explicit.path(), "core-site.toml", "c = \"explicit\"");

        let discovery = HadoopDiscovery::new().with_environment([
            ("HADOOP_HOME", home.path().to_str().unwrap()),
            ("HADOOP_CONF_DIR", env_dir.path().to_str().unwrap()),
        ]);
        let options: Options = [
            ("hadoop-conf-dir", explicit.path().to_str().unwrap()),
            ("hadoop.d", "option"),
        ]
        .into_iter()
        .collect();

        let conf = discovery.discover(&options).unwrap();

        assert_eq!(conf.get("a"), Some("home"));
        assert_eq!(conf.get("b"), Some("env"));
        assert_eq!(conf.get("c"), Some("explicit"));
        assert_eq!(conf.get("d"), Some("option"));
    }

    #[test]
    fn test_references_resolved_after_overlay() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "core-site.toml",
            r#"
            "nn.host" = "default-host"
            "fs.defaultFS" = "hdfs://${nn.host}:8020"
            "#,
        );
        let options: Options = [
            ("hadoop-conf-dir", dir.path().to_str().unwrap()),
            ("hadoop.nn.host", "override-host"),
        ]
        .into_iter()
        .collect();

        let conf = isolated().discover(&options).unwrap();

        assert_eq!(conf.get("fs.defaultFS"), Some("hdfs://override-host:8020"));
    }

    #[test]
    fn test_missing_explicit_dir_fails() {
        let options: Options = [("hadoop-conf-dir", "/nonexistent/hadoop/conf")]
            .into_iter()
            .collect();

        let result = isolated().discover(&options);
        assert!(matches!(result, Err(DiscoveryError::ConfDirNotFound(_))));
    }

    #[test]
    fn test_missing_env_dir_is_skipped() {
        let discovery =
            HadoopDiscovery::new().with_environment([("HADOOP_CONF_DIR", "/nonexistent/conf")]);
        let conf = discovery.discover(&Options::new()).unwrap();
        assert!(conf.is_empty());
    }

    #[test]
    fn test_malformed_site_file_fails() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "core-site.toml", "not = [valid");
        let options: Options = [("hadoop-conf-dir", dir.path().to_str().unwrap())]
            .into_iter()
            .collect();

        let result = isolated().discover(&options);
        assert!(matches!(result, Err(DiscoveryError::ParseError { .. })));
    }

    #[test]
    fn test_options_are_not_mutated() {
        let options: Options = [("hadoop.x", "1")].into_iter().collect();
        let before = options.to_map();

        isolated().discover(&options).unwrap();

        assert_eq!(options.to_map(), before);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_environment_is_skipped() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let key = "CATALOG_CONTEXT_DISCOVERY_NON_UTF8";
        std::env::set_var(key, OsString::from_vec(vec![0x66, 0xff, 0x6f]));
        let env = HadoopDiscovery::new().environment();
        std::env::remove_var(key);

        assert!(!env.contains_key(key));
    }

    #[test]
    fn test_later_file_overrides_single_property() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "core-site.toml",
            "[dfs]\nreplication = 3\nblocksize = \"128m\"\n",
        );
        write(dir.path(), "hdfs-site.toml", "\"dfs.replication\" = 1\n");
        let options: Options = [("hadoop-conf-dir", dir.path().to_str().unwrap())]
            .into_iter()
            .collect();

        let conf = isolated().discover(&options).unwrap();

        assert_eq!(conf.get("dfs.replication"), Some("1"));
        assert_eq!(conf.get("dfs.blocksize"), Some("128m"));
    }

    #[test]
    fn test_self_referencing_site_property_fails() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "core-site.toml", "a = \"${a}${a}\"\n");
        let options: Options = [("hadoop-conf-dir", dir.path().to_str().unwrap())]
            .into_iter()
            .collect();

        let result = isolated().discover(&options);
        assert!(matches!(result, Err(DiscoveryError::CircularReference)));
    }
}
