use headcount_core::RecognizerConfig;
use headcount_hw::CaptureConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name of the detection result inside the photo directory.
const RESULT_FILE_NAME: &str = "out_faces.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value:?}")]
    BadValue { key: String, value: String },
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("keep-alive must be at least 5 seconds, got {0}")]
    KeepAliveTooShort(u64),
    #[error("poll interval must be at least 1 second")]
    ZeroPollInterval,
}

/// MQTT broker connection settings.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: String,
    pub password: String,
    /// Topic every count is published on.
    pub topic: String,
    pub keep_alive: Duration,
}

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the photo is captured into.
    pub photo_dir: PathBuf,
    /// Where the detection result document is stored.
    pub result_path: PathBuf,
    pub capture: CaptureConfig,
    pub recognizer: RecognizerConfig,
    pub broker: BrokerConfig,
    /// Fixed pause between cycles.
    pub poll_interval: Duration,
}

/// Optional TOML layer; every key mirrors a `HEADCOUNT_*` variable.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    photo_dir: Option<PathBuf>,
    result_path: Option<PathBuf>,
    capture_binary: Option<String>,
    resolution: Option<String>,
    banner: Option<bool>,
    http_client: Option<String>,
    api_key: Option<String>,
    api_endpoint: Option<String>,
    broker_host: Option<String>,
    broker_port: Option<u16>,
    client_id: Option<String>,
    username: Option<String>,
    password: Option<String>,
    topic: Option<String>,
    keep_alive_secs: Option<u64>,
    poll_interval_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        let photo_dir = PathBuf::from("/home/pi/Desktop");
        Self {
            result_path: photo_dir.join(RESULT_FILE_NAME),
            photo_dir,
            capture: CaptureConfig::default(),
            recognizer: RecognizerConfig::new(""),
            broker: BrokerConfig {
                host: String::new(),
                port: 1883,
                client_id: String::new(),
                username: "use-token-auth".to_string(),
                password: String::new(),
                topic: "iot-2/evt/status/fmt/json".to_string(),
                keep_alive: Duration::from_secs(60),
            },
            poll_interval: Duration::from_secs(2),
        }
    }
}

impl Config {
    /// Load defaults, then the TOML file named by `HEADCOUNT_CONFIG` (if set),
    /// then `HEADCOUNT_*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var("HEADCOUNT_CONFIG") {
            Ok(path) => Some(read_file(Path::new(&path))?),
            Err(_) => None,
        };
        Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())
    }

    /// Build a config from optional TOML text and an environment lookup.
    pub fn from_sources(
        toml_text: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let mut explicit_result = false;
        if let Some(text) = toml_text {
            let file: FileConfig = toml::from_str(text)?;
            explicit_result = config.apply_file(file);
        }
        config.apply_env(env, explicit_result)?;
        Ok(config)
    }

    /// Returns whether the file set `result_path` explicitly.
    fn apply_file(&mut self, file: FileConfig) -> bool {
        let explicit_result = file.result_path.is_some();
        if let Some(dir) = file.photo_dir {
            self.result_path = dir.join(RESULT_FILE_NAME);
            self.photo_dir = dir;
        }
        set(&mut self.result_path, file.result_path);
        set(&mut self.capture.binary, file.capture_binary);
        set(&mut self.capture.resolution, file.resolution);
        set(&mut self.capture.banner, file.banner);
        set(&mut self.recognizer.http_client, file.http_client);
        set(&mut self.recognizer.api_key, file.api_key);
        set(&mut self.recognizer.endpoint, file.api_endpoint);
        set(&mut self.broker.host, file.broker_host);
        set(&mut self.broker.port, file.broker_port);
        set(&mut self.broker.client_id, file.client_id);
        set(&mut self.broker.username, file.username);
        set(&mut self.broker.password, file.password);
        set(&mut self.broker.topic, file.topic);
        set(&mut self.broker.keep_alive, file.keep_alive_secs.map(Duration::from_secs));
        set(&mut self.poll_interval, file.poll_interval_secs.map(Duration::from_secs));
        explicit_result
    }

    fn apply_env(
        &mut self,
        env: impl Fn(&str) -> Option<String>,
        explicit_result: bool,
    ) -> Result<(), ConfigError> {
        if let Some(dir) = env("HEADCOUNT_PHOTO_DIR") {
            self.photo_dir = PathBuf::from(dir);
            if !explicit_result {
                self.result_path = self.photo_dir.join(RESULT_FILE_NAME);
            }
        }
        set(&mut self.result_path, env("HEADCOUNT_RESULT_PATH").map(PathBuf::from));
        set(&mut self.capture.binary, env("HEADCOUNT_CAPTURE_BINARY"));
        set(&mut self.capture.resolution, env("HEADCOUNT_RESOLUTION"));
        set(&mut self.capture.banner, parsed(&env, "HEADCOUNT_BANNER")?);
        set(&mut self.recognizer.http_client, env("HEADCOUNT_HTTP_CLIENT"));
        set(&mut self.recognizer.api_key, env("HEADCOUNT_API_KEY"));
        set(&mut self.recognizer.endpoint, env("HEADCOUNT_API_ENDPOINT"));
        set(&mut self.broker.host, env("HEADCOUNT_BROKER_HOST"));
        set(&mut self.broker.port, parsed(&env, "HEADCOUNT_BROKER_PORT")?);
        set(&mut self.broker.client_id, env("HEADCOUNT_CLIENT_ID"));
        set(&mut self.broker.username, env("HEADCOUNT_USERNAME"));
        set(&mut self.broker.password, env("HEADCOUNT_PASSWORD"));
        set(&mut self.broker.topic, env("HEADCOUNT_TOPIC"));
        set(
            &mut self.broker.keep_alive,
            parsed(&env, "HEADCOUNT_KEEP_ALIVE_SECS")?.map(Duration::from_secs),
        );
        set(
            &mut self.poll_interval,
            parsed(&env, "HEADCOUNT_POLL_INTERVAL_SECS")?.map(Duration::from_secs),
        );
        Ok(())
    }

    /// Check the settings the recognition step needs.
    pub fn validate_recognizer(&self) -> Result<(), ConfigError> {
        if self.recognizer.api_key.is_empty() {
            return Err(ConfigError::Missing("HEADCOUNT_API_KEY"));
        }
        Ok(())
    }

    /// Check the settings the broker connection needs.
    pub fn validate_broker(&self) -> Result<(), ConfigError> {
        if self.broker.host.is_empty() {
            return Err(ConfigError::Missing("HEADCOUNT_BROKER_HOST"));
        }
        if self.broker.client_id.is_empty() {
            return Err(ConfigError::Missing("HEADCOUNT_CLIENT_ID"));
        }
        if self.broker.password.is_empty() {
            return Err(ConfigError::Missing("HEADCOUNT_PASSWORD"));
        }
        let keep_alive = self.broker.keep_alive.as_secs();
        if keep_alive < 5 {
            return Err(ConfigError::KeepAliveTooShort(keep_alive));
        }
        Ok(())
    }

    /// Check everything the daemon needs to run its polling loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_recognizer()?;
        self.validate_broker()?;
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn parsed<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match env(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::BadValue {
                key: key.to_string(),
                value,
            }),
        None => Ok(None),
    }
}
