use crate::gfx::{SamplerFilter, SamplerWrap};
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

pub const CONFIG_PATH: &str = "gltexstate.ini";
const SECTION: &str = "Textures";

// --- Minimal INI reader ---
#[derive(Debug, Default)]
pub struct SimpleIni {
    sections: HashMap<String, HashMap<String, String>>,
}

impl SimpleIni {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        self.parse(&content);
        Ok(())
    }

    pub fn parse(&mut self, content: &str) {
        self.sections.clear();
        let mut current_section = String::new();

        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            // Section header: [SectionName]
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current_section = name.trim().to_string();
                self.sections.entry(current_section.clone()).or_default();
                continue;
            }

            // Key/value pair: key=value
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                if key.is_empty() {
                    continue;
                }
                self.sections
                    .entry(current_section.clone())
                    .or_default()
                    .insert(key.to_string(), value.trim().to_string());
            }
        }
    }

    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.sections.get(section).and_then(|s| s.get(key)).cloned()
    }
}

/// What a sampler setter does when the caller did not request a rebind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BindPolicy {
    /// Assume the texture is already bound on the target.
    Trust,
    /// Bind through the context's binding tracker when it disagrees.
    #[default]
    Verify,
}

impl BindPolicy {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Trust => "Trust",
            Self::Verify => "Verify",
        }
    }
}

impl FromStr for BindPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trust" => Ok(Self::Trust),
            "verify" => Ok(Self::Verify),
            _ => Err(format!("'{s}' is not a valid bind policy")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }

    pub const fn as_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(format!("'{s}' is not a valid log level")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureConfig {
    pub bind_policy: BindPolicy,
    /// Wrap mode a fresh texture assumes the driver holds.
    pub default_wrap: SamplerWrap,
    /// Filter a fresh texture assumes the driver holds.
    pub default_filter: SamplerFilter,
    pub log_level: LogLevel,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            bind_policy: BindPolicy::Verify,
            default_wrap: SamplerWrap::Clamp,
            default_filter: SamplerFilter::Nearest,
            log_level: LogLevel::Warn,
        }
    }
}

fn read_key<T: FromStr<Err = String>>(conf: &SimpleIni, key: &str, default: T) -> T {
    match conf.get(SECTION, key).map(|v| T::from_str(&v)) {
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            warn!("Ignoring [{SECTION}] {key}: {e}");
            default
        }
        None => default,
    }
}

impl TextureConfig {
    pub fn from_ini(conf: &SimpleIni) -> Self {
        let default = Self::default();
        Self {
            bind_policy: read_key(conf, "BindPolicy", default.bind_policy),
            default_wrap: read_key(conf, "DefaultWrap", default.default_wrap),
            default_filter: read_key(conf, "DefaultFilter", default.default_filter),
            log_level: read_key(conf, "LogLevel", default.log_level),
        }
    }

    pub fn from_ini_str(content: &str) -> Self {
        let mut conf = SimpleIni::new();
        conf.parse(content);
        Self::from_ini(&conf)
    }

    /// Loads `path`, falling back to defaults when it is missing or unreadable.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let mut conf = SimpleIni::new();
        match conf.load(path) {
            Ok(()) => {
                let cfg = Self::from_ini(&conf);
                info!("Loaded texture config from '{}': {cfg:?}", path.display());
                cfg
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("'{}' not found, using default texture config.", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Failed to read '{}': {e}. Using defaults.", path.display());
                Self::default()
            }
        }
    }

    pub fn to_ini_string(&self) -> String {
        let mut content = String::new();
        // Keys in alphabetical order.
        content.push_str(&format!("[{SECTION}]\n"));
        content.push_str(&format!("BindPolicy={}\n", self.bind_policy.as_str()));
        content.push_str(&format!("DefaultFilter={}\n", self.default_filter));
        content.push_str(&format!("DefaultWrap={}\n", self.default_wrap));
        content.push_str(&format!("LogLevel={}\n", self.log_level.as_str()));
        content
    }

    pub fn write_default_file<P: AsRef<Path>>(path: P) -> Result<(), std::io::Error> {
        info!("Writing default texture config to '{}'.", path.as_ref().display());
        std::fs::write(path, Self::default().to_ini_string())
    }
}
