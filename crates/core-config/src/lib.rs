//! Rotation option loading and resolution.
//!
//! Each widget instance gets one immutable [`RotateOptions`] value built at
//! construction from four layers, highest precedence first:
//!
//! 1. Explicit call options ([`OptionOverrides`]).
//! 2. Element attributes `data-delim` / `data-interval` ([`AttributeSource`]),
//!    read once. Empty attribute values count as absent.
//! 3. The `[rotate]` table of `rotatewords.toml` (or an override path
//!    provided by the binary).
//! 4. Built-in defaults: delimiter `","`, interval 2000 ms.
//!
//! Malformed values in layers 2 and 3 are skipped with a warning so the next
//! layer applies; nothing here fails the caller. Unknown TOML fields are
//! ignored to allow forward evolution.

use anyhow::Result;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use std::{fs, path::PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_DELIM: &str = ",";
pub const DEFAULT_INTERVAL_MS: u64 = 2000;

/// Element attribute names consulted during resolution.
pub const ATTR_DELIM: &str = "data-delim";
pub const ATTR_INTERVAL: &str = "data-interval";

const CONFIG_FILE_NAME: &str = "rotatewords.toml";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionError {
    #[error("interval `{0}` is not a whole number of milliseconds")]
    InvalidInterval(String),
    #[error("interval must be greater than zero")]
    ZeroInterval,
}

/// Parse an interval given as text (attribute values are strings).
pub fn parse_interval(raw: &str) -> Result<u64, OptionError> {
    let ms = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| OptionError::InvalidInterval(raw.to_string()))?;
    if ms == 0 {
        return Err(OptionError::ZeroInterval);
    }
    Ok(ms)
}

/// Per-instance options. Constructed once; never shared or mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotateOptions {
    delim: String,
    interval: Duration,
}

impl Default for RotateOptions {
    fn default() -> Self {
        Self {
            delim: DEFAULT_DELIM.to_string(),
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
        }
    }
}

impl RotateOptions {
    /// Interval is raised to at least 1 ms; a zero period cannot drive a timer.
    pub fn new(delim: impl Into<String>, interval_ms: u64) -> Self {
        Self {
            delim: delim.into(),
            interval: Duration::from_millis(interval_ms.max(1)),
        }
    }

    pub fn delim(&self) -> &str {
        &self.delim
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Options supplied explicitly by the caller at initialization time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionOverrides {
    pub delim: Option<String>,
    pub interval_ms: Option<u64>,
}

impl OptionOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delim(mut self, delim: impl Into<String>) -> Self {
        self.delim = Some(delim.into());
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = Some(interval_ms);
        self
    }
}

/// String-typed key/value attributes attached to a host element.
pub trait AttributeSource {
    fn attribute(&self, name: &str) -> Option<String>;
}

impl AttributeSource for HashMap<String, String> {
    fn attribute(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl AttributeSource for BTreeMap<String, String> {
    fn attribute(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Element without attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAttributes;

impl AttributeSource for NoAttributes {
    fn attribute(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Which layer supplied a resolved value (logged, and asserted in tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSource {
    Call,
    Attribute,
    File,
    Default,
}

impl OptionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionSource::Call => "call",
            OptionSource::Attribute => "attribute",
            OptionSource::File => "file",
            OptionSource::Default => "default",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub options: RotateOptions,
    pub delim_source: OptionSource,
    pub interval_source: OptionSource,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RotateSection {
    #[serde(default)]
    pub delim: Option<String>,
    #[serde(default)]
    pub interval: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub rotate: RotateSection,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("rotatewords").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        debug!(target: "config", path = %path.display(), "config_file_absent");
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => Ok(Config {
            raw: Some(content),
            file,
        }),
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Resolve the options of one instance.
    pub fn resolve(
        &self,
        attrs: &dyn AttributeSource,
        overrides: &OptionOverrides,
    ) -> Resolved {
        let (delim, delim_source) = self.resolve_delim(attrs, overrides);
        let (interval_ms, interval_source) = self.resolve_interval(attrs, overrides);
        debug!(
            target: "config",
            delim_source = delim_source.as_str(),
            interval_source = interval_source.as_str(),
            interval_ms,
            "options_resolved"
        );
        Resolved {
            options: RotateOptions::new(delim, interval_ms),
            delim_source,
            interval_source,
        }
    }

    fn resolve_delim(
        &self,
        attrs: &dyn AttributeSource,
        overrides: &OptionOverrides,
    ) -> (String, OptionSource) {
        if let Some(d) = &overrides.delim {
            return (d.clone(), OptionSource::Call);
        }
        if let Some(d) = attrs.attribute(ATTR_DELIM).filter(|v| !v.is_empty()) {
            return (d, OptionSource::Attribute);
        }
        if let Some(d) = self.file.rotate.delim.as_ref().filter(|v| !v.is_empty()) {
            return (d.clone(), OptionSource::File);
        }
        (DEFAULT_DELIM.to_string(), OptionSource::Default)
    }

    fn resolve_interval(
        &self,
        attrs: &dyn AttributeSource,
        overrides: &OptionOverrides,
    ) -> (u64, OptionSource) {
        if let Some(ms) = overrides.interval_ms {
            return (ms, OptionSource::Call);
        }
        if let Some(raw) = attrs.attribute(ATTR_INTERVAL).filter(|v| !v.is_empty()) {
            match parse_interval(&raw) {
                Ok(ms) => return (ms, OptionSource::Attribute),
                Err(e) => {
                    warn!(target: "config", attribute = ATTR_INTERVAL, error = %e, "attribute_ignored")
                }
            }
        }
        match self.file.rotate.interval {
            Some(0) => {
                warn!(target: "config", error = %OptionError::ZeroInterval, "file_interval_ignored")
            }
            Some(ms) => return (ms, OptionSource::File),
            None => {}
        }
        (DEFAULT_INTERVAL_MS, OptionSource::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn file_config(body: &str) -> Config {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), body).unwrap();
        load_from(Some(tmp.path().to_path_buf())).unwrap()
    }

    #[test]
    fn defaults_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        let r = cfg.resolve(&NoAttributes, &OptionOverrides::new());
        assert_eq!(r.options, RotateOptions::default());
        assert_eq!(r.options.delim(), ",");
        assert_eq!(r.options.interval(), Duration::from_millis(2000));
        assert_eq!(r.delim_source, OptionSource::Default);
        assert_eq!(r.interval_source, OptionSource::Default);
    }

    #[test]
    fn parses_rotate_section() {
        let cfg = file_config("[rotate]\ndelim = \"|\"\ninterval = 750\n");
        assert!(cfg.raw.is_some());
        let r = cfg.resolve(&NoAttributes, &OptionOverrides::new());
        assert_eq!(r.options, RotateOptions::new("|", 750));
        assert_eq!(r.delim_source, OptionSource::File);
        assert_eq!(r.interval_source, OptionSource::File);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let cfg = file_config("[rotate\ninterval = ");
        assert!(cfg.raw.is_none());
        let r = cfg.resolve(&NoAttributes, &OptionOverrides::new());
        assert_eq!(r.options, RotateOptions::default());
    }

    #[test]
    fn attribute_beats_file_and_call_beats_attribute() {
        let cfg = file_config("[rotate]\ndelim = \"|\"\ninterval = 750\n");
        let el = attrs(&[(ATTR_DELIM, ";"), (ATTR_INTERVAL, "500")]);

        let r = cfg.resolve(&el, &OptionOverrides::new());
        assert_eq!(r.options, RotateOptions::new(";", 500));
        assert_eq!(r.delim_source, OptionSource::Attribute);

        let r = cfg.resolve(&el, &OptionOverrides::new().with_interval_ms(100));
        assert_eq!(r.options, RotateOptions::new(";", 100));
        assert_eq!(r.interval_source, OptionSource::Call);
        assert_eq!(r.delim_source, OptionSource::Attribute);

        let r = cfg.resolve(&el, &OptionOverrides::new().with_delim("/"));
        assert_eq!(r.options.delim(), "/");
    }

    #[test]
    fn empty_attribute_counts_as_absent() {
        let el = attrs(&[(ATTR_DELIM, ""), (ATTR_INTERVAL, "")]);
        let r = Config::default().resolve(&el, &OptionOverrides::new());
        assert_eq!(r.options, RotateOptions::default());
        assert_eq!(r.delim_source, OptionSource::Default);
    }

    #[test]
    fn explicit_empty_delim_is_kept() {
        let r = Config::default().resolve(&NoAttributes, &OptionOverrides::new().with_delim(""));
        assert_eq!(r.options.delim(), "");
        assert_eq!(r.delim_source, OptionSource::Call);
    }

    #[test]
    fn explicit_zero_interval_is_raised() {
        let r = Config::default().resolve(&NoAttributes, &OptionOverrides::new().with_interval_ms(0));
        assert_eq!(r.options.interval(), Duration::from_millis(1));
    }

    #[test]
    fn parse_interval_rejects_garbage_and_zero() {
        assert_eq!(parse_interval(" 250 "), Ok(250));
        assert_eq!(
            parse_interval("fast"),
            Err(OptionError::InvalidInterval("fast".into()))
        );
        assert_eq!(parse_interval("-5"), Err(OptionError::InvalidInterval("-5".into())));
        assert_eq!(parse_interval("0"), Err(OptionError::ZeroInterval));
    }

    #[test]
    fn zero_file_interval_falls_through_to_default() {
        let cfg = file_config("[rotate]\ninterval = 0\n");
        let r = cfg.resolve(&NoAttributes, &OptionOverrides::new());
        assert_eq!(r.options.interval(), Duration::from_millis(DEFAULT_INTERVAL_MS));
        assert_eq!(r.interval_source, OptionSource::Default);
    }

    #[test]
    fn bad_attribute_logs_warning_and_uses_next_layer() {
        let cfg = file_config("[rotate]\ninterval = 900\n");
        let el = attrs(&[(ATTR_INTERVAL, "soon")]);
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::WARN)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        let r = with_default(subscriber, || cfg.resolve(&el, &OptionOverrides::new()));

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("WARN config:"));
        assert!(log_output.contains("attribute_ignored"));
        assert_eq!(r.options.interval(), Duration::from_millis(900));
        assert_eq!(r.interval_source, OptionSource::File);
    }
}
