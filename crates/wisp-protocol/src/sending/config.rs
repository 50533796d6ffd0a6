/// Default upper bound on an encoded message (1 MiB).
pub const DEFAULT_MAX_CONTENT_SIZE: usize = 1024 * 1024;

/// Environment variable overriding [`DEFAULT_MAX_CONTENT_SIZE`].
pub const MAX_CONTENT_SIZE_ENV: &str = "WISP_MAX_CONTENT_SIZE";

/// Configuration for a [`MessageSender`](super::MessageSender).
///
/// ```rust
/// use wisp_protocol::SenderConfig;
///
/// let config = SenderConfig::new()
///     .max_content_size(256 * 1024)
///     .dedupe_in_flight(false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfig {
    /// Encoded messages above this size are rejected before storing.
    pub(crate) max_content_size: usize,
    /// Share one store operation between concurrent sends of the same
    /// message to the same destination.
    pub(crate) dedupe_in_flight: bool,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SenderConfig {
    /// Create a config with defaults.
    ///
    /// If `WISP_MAX_CONTENT_SIZE` is set to a valid byte count it replaces
    /// the default limit. This can be overridden with
    /// [`.max_content_size()`](Self::max_content_size).
    pub fn new() -> Self {
        let env = std::env::var(MAX_CONTENT_SIZE_ENV).ok();
        Self {
            max_content_size: max_content_size_from(env.as_deref()),
            dedupe_in_flight: true,
        }
    }

    /// Set the encoded size limit in bytes.
    pub fn max_content_size(mut self, bytes: usize) -> Self {
        self.max_content_size = bytes;
        self
    }

    /// Enable or disable in-flight deduplication (default: enabled).
    pub fn dedupe_in_flight(mut self, enabled: bool) -> Self {
        self.dedupe_in_flight = enabled;
        self
    }

    pub fn max_content_size_bytes(&self) -> usize {
        self.max_content_size
    }

    pub fn dedupes_in_flight(&self) -> bool {
        self.dedupe_in_flight
    }
}

fn max_content_size_from(value: Option<&str>) -> usize {
    match value.map(str::trim) {
        None => DEFAULT_MAX_CONTENT_SIZE,
        Some(raw) => match raw.parse::<usize>() {
            Ok(bytes) if bytes > 0 => bytes,
            _ => {
                tracing::warn!(
                    value = raw,
                    "ignoring invalid {MAX_CONTENT_SIZE_ENV}, using default"
                );
                DEFAULT_MAX_CONTENT_SIZE
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides() {
        let config = SenderConfig::new().max_content_size(10).dedupe_in_flight(false);
        assert_eq!(config.max_content_size_bytes(), 10);
        assert!(!config.dedupes_in_flight());
    }

    #[test]
    fn env_value_parsing() {
        assert_eq!(max_content_size_from(None), DEFAULT_MAX_CONTENT_SIZE);
        assert_eq!(max_content_size_from(Some("2048")), 2048);
        assert_eq!(max_content_size_from(Some(" 4096 ")), 4096);
        assert_eq!(max_content_size_from(Some("0")), DEFAULT_MAX_CONTENT_SIZE);
        assert_eq!(max_content_size_from(Some("lots")), DEFAULT_MAX_CONTENT_SIZE);
    }

    #[test]
    fn dedupe_defaults_on() {
        assert!(SenderConfig::default().dedupes_in_flight());
    }
}
