//! Pool configuration options

use std::time::Duration;

/// Default checkout limit before a resource is closed on release
pub const DEFAULT_MAX_USES: usize = 100;

/// Default idle duration after which the sweeper closes a resource
pub const DEFAULT_MAX_IDLE: Duration = Duration::from_secs(3600);

pub(crate) const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Initial tuning for pool behavior.
///
/// `max_uses` and `max_idle` can also be changed on a live pool through
/// [`Pool::set_max_uses`](crate::Pool::set_max_uses) and
/// [`Pool::set_max_idle`](crate::Pool::set_max_idle).
///
/// # Examples
///
/// ```
/// use esox_connpool::PoolConfig;
/// use std::time::Duration;
///
/// let config = PoolConfig::new()
///     .with_max_uses(50)
///     .with_max_idle(Duration::from_secs(600))
///     .with_operation_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.max_uses, 50);
/// assert_eq!(config.max_idle, Duration::from_secs(600));
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PoolConfig {
    /// How many checkouts a resource may serve before release closes it
    pub max_uses: usize,

    /// How long a resource may sit available before the sweeper closes it
    pub max_idle: Duration,

    /// Probe resources with [`ResourceFactory::validate`] on every reuse.
    ///
    /// Off by default: validating each checkout costs a round trip per
    /// acquire, which is the wrong default for pools that exist to avoid
    /// exactly that.
    ///
    /// [`ResourceFactory::validate`]: crate::ResourceFactory::validate
    pub validate_on_checkout: bool,

    /// Deadline for the async acquire wrapper; `None` waits indefinitely
    pub operation_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_uses: DEFAULT_MAX_USES,
            max_idle: DEFAULT_MAX_IDLE,
            validate_on_checkout: false,
            operation_timeout: Some(DEFAULT_OPERATION_TIMEOUT),
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the checkout limit
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_connpool::PoolConfig;
    ///
    /// let config = PoolConfig::new().with_max_uses(2);
    /// assert_eq!(config.max_uses, 2);
    /// ```
    pub fn with_max_uses(mut self, max_uses: usize) -> Self {
        self.max_uses = max_uses;
        self
    }

    /// Set the idle limit
    pub fn with_max_idle(mut self, max_idle: Duration) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// Enable the checkout validation probe
    pub fn with_validation(mut self) -> Self {
        self.validate_on_checkout = true;
        self
    }

    /// Set the async operation deadline
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }
}
