use std::time::Duration;

/// A simple wrapper around `reqwest::Client` used to manage HTTP requests
/// with a preconfigured base URL and a per-source timeout.
///
/// One client is built per remote source: the bulk catalog gets a generous
/// timeout (the payload is a large text file), the live-fix endpoint a
/// short one. A timeout is treated like any other fetch failure by the
/// resolution engine.
#[derive(Debug)]
pub struct HTTPClient {
    /// The underlying `reqwest::Client` used to perform HTTP requests.
    client: reqwest::Client,
    /// Base URL for the source, prepended to all endpoint paths.
    base_url: String,
}

impl HTTPClient {
    /// Constructs a new `HTTPClient` for one remote source.
    ///
    /// # Arguments
    /// * `base_url` – The root URL for all requests to this source.
    /// * `timeout` – The request timeout; elapsed means the fetch failed.
    ///
    /// # Returns
    /// A configured `HTTPClient` instance.
    pub fn new(base_url: &str, timeout: Duration) -> HTTPClient {
        HTTPClient {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap(),
            base_url: String::from(base_url),
        }
    }

    /// Returns a reference to the internal `reqwest::Client`.
    pub(super) fn client(&self) -> &reqwest::Client { &self.client }

    /// Returns the base URL that the client was initialized with.
    pub fn url(&self) -> &str { self.base_url.as_str() }
}
