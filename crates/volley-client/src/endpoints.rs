use url::Url;
use volley_core::error::AppError;

pub const DEFAULT_SERVICE: &str = "https://bsky.social";

/// XRPC method URLs under a service base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrpcEndpoints {
    base: Url,
}

impl XrpcEndpoints {
    /// Validate `service` (http/https only) and normalise it to a directory URL.
    pub fn new(service: &str) -> Result<Self, AppError> {
        let mut base = Url::parse(service)
            .map_err(|e| AppError::ConfigError(format!("Invalid service URL '{service}': {e}")))?;

        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(AppError::ConfigError(format!(
                "Service URL '{service}' must be an http or https URL"
            )));
        }

        base.set_query(None);
        base.set_fragment(None);
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self { base })
    }

    pub fn base(&self) -> &str {
        self.base.as_str()
    }

    /// `{service}/xrpc/{nsid}`
    pub fn method(&self, nsid: &str) -> Url {
        let mut url = self.base.clone();
        let path = format!("{}xrpc/{nsid}", self.base.path());
        url.set_path(&path);
        url
    }

    pub fn create_session(&self) -> String {
        self.method("com.atproto.server.createSession").into()
    }

    pub fn get_profile(&self, actor: &str) -> String {
        self.with_actor("app.bsky.actor.getProfile", actor)
    }

    pub fn get_actor_feeds(&self, actor: &str) -> String {
        self.with_actor("app.bsky.feed.getActorFeeds", actor)
    }

    /// Resources fetched when no explicit URLs are given.
    pub fn default_targets(&self, actor: &str) -> Vec<String> {
        vec![self.get_profile(actor), self.get_actor_feeds(actor)]
    }

    fn with_actor(&self, nsid: &str, actor: &str) -> String {
        let mut url = self.method(nsid);
        url.query_pairs_mut().append_pair("actor", actor);
        url.into()
    }
}
