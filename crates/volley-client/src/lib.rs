pub mod endpoints;
pub mod fetcher;
pub mod http;
pub mod session;

pub use endpoints::{DEFAULT_SERVICE, XrpcEndpoints};
pub use fetcher::ReqwestFetcher;
pub use http::{HttpClientConfig, build_client};
pub use session::ReqwestAuthenticator;
