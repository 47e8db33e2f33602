// ABOUTME: Network edge for venuemap: a blocking page fetcher and a Places geocoder.
// ABOUTME: Both plug into the injection points exposed by venuemap-core.

pub mod client;
pub mod error;
pub mod geocoder;
pub mod options;
pub mod resource;

pub use client::{parse_http_url, Fetcher};
pub use error::{ErrorCode, FetchError};
pub use geocoder::{PlacesGeocoder, FIND_PLACE_URL};
pub use options::{ClientBuilder, Options, DEFAULT_USER_AGENT};
pub use resource::decode_body;
