//! Accessors the resolver needs from the host framework's request and response.

use crate::error::{OAuth2Error, OAuth2Result};
use url::Url;

/// Read access to the inbound HTTP request.
pub trait InboundRequest {
    /// Absolute request URI, query string included.
    fn uri(&self) -> String;

    /// First value of the named query parameter.
    fn query_param(&self, name: &str) -> Option<String>;
}

/// Write access to the outbound HTTP response.
pub trait OutboundResponse {
    /// Send the user agent to `location`; any body is suppressed.
    fn redirect(&mut self, location: &str);
}

/// Callback URI for a request: the request URI with query and fragment cleared.
///
/// Both phases of the flow derive their `redirect_uri` through this function
/// so the provider sees byte-identical values.
pub fn callback_uri_from(request_uri: &str) -> OAuth2Result<String> {
    let mut url = Url::parse(request_uri)
        .map_err(|e| OAuth2Error::InvalidRequestUri(format!("{}: {}", request_uri, e)))?;

    if url.cannot_be_a_base() {
        return Err(OAuth2Error::InvalidRequestUri(format!(
            "{} is not a hierarchical URL",
            request_uri
        )));
    }

    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}

/// Query-parameter lookup over an absolute or origin-form URI string.
pub(crate) fn query_param_of(uri: &str, name: &str) -> Option<String> {
    let without_fragment = uri.split_once('#').map_or(uri, |(before, _)| before);
    let query = without_fragment.split_once('?')?.1;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Plain request descriptor for hosts that already have the absolute URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUri(pub String);

impl InboundRequest for RequestUri {
    fn uri(&self) -> String {
        self.0.clone()
    }

    fn query_param(&self, name: &str) -> Option<String> {
        query_param_of(&self.0, name)
    }
}
