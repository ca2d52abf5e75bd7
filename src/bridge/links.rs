use url::Url;

use super::BridgeError;

/// Schemes that may be handed to the OS default handler
pub const EXTERNAL_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Parse `raw` and make sure it is safe to open outside the app
pub fn parse_external_url(raw: &str) -> Result<Url, BridgeError> {
    let url = Url::parse(raw.trim()).map_err(|e| BridgeError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !EXTERNAL_SCHEMES.contains(&url.scheme()) {
        return Err(BridgeError::DisallowedScheme {
            scheme: url.scheme().to_string(),
        });
    }

    Ok(url)
}

/// Where a navigation attempt inside the main window should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Same origin as the gateway UI; let the webview load it
    Allow,
    /// Leaves the app; open with the OS default handler instead
    OpenExternally(Url),
    /// Neither: drop it
    Deny,
}

/// Decides navigations in the main window against the gateway origin
#[derive(Debug, Clone)]
pub struct NavigationPolicy {
    gateway: Url,
}

impl NavigationPolicy {
    pub fn new(gateway_url: &str) -> Result<Self, BridgeError> {
        let gateway = Url::parse(gateway_url).map_err(|e| BridgeError::InvalidUrl {
            url: gateway_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { gateway })
    }

    pub fn is_gateway_origin(&self, url: &Url) -> bool {
        url.origin() == self.gateway.origin()
    }

    pub fn decide(&self, url: &Url) -> Navigation {
        // Internal webview pages (about:blank, devtools) are harmless
        if self.is_gateway_origin(url) || url.scheme() == "about" {
            return Navigation::Allow;
        }

        if EXTERNAL_SCHEMES.contains(&url.scheme()) {
            Navigation::OpenExternally(url.clone())
        } else {
            tracing::warn!("Blocked navigation to {}", url);
            Navigation::Deny
        }
    }

    /// Requests for a new window (`target=_blank`, `window.open`) never get
    /// one; openable URLs go to the OS handler, even on the gateway origin
    pub fn decide_new_window(&self, url: &Url) -> Navigation {
        if EXTERNAL_SCHEMES.contains(&url.scheme()) {
            Navigation::OpenExternally(url.clone())
        } else {
            tracing::warn!("Blocked new window for {}", url);
            Navigation::Deny
        }
    }
}
