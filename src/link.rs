/// Page URL handling for hash-routed share links
///
/// Share links look like `<origin>/<path>#/<route>?share=gz_<token>`. The
/// share parameter lives inside the fragment, next to the route's own
/// parameters, so the page itself never sends it to a server.
use crate::error::{Result, ShareError};
use regex::Regex;
use url::Url;
use url::form_urlencoded;

/// A page address split into the parts share links care about
#[derive(Debug, Clone, PartialEq)]
pub struct PageLocation {
    /// Origin, path and page query; everything before `#`
    base: String,
    /// Client-side route, e.g. `/` or `/rqda`
    route: String,
    /// Raw `name=value` pairs after the route's `?`
    params: Vec<String>,
}

impl PageLocation {
    pub fn parse(href: &str) -> Result<Self> {
        let url = Url::parse(href).map_err(|e| ShareError::InvalidUrl(format!("{}: {}", href, e)))?;

        let mut base = format!("{}{}", url.origin().ascii_serialization(), url.path());
        if let Some(query) = url.query() {
            base.push('?');
            base.push_str(query);
        }

        let fragment = url.fragment().unwrap_or("");
        let (route, query) = match fragment.split_once('?') {
            Some((route, query)) => (route, query),
            None => (fragment, ""),
        };
        let route = if route.is_empty() { "/" } else { route };

        let params = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| pair.to_string())
            .collect();

        Ok(PageLocation {
            base,
            route: route.to_string(),
            params,
        })
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// Raw value of `param` inside the fragment, up to the next `&`
    pub fn raw_param(&self, param: &str) -> Option<String> {
        let pattern = Regex::new(&format!(r"(?:^|&){}=([^&]*)", regex::escape(param))).ok()?;
        let query = self.params.join("&");
        pattern
            .captures(&query)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Percent-decoded share token, if the fragment carries one
    pub fn share_token(&self, param: &str) -> Option<String> {
        let raw = self.raw_param(param)?;
        let decoded: String = form_urlencoded::parse(format!("t={}", raw).as_bytes())
            .next()
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        // Unescaped '+' from standard base64 comes back from form decoding as ' '
        Some(decoded.replace(' ', "+"))
    }

    pub fn has_param(&self, param: &str) -> bool {
        self.params.iter().any(|pair| param_name(pair) == param)
    }

    pub fn without_param(&self, param: &str) -> PageLocation {
        PageLocation {
            base: self.base.clone(),
            route: self.route.clone(),
            params: self
                .params
                .iter()
                .filter(|pair| param_name(pair) != param)
                .cloned()
                .collect(),
        }
    }

    /// Replace any existing `param` with a freshly encoded one at the end
    pub fn with_param(&self, param: &str, value: &str) -> PageLocation {
        let mut location = self.without_param(param);
        let encoded: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
        location.params.push(format!("{}={}", param, encoded));
        location
    }

    pub fn to_url(&self) -> String {
        if self.params.is_empty() {
            format!("{}#{}", self.base, self.route)
        } else {
            format!("{}#{}?{}", self.base, self.route, self.params.join("&"))
        }
    }
}

fn param_name(pair: &str) -> &str {
    pair.split_once('=').map_or(pair, |(name, _)| name)
}
