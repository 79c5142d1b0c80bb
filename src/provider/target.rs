use std::fmt;

use crate::error::ValidationError;

/// Provider REST operations this service forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    SetActivity,
    SetSubscriptionDiscount,
    SetSubscriptionPaymentDate,
}

impl Endpoint {
    pub const ALL: [Endpoint; 3] = [
        Endpoint::SetActivity,
        Endpoint::SetSubscriptionDiscount,
        Endpoint::SetSubscriptionPaymentDate,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Endpoint::SetActivity => "setActivity",
            Endpoint::SetSubscriptionDiscount => "setSubscriptionDiscount",
            Endpoint::SetSubscriptionPaymentDate => "setSubscriptionPaymentDate",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a signed request goes: the provider host and the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderTarget {
    domain: String,
    endpoint: Endpoint,
}

impl ProviderTarget {
    /// Accepts either a bare host or a URL with an `http://`/`https://` scheme.
    pub fn new(prodamus_url: &str, endpoint: Endpoint) -> Result<Self, ValidationError> {
        let trimmed = prodamus_url.trim();
        let domain = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed)
            .trim_end_matches('/');

        if domain.is_empty() || domain.contains(char::is_whitespace) {
            return Err(ValidationError::InvalidProviderUrl(prodamus_url.to_owned()));
        }

        Ok(Self {
            domain: domain.to_owned(),
            endpoint,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn url(&self, scheme: &str) -> String {
        format!("{scheme}://{}/rest/{}/", self.domain, self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_https_scheme() {
        let target = ProviderTarget::new("https://shop.payform.ru", Endpoint::SetActivity).unwrap();
        assert_eq!(target.domain(), "shop.payform.ru");
        assert_eq!(target.url("https"), "https://shop.payform.ru/rest/setActivity/");
    }

    #[test]
    fn strips_http_scheme_and_still_uses_https() {
        let target =
            ProviderTarget::new("http://shop.payform.ru/", Endpoint::SetSubscriptionDiscount)
                .unwrap();
        assert_eq!(
            target.url("https"),
            "https://shop.payform.ru/rest/setSubscriptionDiscount/"
        );
    }

    #[test]
    fn accepts_bare_host() {
        let target =
            ProviderTarget::new("shop.payform.ru", Endpoint::SetSubscriptionPaymentDate).unwrap();
        assert_eq!(
            target.url("https"),
            "https://shop.payform.ru/rest/setSubscriptionPaymentDate/"
        );
    }

    #[test]
    fn rejects_empty_domain() {
        assert!(ProviderTarget::new("https://", Endpoint::SetActivity).is_err());
        assert!(ProviderTarget::new("   ", Endpoint::SetActivity).is_err());
    }
}
