//! Error taxonomy for marketplace calls.

/// Errors from the eBay client layer.
///
/// The pipeline never propagates these raw; it converts them into local
/// state plus audit entries. What it needs from the type is the
/// classification: retryable or not, offer-layer or not.
#[derive(Debug, thiserror::Error)]
pub enum EbayError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// eBay returned a non-2xx status outside the offer layer.
    #[error("eBay API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for diagnostics.
        body: String,
    },

    /// A failure in the offer layer (offer creation or publication).
    /// Distinguished so the publisher can run its compensating
    /// offer-existence check.
    #[error("eBay offer error ({status}): {body}")]
    Offer { status: u16, body: String },

    /// Authentication or authorization failure. Never retryable.
    #[error("eBay auth error: {0}")]
    Auth(String),

    /// The marketplace asked us to back off.
    #[error("eBay rate limit hit")]
    RateLimited,
}

impl EbayError {
    /// Whether a retry may succeed without operator intervention.
    ///
    /// Timeouts, 5xx responses, and rate limiting are retryable; bad
    /// requests and auth failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            EbayError::Transport(_) | EbayError::RateLimited => true,
            EbayError::Api { status, .. } | EbayError::Offer { status, .. } => *status >= 500,
            EbayError::Auth(_) => false,
        }
    }

    /// Whether this failure happened in the offer layer.
    pub fn is_offer_layer(&self) -> bool {
        matches!(self, EbayError::Offer { .. })
    }
}
