use reqwest::Url;

use crate::models::PaymentSession;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RedirectError {
    #[error("payment session id is empty")]
    EmptySession,

    #[error("payment redirect url is not http(s): {0}")]
    BadBaseUrl(String),
}

/// Hands a backend-created payment session to the external payment page.
#[derive(Debug, Clone)]
pub struct PaymentRedirect {
    base_url: String,
}

impl PaymentRedirect {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }

    pub fn redirect_url(&self, session: &PaymentSession) -> Result<String, RedirectError> {
        let id = session.id.trim();
        if id.is_empty() {
            return Err(RedirectError::EmptySession);
        }
        let bad_base = || RedirectError::BadBaseUrl(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| bad_base())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(bad_base());
        }
        // the id is one path segment, whatever characters the backend put in it
        url.path_segments_mut()
            .map_err(|_| bad_base())?
            .pop_if_empty()
            .push(id);
        Ok(url.into())
    }
}
