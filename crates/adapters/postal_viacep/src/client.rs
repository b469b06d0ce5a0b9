//! HTTP client for the ViaCEP JSON API.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use tutorhub_app::ports::PostalCodeLookup;
use tutorhub_domain::error::{TutorHubError, UpstreamError};
use tutorhub_domain::postal::{PostalAddress, PostalCode};

/// Public ViaCEP endpoint.
pub const DEFAULT_BASE_URL: &str = "https://viacep.com.br/ws";

const SERVICE: &str = "ViaCEP";

/// ViaCEP answer for one code. Unknown codes come back as `{"erro": true}`,
/// and some deployments send `"erro": "true"` instead.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Body {
    erro: Option<Value>,
    cep: String,
    logradouro: String,
    complemento: String,
    bairro: String,
    localidade: String,
    uf: String,
}

impl Body {
    fn is_unknown(&self) -> bool {
        match &self.erro {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    fn into_address(self) -> Option<PostalAddress> {
        if self.is_unknown() {
            return None;
        }
        Some(PostalAddress {
            postal_code: self.cep,
            street: self.logradouro,
            complement: self.complemento,
            district: self.bairro,
            city: self.localidade,
            state: self.uf,
        })
    }
}

/// [`PostalCodeLookup`] backed by ViaCEP.
#[derive(Clone)]
pub struct ViaCepClient {
    http: reqwest::Client,
    base_url: String,
}

impl ViaCepClient {
    /// Query `base_url`, giving up on any request after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the [`reqwest::Error`] raised when the TLS backend cannot be
    /// initialised.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, code: &PostalCode) -> String {
        format!("{}/{code}/json/", self.base_url)
    }
}

impl PostalCodeLookup for ViaCepClient {
    fn lookup(
        &self,
        code: &PostalCode,
    ) -> impl Future<Output = Result<Option<PostalAddress>, TutorHubError>> + Send {
        let http = self.http.clone();
        let url = self.url(code);
        async move {
            let resp = http.get(&url).send().await.map_err(|err| {
                tracing::error!(error = %err, url, "postal code lookup failed");
                UpstreamError::Unreachable { service: SERVICE }
            })?;

            let status = resp.status();
            if status != reqwest::StatusCode::OK {
                tracing::warn!(%status, url, "postal code directory refused the lookup");
                return Err(UpstreamError::BadStatus {
                    service: SERVICE,
                    status: status.as_u16(),
                }
                .into());
            }

            let body: Body = resp.json().await.map_err(|err| {
                tracing::error!(error = %err, url, "unreadable postal code answer");
                UpstreamError::InvalidResponse { service: SERVICE }
            })?;
            Ok(body.into_address())
        }
    }
}
