use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{AncestorAttribution, PedigreeVerification, VerifiedAttribute};
use crate::reconcile::ReconcileError;
use crate::verifier::PedigreeVerifier;

/// Total request budget for one lookup. The verifier is a third-party
/// service; a hung call must not hang the reconciliation.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(4);

/// HTTP client for the external pedigree registry:
/// `GET {base}/verify-pedigree?id=<externalId>`.
pub struct HttpPedigreeVerifier {
    http: reqwest::Client,
    base_url: String,
    name: String,
}

impl HttpPedigreeVerifier {
    pub fn new(base_url: impl Into<String>, name: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build verifier HTTP client");

        HttpPedigreeVerifier {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            name: name.into(),
        }
    }
}

#[async_trait]
impl PedigreeVerifier for HttpPedigreeVerifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, external_id: &str) -> Result<PedigreeVerification, ReconcileError> {
        let url = format!("{}/verify-pedigree", self.base_url);
        debug!(external_id, "Calling external pedigree verifier");

        let response = self
            .http
            .get(&url)
            .query(&[("id", external_id)])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Pedigree verifier transport failure");
                ReconcileError::VerifierUnavailable(e.to_string())
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ReconcileError::VerifierUnavailable(e.to_string()))?;

        parse_lookup_response(external_id, status, &body)
    }
}

/// Wire envelope of the verifier. Anything that doesn't parse into this
/// shape is a service fault, not a "no such record" outcome.
#[derive(Debug, Deserialize)]
struct VerifierEnvelope {
    success: bool,
    data: Option<VerifierRecord>,
}

#[derive(Debug, Deserialize)]
struct VerifierRecord {
    sire: Option<String>,
    sire_registration: Option<String>,
    dam: Option<String>,
    dam_registration: Option<String>,
    pedigree_number: Option<String>,
    hd_score: Option<String>,
    ed_score: Option<String>,
    dsra_result: Option<String>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

/// Map a raw verifier response to the normalized preview, or the right
/// failure: non-200, malformed JSON and transport errors are all
/// `VerifierUnavailable`; a well-formed miss is `ExternalRecordNotFound`.
pub(crate) fn parse_lookup_response(
    external_id: &str,
    status: u16,
    body: &str,
) -> Result<PedigreeVerification, ReconcileError> {
    if status != 200 {
        return Err(ReconcileError::VerifierUnavailable(format!(
            "verifier returned HTTP {}",
            status
        )));
    }

    let envelope: VerifierEnvelope = serde_json::from_str(body).map_err(|e| {
        ReconcileError::VerifierUnavailable(format!("malformed verifier response: {}", e))
    })?;

    match envelope {
        VerifierEnvelope {
            success: true,
            data: Some(record),
        } => Ok(normalize(external_id, record)),
        _ => Err(ReconcileError::ExternalRecordNotFound(external_id.to_string())),
    }
}

fn normalize(external_id: &str, record: VerifierRecord) -> PedigreeVerification {
    let mut health_attributes = Vec::new();
    let mut push = |attribute: &str, value: &Option<String>| {
        if let Some(result) = value.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            health_attributes.push(VerifiedAttribute {
                attribute: attribute.to_string(),
                result: result.to_string(),
            });
        }
    };
    push("hd_score", &record.hd_score);
    push("ed_score", &record.ed_score);
    push("dsra_result", &record.dsra_result);

    // Unrecognized scalar fields ride along so a custom registry can map
    // them; structured values are dropped.
    let mut extra: Vec<_> = record.extra.into_iter().collect();
    extra.sort_by(|(a, _), (b, _)| a.cmp(b));
    for (attribute, value) in extra {
        if let Value::String(result) = value {
            if !result.trim().is_empty() {
                health_attributes.push(VerifiedAttribute {
                    attribute,
                    result: result.trim().to_string(),
                });
            }
        }
    }

    let ancestor = |name: &Option<String>, registration: &Option<String>| {
        name.as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| AncestorAttribution {
                name: n.to_string(),
                registration: registration.clone().filter(|r| !r.trim().is_empty()),
            })
    };

    PedigreeVerification {
        external_id: external_id.to_string(),
        pedigree_number: record.pedigree_number,
        sire: ancestor(&record.sire, &record.sire_registration),
        dam: ancestor(&record.dam, &record.dam_registration),
        health_attributes,
    }
}
