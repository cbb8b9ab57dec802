//! Payment gate implementation

use super::config::{PaymentGateConfig, SettlementMode};
use super::response::{self, Challenge};
use crate::facilitator::Facilitator;
use crate::types::{headers, FacilitatorResponse, PaymentDescriptor, PaymentProof, PaymentRequest};
use crate::{GateError, Result};
use axum::{
    extract::{Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use std::future::Future;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Payment gate guarding one protected resource
///
/// Cheap to clone; every clone shares the same descriptor, challenge and
/// facilitator.
#[derive(Clone)]
pub struct PaymentGate {
    descriptor: Arc<PaymentDescriptor>,
    challenge: Challenge,
    facilitator: Arc<dyn Facilitator>,
    config: Arc<PaymentGateConfig>,
    payment_ui: Option<HeaderValue>,
}

impl std::fmt::Debug for PaymentGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentGate")
            .field("descriptor", &self.descriptor)
            .field("challenge", &self.challenge.as_str())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// What the paying client learns about its payment, available to handlers
/// as a request extension after a grant
///
/// Built only from the descriptor and the facilitator's settlement record,
/// never from request headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentContext {
    /// Identifier of the gated request, also present in the gate's log span
    pub request_id: Uuid,
    /// Resource identity the payment was made for
    pub resource_url: String,
    /// Customer named by the resource URL
    pub customer_id: Option<String>,
    /// Payer reported by the facilitator
    pub payer: Option<String>,
    /// Settlement transaction reported by the facilitator
    pub receipt: Option<String>,
}

/// Why a request was answered with 402
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// No `x-payment` header was presented
    ProofAbsent,
    /// The facilitator answered with something other than 200
    ProofRejected {
        status: StatusCode,
        reason: Option<String>,
    },
    /// The facilitator could not be reached in time
    FacilitatorUnavailable { reason: String },
}

impl Denial {
    /// Message placed in the 402 body
    pub fn client_message(&self) -> &'static str {
        match self {
            Denial::ProofAbsent => response::PAYMENT_REQUIRED_MESSAGE,
            Denial::ProofRejected { .. } | Denial::FacilitatorUnavailable { .. } => {
                response::PAYMENT_REJECTED_MESSAGE
            }
        }
    }
}

/// Decision for one request
#[derive(Debug)]
pub enum GateResult {
    /// Payment settled; the protected handler runs
    Granted {
        response_headers: HeaderMap,
        context: PaymentContext,
    },
    /// 402 with the challenge
    Required {
        response_headers: HeaderMap,
        challenge: Challenge,
        denial: Denial,
    },
    /// 302 to the payment UI
    RedirectToPaymentUi { location: HeaderValue },
    /// CORS preflight, answered with an empty 200
    Preflight,
    /// The facilitator expects a different resource than the one we advertise
    Inconsistent { reason: String },
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Verify,
    Settle,
}

impl Step {
    fn as_str(self) -> &'static str {
        match self {
            Step::Verify => "verify",
            Step::Settle => "settle",
        }
    }
}

impl PaymentGate {
    /// Create a gate for one descriptor
    pub fn new(
        descriptor: PaymentDescriptor,
        facilitator: Arc<dyn Facilitator>,
        config: PaymentGateConfig,
    ) -> Result<Self> {
        config.validate()?;
        let challenge = Challenge::new(&descriptor)?;
        let payment_ui = config
            .payment_ui_url
            .as_deref()
            .map(HeaderValue::from_str)
            .transpose()
            .map_err(|_| GateError::config("Payment UI URL is not a valid header value"))?;

        Ok(Self {
            descriptor: Arc::new(descriptor),
            challenge,
            facilitator,
            config: Arc::new(config),
            payment_ui,
        })
    }

    /// Payment terms this gate enforces
    pub fn descriptor(&self) -> &PaymentDescriptor {
        &self.descriptor
    }

    /// Challenge string clients must countersign
    pub fn challenge(&self) -> &str {
        self.challenge.as_str()
    }

    /// Gate behaviour settings
    pub fn config(&self) -> &PaymentGateConfig {
        &self.config
    }

    /// Decide what to do with a request, without running the protected handler
    pub async fn evaluate(&self, parts: &Parts) -> GateResult {
        let request_id = Uuid::new_v4();
        let proof = parts
            .headers
            .get(headers::X_PAYMENT)
            .and_then(|value| value.to_str().ok())
            .and_then(PaymentProof::new);

        let span = tracing::info_span!(
            "payment_gate",
            %request_id,
            method = %parts.method,
            path = parts.uri.path(),
            proof_present = proof.is_some()
        );

        self.decide(parts, proof, request_id).instrument(span).await
    }

    async fn decide(
        &self,
        parts: &Parts,
        proof: Option<PaymentProof>,
        request_id: Uuid,
    ) -> GateResult {
        if parts.method == Method::OPTIONS {
            tracing::debug!("Answering preflight");
            return GateResult::Preflight;
        }

        if let Some(declared) = parts
            .headers
            .get(headers::X_PAYMENT_MESSAGE)
            .and_then(|value| value.to_str().ok())
        {
            if declared != self.challenge.as_str() {
                tracing::warn!(declared, "Client countersigned a different challenge");
            }
        }

        let request = PaymentRequest::new(self.descriptor.clone(), parts.method.clone(), proof);

        let Some(proof) = &request.proof else {
            if let Some(location) = self.navigation_target(parts) {
                tracing::info!(location = ?location, "Redirecting browser to payment UI");
                return GateResult::RedirectToPaymentUi { location };
            }
            return self.require_payment(&request).await;
        };
        tracing::debug!(proof = %proof.abbreviated(), "Payment proof presented");

        if self.config.settlement_mode == SettlementMode::VerifyThenSettle {
            match self.call(Step::Verify, &request).await {
                Ok(verified) if verified.is_success() => {
                    tracing::debug!("Proof verified, settling");
                }
                Ok(rejected) => return self.reject(rejected),
                Err(e) => return self.unavailable(e),
            }
        }

        match self.call(Step::Settle, &request).await {
            Ok(settled) if settled.is_success() => self.grant(settled, request_id),
            Ok(rejected) => self.reject(rejected),
            Err(e) => self.unavailable(e),
        }
    }

    /// Location of the payment UI when the request is a plain browser navigation
    fn navigation_target(&self, parts: &Parts) -> Option<HeaderValue> {
        let location = self.payment_ui.as_ref()?;
        if parts.method != Method::GET || parts.headers.contains_key(header::AUTHORIZATION) {
            return None;
        }
        let accepts_html = parts
            .headers
            .get_all(header::ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|accept| accept.to_ascii_lowercase().contains("text/html"));
        accepts_html.then(|| location.clone())
    }

    /// Ask the facilitator for its terms so its payment headers reach the client
    async fn require_payment(&self, request: &PaymentRequest) -> GateResult {
        let step = match self.config.settlement_mode {
            SettlementMode::SettleOnly => Step::Settle,
            SettlementMode::VerifyThenSettle => Step::Verify,
        };

        let response_headers = match self.call(step, request).await {
            Ok(response) => {
                if response.is_success() {
                    tracing::warn!("Facilitator accepted a request without proof, ignoring");
                }
                response.headers
            }
            Err(e) => {
                tracing::warn!(error = %e, "Facilitator unreachable while issuing challenge");
                HeaderMap::new()
            }
        };

        tracing::info!("Payment required");
        GateResult::Required {
            response_headers,
            challenge: self.challenge.clone(),
            denial: Denial::ProofAbsent,
        }
    }

    async fn call(&self, step: Step, request: &PaymentRequest) -> Result<FacilitatorResponse> {
        let call = async {
            match step {
                Step::Verify => self.facilitator.verify(request).await,
                Step::Settle => self.facilitator.settle(request).await,
            }
        };

        tokio::time::timeout(self.config.settle_timeout, call)
            .await
            .map_err(|_| {
                GateError::facilitator_unavailable(format!(
                    "{} timed out after {:?}",
                    step.as_str(),
                    self.config.settle_timeout
                ))
            })?
    }

    fn grant(&self, settled: FacilitatorResponse, request_id: Uuid) -> GateResult {
        let settlement = settled.settlement();
        let receipt = settlement
            .as_ref()
            .map(|s| s.transaction.clone())
            .filter(|transaction| !transaction.is_empty());
        let payer = settlement.and_then(|s| s.payer);

        tracing::info!(receipt = ?receipt, payer = ?payer, "Payment settled");

        let context = PaymentContext {
            request_id,
            resource_url: self.descriptor.resource_url.clone(),
            customer_id: self.descriptor.customer_id(),
            payer,
            receipt,
        };

        GateResult::Granted {
            response_headers: response::receipt_headers(&settled),
            context,
        }
    }

    fn reject(&self, rejected: FacilitatorResponse) -> GateResult {
        if let Some(resources) = rejected.accepted_resources() {
            let advertised = &self.descriptor.resource_url;
            if !resources.is_empty() && !resources.iter().any(|r| r == advertised) {
                let error = GateError::internal_inconsistency(format!(
                    "facilitator accepts {:?} but the gate advertises '{}'",
                    resources, advertised
                ));
                tracing::error!(error = %error, "Resource identity mismatch");
                return GateResult::Inconsistent {
                    reason: error.to_string(),
                };
            }
        }

        let reason = rejected.reason();
        tracing::info!(status = %rejected.status, reason = ?reason, "Payment rejected");
        GateResult::Required {
            response_headers: rejected.headers,
            challenge: self.challenge.clone(),
            denial: Denial::ProofRejected {
                status: rejected.status,
                reason,
            },
        }
    }

    fn unavailable(&self, error: GateError) -> GateResult {
        if error.is_transient() {
            tracing::warn!(error = %error, "Facilitator unavailable");
        } else {
            tracing::error!(error = %error, "Facilitator call failed");
        }
        GateResult::Required {
            response_headers: HeaderMap::new(),
            challenge: self.challenge.clone(),
            denial: Denial::FacilitatorUnavailable {
                reason: error.to_string(),
            },
        }
    }

    /// Run the gate around a handler
    ///
    /// `next` is only invoked for granted requests, with a [`PaymentContext`]
    /// inserted into the request extensions.
    pub async fn handle<F, Fut>(&self, request: Request, next: F) -> Response
    where
        F: FnOnce(Request) -> Fut,
        Fut: Future<Output = Response>,
    {
        let (mut parts, body) = request.into_parts();

        match self.evaluate(&parts).await {
            GateResult::Granted {
                response_headers,
                context,
            } => {
                parts.extensions.insert(context);
                let response = next(Request::from_parts(parts, body)).await;
                response::granted(response, response_headers)
            }
            GateResult::Required {
                response_headers,
                challenge,
                denial,
            } => response::payment_required(&challenge, &denial, response_headers),
            GateResult::RedirectToPaymentUi { location } => response::redirect(location),
            GateResult::Preflight => response::preflight(),
            GateResult::Inconsistent { .. } => response::internal_inconsistency(),
        }
    }
}

/// Axum middleware function for the payment gate
pub async fn payment_middleware(
    State(gate): State<PaymentGate>,
    request: Request,
    next: Next,
) -> Response {
    gate.handle(request, |request| next.run(request)).await
}
