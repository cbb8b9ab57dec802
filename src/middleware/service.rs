//! Tower service layer for the payment gate

use super::payment::PaymentGate;
use axum::{extract::Request, response::Response};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Tower layer that puts a [`PaymentGate`] in front of a service
///
/// Usable with `Router::route_layer` as an alternative to
/// `axum::middleware::from_fn_with_state`.
#[derive(Debug, Clone)]
pub struct PaymentGateLayer {
    gate: PaymentGate,
}

impl PaymentGateLayer {
    pub fn new(gate: PaymentGate) -> Self {
        Self { gate }
    }
}

impl<S> tower::Layer<S> for PaymentGateLayer {
    type Service = PaymentGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PaymentGateService {
            inner,
            gate: self.gate.clone(),
        }
    }
}

/// Tower service for the payment gate
#[derive(Debug, Clone)]
pub struct PaymentGateService<S> {
    inner: S,
    gate: PaymentGate,
}

impl<S> tower::Service<Request> for PaymentGateService<S>
where
    S: tower::Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        // Keep the service that was driven to readiness, leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let gate = self.gate.clone();

        Box::pin(async move {
            let response = gate
                .handle(request, move |request| async move {
                    match inner.call(request).await {
                        Ok(response) => response,
                        Err(never) => match never {},
                    }
                })
                .await;
            Ok(response)
        })
    }
}
