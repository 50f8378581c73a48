//! The two-track control-flow engine.
//!
//! # State Machine
//! ```text
//! NormalDispatch ──Fail(f)──▶ ErrorDispatch(f) ──Fail(f')──▶ ErrorDispatch(f')
//!      ▲                            │
//!      └──────── Advance ───────────┘
//!
//! any state ──response written──▶ Terminated
//! NormalDispatch, sequence exhausted ──▶ 404 (no route) or ChainExhausted (500)
//! ErrorDispatch, no eligible handler ──▶ built-in fallback (500) ──▶ Terminated
//! ```
//!
//! # Design Decisions
//! - One dispatch per request over a context it owns exclusively
//! - Handlers run strictly one at a time, in flattened-sequence order
//! - The error track only scans forward from the failure point
//! - Every request ends with exactly one write, or a no-op if the client left

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use crate::observability::metrics;
use crate::pipeline::context::RequestContext;
use crate::pipeline::error_router::next_error_handler;
use crate::pipeline::failure::{DispatchViolation, Failure};
use crate::pipeline::handler::{Handler, Next, NormalHandler};
use crate::pipeline::sink::ResponseSink;
use crate::routing::matcher::Params;
use crate::routing::table::{Entry, Route, RouteTable};

/// Where the dispatcher currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchState {
    NormalDispatch,
    /// Carrying the failure waiting for an error handler.
    ErrorDispatch(Failure),
    Terminated,
}

/// What happened while dispatching one request.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// The selected route, e.g. `GET /hubs/:id`.
    pub route: Option<String>,
    /// Names of the handlers invoked, in order.
    pub handlers_run: Vec<&'static str>,
    pub violations: Vec<DispatchViolation>,
    pub status: Option<StatusCode>,
    pub used_fallback: bool,
    pub transport_closed: bool,
}

/// A normal-track stop in the flattened sequence.
enum NormalStep<'a> {
    /// A scoped handler and the params bound by its scope.
    Middleware(&'a Arc<dyn NormalHandler>, Params),
    Chain(&'a Route),
}

/// Walks the route table for each request. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    table: RouteTable,
}

impl Dispatcher {
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Run the request through the table until a response is written.
    pub async fn dispatch(
        &self,
        req: &mut RequestContext,
        res: &mut ResponseSink,
    ) -> DispatchReport {
        let entries = self.table.entries();
        let mut report = DispatchReport::default();

        let selected = match self.table.find(&req.method, &req.path) {
            Some(found) => {
                report.route = Some(format!("{} {}", found.route.method, found.route.pattern));
                req.params = found.params;
                Some(found.index)
            }
            None => None,
        };

        let mut state = DispatchState::NormalDispatch;
        let mut cursor = 0;

        while state != DispatchState::Terminated {
            if res.is_closed() {
                tracing::debug!(request_id = %req.request_id, "Transport closed, dispatch stopped");
                report.transport_closed = true;
                break;
            }

            state = match state {
                DispatchState::NormalDispatch => {
                    match next_normal_step(entries, cursor, &req.path, selected) {
                        Some((index, step)) => {
                            cursor = index + 1;
                            let next = match step {
                                NormalStep::Middleware(handler, params) => {
                                    req.params.extend(params);
                                    report.handlers_run.push(handler.name());
                                    handler.run(req, res).await
                                }
                                NormalStep::Chain(route) => {
                                    run_chain(route, req, res, &mut report).await
                                }
                            };
                            settle(next, req, res, &mut report)
                        }
                        None => {
                            exhausted(selected.is_some(), req, res, &mut report);
                            DispatchState::Terminated
                        }
                    }
                }
                DispatchState::ErrorDispatch(failure) => {
                    match next_error_handler(entries, cursor, &req.path) {
                        Some((index, handler, params)) => {
                            cursor = index + 1;
                            req.params.extend(params);
                            tracing::debug!(
                                request_id = %req.request_id,
                                handler = handler.name(),
                                failure = %failure,
                                "Error handler invoked"
                            );
                            report.handlers_run.push(handler.name());
                            let next = handler.handle(failure, req, res).await;
                            settle(next, req, res, &mut report)
                        }
                        None => {
                            fallback(&failure, req, res, &mut report);
                            DispatchState::Terminated
                        }
                    }
                }
                DispatchState::Terminated => DispatchState::Terminated,
            };
        }

        report.status = res.status();
        report
    }
}

fn next_normal_step<'a>(
    entries: &'a [Entry],
    from: usize,
    path: &str,
    selected: Option<usize>,
) -> Option<(usize, NormalStep<'a>)> {
    entries
        .iter()
        .enumerate()
        .skip(from)
        .find_map(|(index, entry)| match entry {
            Entry::Scoped {
                scope,
                handler: Handler::Normal(handler),
            } => scope
                .matches_prefix(path)
                .map(|params| (index, NormalStep::Middleware(handler, params))),
            Entry::Route(route) if selected == Some(index) => {
                Some((index, NormalStep::Chain(route)))
            }
            _ => None,
        })
}

/// Run a route's chain until one handler writes, fails, or the chain ends.
async fn run_chain(
    route: &Route,
    req: &mut RequestContext,
    res: &mut ResponseSink,
    report: &mut DispatchReport,
) -> Next {
    for handler in route.chain.handlers() {
        if res.is_closed() {
            break;
        }
        report.handlers_run.push(handler.name());
        let next = handler.run(req, res).await;
        if res.is_written() || matches!(next, Next::Fail(_)) {
            return next;
        }
    }
    Next::Advance
}

/// Decide the next state after a handler returned.
fn settle(
    next: Next,
    req: &RequestContext,
    res: &mut ResponseSink,
    report: &mut DispatchReport,
) -> DispatchState {
    record_violations(req, res, report);

    if res.is_written() {
        if let Next::Fail(failure) = next {
            tracing::warn!(
                request_id = %req.request_id,
                failure = %failure,
                "Handler failed after writing the response, failure ignored"
            );
        }
        return DispatchState::Terminated;
    }

    match next {
        Next::Advance => DispatchState::NormalDispatch,
        Next::Fail(failure) => {
            tracing::debug!(
                request_id = %req.request_id,
                failure = %failure,
                kind = failure.kind(),
                "Switching to error track"
            );
            DispatchState::ErrorDispatch(failure)
        }
    }
}

fn record_violations(req: &RequestContext, res: &mut ResponseSink, report: &mut DispatchReport) {
    for violation in res.take_violations() {
        report_violation(violation, req, report);
    }
}

fn report_violation(
    violation: DispatchViolation,
    req: &RequestContext,
    report: &mut DispatchReport,
) {
    tracing::error!(
        request_id = %req.request_id,
        method = %req.method,
        path = %req.path,
        violation = %violation,
        "Dispatch invariant violated"
    );
    metrics::record_violation(violation.kind());
    report.violations.push(violation);
}

/// The normal track ran out of entries without a write.
fn exhausted(
    route_matched: bool,
    req: &RequestContext,
    res: &mut ResponseSink,
    report: &mut DispatchReport,
) {
    if !route_matched {
        tracing::debug!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            "No route matched"
        );
        let _ = res.write(
            StatusCode::NOT_FOUND,
            json!({ "message": format!("Cannot {} {}", req.method, req.path) }),
        );
        return;
    }

    let violation = DispatchViolation::ChainExhausted {
        method: req.method.to_string(),
        path: req.path.clone(),
    };
    report_violation(violation, req, report);
    let _ = res.write(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "message": "internal failure", "kind": "dispatch_invariant_violation" }),
    );
}

/// Built-in error handler used when nothing on the error track claims a failure.
fn fallback(
    failure: &Failure,
    req: &RequestContext,
    res: &mut ResponseSink,
    report: &mut DispatchReport,
) {
    report.used_fallback = true;
    match failure {
        Failure::Collaborator { cause, .. } => tracing::error!(
            request_id = %req.request_id,
            failure = %failure,
            cause = %cause,
            "Unhandled collaborator failure"
        ),
        _ => tracing::warn!(
            request_id = %req.request_id,
            failure = %failure,
            kind = failure.kind(),
            "Unhandled failure, using fallback"
        ),
    }
    let _ = res.write(StatusCode::INTERNAL_SERVER_ERROR, failure.to_body());
}
