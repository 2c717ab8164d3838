//! Key relay — turns `key_event` responses into calls on the frontend.
//!
//! The backend names actions by string.  Those names are resolved through an
//! [`ActionRegistry`], a closed table built once at startup, so an unknown
//! name is a reported error instead of a missing function.  An [`InFlight`]
//! counter shared by every request decides which responses are still worth
//! applying.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::core::wire::WireAction;

#[derive(Debug, Error, PartialEq)]
pub enum RelayError {
    #[error("malformed response body: {0}")]
    Malformed(String),
    #[error("unknown action {0:?}")]
    UnknownAction(String),
    #[error("bad arguments for {action}: {reason}")]
    BadArgs { action: String, reason: String },
    #[error("action {0:?} is already registered")]
    Duplicate(&'static str),
}

/// A frontend action.  Receives the argument list from the wire.
pub type Handler<S> = fn(&mut S, &[Value]) -> Result<(), RelayError>;

/// Closed name → handler table.
pub struct ActionRegistry<S> {
    handlers: HashMap<&'static str, Handler<S>>,
}

impl<S> Default for ActionRegistry<S> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

/// What running one response did.
#[derive(Debug, Default, PartialEq)]
pub struct Dispatch {
    /// Handlers that ran successfully.
    pub invoked: usize,
    /// Elements that failed, in response order.
    pub errors: Vec<RelayError>,
}

impl<S> ActionRegistry<S> {
    pub fn register(&mut self, name: &'static str, handler: Handler<S>) -> Result<(), RelayError> {
        if self.handlers.contains_key(name) {
            return Err(RelayError::Duplicate(name));
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Decode a `key_event` body and run every action in order.  A body
    /// that is not a JSON action list fails as a whole; a bad element only
    /// fails itself.
    pub fn dispatch(&self, state: &mut S, body: &str) -> Result<Dispatch, RelayError> {
        let actions: Vec<WireAction> =
            serde_json::from_str(body).map_err(|e| RelayError::Malformed(e.to_string()))?;

        let mut outcome = Dispatch::default();
        for WireAction { action, args } in actions {
            let result = match self.handlers.get(action.as_str()) {
                Some(handler) => handler(state, &args),
                None => Err(RelayError::UnknownAction(action.clone())),
            };
            match result {
                Ok(()) => outcome.invoked += 1,
                Err(e) => {
                    tracing::warn!(%action, "relay action failed: {e}");
                    outcome.errors.push(e);
                }
            }
        }
        Ok(outcome)
    }
}

/// Read argument `index` as an unsigned integer.
pub fn arg_u64(action: &str, args: &[Value], index: usize) -> Result<u64, RelayError> {
    args.get(index)
        .and_then(Value::as_u64)
        .ok_or_else(|| RelayError::BadArgs {
            action: action.to_string(),
            reason: format!("argument {index} must be an unsigned integer"),
        })
}

// ───────────────────────────────────────── tokens ────────────

/// Request tokens for one route.  Every request takes a fresh token; a
/// response is applied only when its token is newer than the last one
/// applied, which drops duplicates and replies that were overtaken.
#[derive(Debug, Default, Clone)]
pub struct InFlight {
    issued: u64,
    applied: u64,
}

impl InFlight {
    /// Token for a new request.
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Claim `token` for application.  Returns `false` if it is stale.
    pub fn accept(&mut self, token: u64) -> bool {
        if token <= self.applied || token > self.issued {
            return false;
        }
        self.applied = token;
        true
    }

    /// Requests sent but not answered yet.
    pub fn pending(&self) -> bool {
        self.issued > self.applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Calls {
        foo: Vec<Vec<Value>>,
        bar: usize,
    }

    fn foo(state: &mut Calls, args: &[Value]) -> Result<(), RelayError> {
        state.foo.push(args.to_vec());
        Ok(())
    }

    fn bar(state: &mut Calls, args: &[Value]) -> Result<(), RelayError> {
        arg_u64("bar", args, 0)?;
        state.bar += 1;
        Ok(())
    }

    fn registry() -> ActionRegistry<Calls> {
        let mut registry = ActionRegistry::default();
        registry.register("foo", foo).unwrap();
        registry.register("bar", bar).unwrap();
        registry
    }

    #[test]
    fn one_action_runs_once_with_its_args() {
        let mut calls = Calls::default();
        let outcome = registry()
            .dispatch(&mut calls, r#"[{"action":"foo","args":[1,2]}]"#)
            .unwrap();
        assert_eq!(outcome.invoked, 1);
        assert_eq!(calls.foo, vec![vec![Value::from(1), Value::from(2)]]);
    }

    #[test]
    fn empty_list_runs_nothing() {
        let mut calls = Calls::default();
        let outcome = registry().dispatch(&mut calls, "[]").unwrap();
        assert_eq!(outcome, Dispatch::default());
        assert!(calls.foo.is_empty());
    }

    #[test]
    fn malformed_body_is_reported_and_registry_stays_usable() {
        let registry = registry();
        let mut calls = Calls::default();
        assert!(matches!(
            registry.dispatch(&mut calls, "not json"),
            Err(RelayError::Malformed(_))
        ));
        assert!(matches!(
            registry.dispatch(&mut calls, ""),
            Err(RelayError::Malformed(_))
        ));
        registry
            .dispatch(&mut calls, r#"[{"action":"foo","args":[]}]"#)
            .unwrap();
        assert_eq!(calls.foo.len(), 1);
    }

    #[test]
    fn bad_elements_do_not_stop_the_rest() {
        let mut calls = Calls::default();
        let body = r#"[
            {"action":"missing","args":[]},
            {"action":"bar","args":["x"]},
            {"action":"bar","args":[3]}
        ]"#;
        let outcome = registry().dispatch(&mut calls, body).unwrap();
        assert_eq!(outcome.invoked, 1);
        assert_eq!(calls.bar, 1);
        assert_eq!(outcome.errors.len(), 2);
        assert_eq!(outcome.errors[0], RelayError::UnknownAction("missing".into()));
        assert!(matches!(outcome.errors[1], RelayError::BadArgs { .. }));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = registry();
        assert_eq!(registry.register("foo", foo), Err(RelayError::Duplicate("foo")));
        assert!(registry.contains("foo"));
        assert!(!registry.contains("baz"));
    }

    #[test]
    fn in_flight_drops_stale_and_duplicate_tokens() {
        let mut flight = InFlight::default();
        let first = flight.begin();
        let second = flight.begin();
        assert!(flight.pending());

        assert!(flight.accept(second));
        assert!(!flight.accept(second), "duplicate");
        assert!(!flight.accept(first), "overtaken");
        assert!(!flight.accept(99), "never issued");
        assert!(!flight.pending());
    }
}
