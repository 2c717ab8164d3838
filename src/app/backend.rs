//! Backend service running beside the UI loop.
//!
//! The backend owns the [`GlobalContext`] and answers two routes,
//! `get_current` and `key_event`, with JSON bodies.  Requests go in over one
//! channel and responses come back over another, each tagged with the token
//! the frontend gave it so stale replies can be told apart.

use tokio::sync::mpsc;

use crate::core::context::{ContextError, GlobalContext};

/// The two endpoints the frontend can hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    GetCurrent,
    KeyEvent(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    GetCurrent,
    KeyEvent,
}

impl Route {
    pub fn kind(&self) -> RouteKind {
        match self {
            Route::GetCurrent => RouteKind::GetCurrent,
            Route::KeyEvent(_) => RouteKind::KeyEvent,
        }
    }
}

#[derive(Debug)]
pub struct Request {
    pub token: u64,
    pub route: Route,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub token: u64,
    pub route: RouteKind,
    pub body: String,
}

/// Answer one route.  Unrecognised keys and serialisation failures produce
/// an empty body.
pub fn serve(ctx: &mut GlobalContext, route: &Route) -> String {
    let body = match route {
        Route::GetCurrent => match ctx.current_display() {
            Some(tree) => serde_json::to_string(&tree),
            None => return String::new(),
        },
        Route::KeyEvent(key) => match ctx.do_action(key) {
            Ok(effects) => serde_json::to_string(&effects),
            Err(ContextError::UnrecognizedKey(key)) => {
                tracing::debug!(%key, "unrecognized key");
                return String::new();
            }
        },
    };
    body.unwrap_or_else(|e| {
        tracing::warn!("failed to encode response: {e}");
        String::new()
    })
}

/// Sending half of the backend, held by the UI.
#[derive(Debug, Clone)]
pub struct BackendHandle {
    tx: mpsc::UnboundedSender<Request>,
}

impl BackendHandle {
    /// Queue a request.  Returns `false` once the backend has stopped.
    pub fn send(&self, token: u64, route: Route) -> bool {
        self.tx.send(Request { token, route }).is_ok()
    }
}

/// Spawn the backend task.  It runs until every [`BackendHandle`] is dropped.
pub fn spawn_backend(mut ctx: GlobalContext) -> (BackendHandle, mpsc::UnboundedReceiver<Response>) {
    let (req_tx, mut req_rx) = mpsc::unbounded_channel::<Request>();
    let (resp_tx, resp_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(Request { token, route }) = req_rx.recv().await {
            let body = serve(&mut ctx, &route);
            tracing::debug!(token, ?route, bytes = body.len(), "served request");
            let response = Response {
                token,
                route: route.kind(),
                body,
            };
            if resp_tx.send(response).is_err() {
                break; // UI gone
            }
        }
    });

    (BackendHandle { tx: req_tx }, resp_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::AstContext;
    use crate::core::view::ViewNode;
    use crate::core::wire::{WireAction, WireNode};

    fn context() -> GlobalContext {
        GlobalContext::new(AstContext::from_source("a = 10\n").unwrap())
    }

    #[test]
    fn get_current_serves_the_tree() {
        let body = serve(&mut context(), &Route::GetCurrent);
        let tree: WireNode = serde_json::from_str(&body).unwrap();
        assert_eq!(tree.name, "module");
        assert!(tree.children.unwrap()[0].cursor);
    }

    #[test]
    fn key_event_serves_actions() {
        let mut ctx = context();
        let body = serve(&mut ctx, &Route::KeyEvent("l".into()));
        let actions: Vec<WireAction> = serde_json::from_str(&body).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action, "refresh_ast");
    }

    #[test]
    fn deeply_nested_modules_reach_the_renderer() {
        let terms: Vec<String> = (0..70).map(|i| i.to_string()).collect();
        let sum = format!("total = {}\n", terms.join(" + "));
        let chain = format!("q = db{}\n", ".filter(x)".repeat(35));

        for source in [sum, chain] {
            let mut ctx = GlobalContext::new(AstContext::from_source(&source).unwrap());
            let nodes = ctx.contexts[0].tree.nodes.len();
            let body = serve(&mut ctx, &Route::GetCurrent);
            let view = ViewNode::from_json(&body).unwrap();
            assert_eq!(view.visible().len(), nodes);
        }
    }

    #[test]
    fn unknown_key_serves_an_empty_body() {
        assert_eq!(serve(&mut context(), &Route::KeyEvent("?".into())), "");
    }

    #[tokio::test]
    async fn responses_carry_their_tokens() {
        let (handle, mut responses) = spawn_backend(context());
        assert!(handle.send(7, Route::KeyEvent("t".into())));
        assert!(handle.send(8, Route::GetCurrent));

        let first = responses.recv().await.unwrap();
        assert_eq!((first.token, first.route), (7, RouteKind::KeyEvent));
        assert!(first.body.contains("\"toggle\""));

        let second = responses.recv().await.unwrap();
        assert_eq!((second.token, second.route), (8, RouteKind::GetCurrent));
    }
}
