use axum::{
    extract::Request,
    http::Method,
    middleware::Next,
};
use tracing::debug;

use super::{error::GuardError, GuardFuture};

/// Only let requests made with `method` through.
///
/// Any other method is answered with 405 and an `Allow` header naming the
/// accepted method; the handler is not run.
pub fn method_exclusive(method: Method) -> impl Fn(Request, Next) -> GuardFuture + Clone {
    move |request: Request, next: Next| {
        let method = method.clone();
        Box::pin(async move {
            if request.method() != method {
                debug!(received = %request.method(), expected = %method, "Method rejected");
                return Err(GuardError::MethodNotAllowed { allowed: method });
            }

            Ok(next.run(request).await)
        })
    }
}
