#![allow(dead_code)]

/// Response-body stand-in: handlers `echo` into a per-thread buffer and the helpers
/// return what was written during one `run`.
///
/// `Router::run` executes every handler on the calling thread, so a thread-local
/// buffer keeps parallel tests apart without any locking.
pub mod output {
    use std::cell::RefCell;

    thread_local! {
        static BODY: RefCell<String> = const { RefCell::new(String::new()) };
    }

    pub fn echo(text: impl AsRef<str>) {
        BODY.with(|b| b.borrow_mut().push_str(text.as_ref()));
    }

    pub fn take() -> String {
        BODY.with(|b| std::mem::take(&mut *b.borrow_mut()))
    }
}

pub mod requests {
    use super::output;
    use waymark::{RequestContext, Router, RunReport};

    /// Build a context the way a front controller at `/index.php` would see it.
    pub fn ctx(method: &str, uri: &str) -> RequestContext {
        RequestContext::parse(method, uri)
            .unwrap()
            .with_script_name("/index.php")
    }

    /// Run `ctx` and return the emitted body, honouring HEAD body suppression.
    pub fn body_for(router: &Router, ctx: &RequestContext) -> (String, RunReport) {
        output::take();
        let report = router.run(ctx).unwrap();
        let body = output::take();
        if report.suppress_body {
            (String::new(), report)
        } else {
            (body, report)
        }
    }

    pub fn body(router: &Router, method: &str, uri: &str) -> String {
        body_for(router, &ctx(method, uri)).0
    }
}
