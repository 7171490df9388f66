use std::cell::RefCell;
use std::rc::Rc;

use trellis_router::{
    HandlerError, HttpMethod, ParamNormalization, RegistrationError, Request, Response, Router,
    RouterOptions, SharedRequest, SharedResponse,
};

type Outcome = Rc<RefCell<Option<Option<HandlerError>>>>;

fn dispatch(
    router: &Router,
    method: HttpMethod,
    url: &str,
) -> (SharedRequest, SharedResponse, Outcome) {
    let req = Request::new(method, url).into_shared();
    let res = Response::new().into_shared();
    let outcome: Outcome = Rc::new(RefCell::new(None));
    let sink = outcome.clone();
    router.handle(req.clone(), res.clone(), move |err| {
        *sink.borrow_mut() = Some(err);
    });
    (req, res, outcome)
}

#[test]
fn param_when_route_matches_then_processor_runs_before_handlers() {
    let router = Router::new(RouterOptions::default());
    let seen = Rc::new(RefCell::new(Vec::new()));

    let processed = seen.clone();
    router
        .param("id", move |_ctx, next, value, name| {
            processed.borrow_mut().push(format!("{name}={value}"));
            next.ok();
            Ok(())
        })
        .expect("param should register");

    let handled = seen.clone();
    router
        .get("/users/:id", move |ctx, next| {
            handled
                .borrow_mut()
                .push(format!("handler:{}", ctx.params().get("id").unwrap_or("")));
            next.ok();
            Ok(())
        })
        .expect("route should compile");

    dispatch(&router, HttpMethod::Get, "/users/42");

    assert_eq!(
        *seen.borrow(),
        vec!["id=42".to_string(), "handler:42".to_string()]
    );
}

#[test]
fn param_when_two_processors_registered_then_run_in_order() {
    let router = Router::new(RouterOptions::default());
    let seen = Rc::new(RefCell::new(Vec::new()));

    let first = seen.clone();
    router
        .param("id", move |_ctx, next, _value, _name| {
            first.borrow_mut().push("first");
            next.ok();
            Ok(())
        })
        .expect("param should register");
    let second = seen.clone();
    router
        .param("id", move |_ctx, next, _value, _name| {
            second.borrow_mut().push("second");
            next.ok();
            Ok(())
        })
        .expect("param should register");

    router
        .get("/users/:id", |_ctx, next| {
            next.ok();
            Ok(())
        })
        .expect("route should compile");

    dispatch(&router, HttpMethod::Get, "/users/7");
    assert_eq!(*seen.borrow(), vec!["first", "second"]);
}

#[test]
fn param_when_processor_errors_then_rest_of_route_skipped() {
    let router = Router::new(RouterOptions::default());
    let seen = Rc::new(RefCell::new(Vec::new()));

    router
        .param("id", |_ctx, next, _value, _name| {
            next.err(HandlerError::with_status(404, "no such user"));
            Ok(())
        })
        .expect("param should register");
    let after = seen.clone();
    router
        .param("id", move |_ctx, next, _value, _name| {
            after.borrow_mut().push("second processor");
            next.ok();
            Ok(())
        })
        .expect("param should register");

    let handled = seen.clone();
    router
        .get("/users/:id", move |_ctx, next| {
            handled.borrow_mut().push("handler");
            next.ok();
            Ok(())
        })
        .expect("route should compile");

    let (_, _, outcome) = dispatch(&router, HttpMethod::Get, "/users/9");

    assert!(seen.borrow().is_empty());
    let outcome = outcome.borrow();
    let err = outcome
        .as_ref()
        .and_then(|o| o.as_ref())
        .expect("error should reach done");
    assert_eq!(err.status(), 404);
}

#[test]
fn param_when_processor_skips_route_then_next_layer_runs() {
    let router = Router::new(RouterOptions::default());
    let seen = Rc::new(RefCell::new(Vec::new()));

    router
        .param("id", |_ctx, next, value, _name| {
            if value == "reserved" {
                next.skip_route();
            } else {
                next.ok();
            }
            Ok(())
        })
        .expect("param should register");

    let first = seen.clone();
    router
        .get("/users/:id", move |_ctx, next| {
            first.borrow_mut().push("matched route");
            next.ok();
            Ok(())
        })
        .expect("route should compile");
    let fallback = seen.clone();
    router.mount("/", move |_ctx, next| {
        fallback.borrow_mut().push("fallback");
        next.ok();
        Ok(())
    });

    dispatch(&router, HttpMethod::Get, "/users/reserved");
    assert_eq!(*seen.borrow(), vec!["fallback"]);

    seen.borrow_mut().clear();
    dispatch(&router, HttpMethod::Get, "/users/ok");
    assert_eq!(*seen.borrow(), vec!["matched route", "fallback"]);
}

#[test]
fn param_when_name_has_leading_colon_then_it_is_stripped() {
    let router = Router::new(RouterOptions::default());
    let hit = Rc::new(RefCell::new(false));

    let sink = hit.clone();
    router
        .param(":id", move |_ctx, next, _value, name| {
            assert_eq!(name, "id");
            *sink.borrow_mut() = true;
            next.ok();
            Ok(())
        })
        .expect("param should register");
    router
        .get("/users/:id", |_ctx, next| {
            next.ok();
            Ok(())
        })
        .expect("route should compile");

    dispatch(&router, HttpMethod::Get, "/users/5");
    assert!(*hit.borrow());
}

#[test]
fn param_when_optional_capture_absent_then_processor_not_run() {
    let router = Router::new(RouterOptions::default());
    let hit = Rc::new(RefCell::new(false));

    let sink = hit.clone();
    router
        .param("format", move |_ctx, next, _value, _name| {
            *sink.borrow_mut() = true;
            next.ok();
            Ok(())
        })
        .expect("param should register");
    router
        .get("/data/:format?", |_ctx, next| {
            next.ok();
            Ok(())
        })
        .expect("route should compile");

    let (_, _, outcome) = dispatch(&router, HttpMethod::Get, "/data");

    assert!(!*hit.borrow());
    assert_eq!(*outcome.borrow(), Some(None));
}

#[test]
fn param_normalizer_when_replace_then_replacement_runs_instead() {
    let router = Router::new(RouterOptions::default());
    let seen = Rc::new(RefCell::new(Vec::new()));

    let wrapped = seen.clone();
    router.param_normalizer(move |_name, _original| {
        let sink = wrapped.clone();
        ParamNormalization::Replace(Rc::new(move |_ctx, next, value, _name| {
            sink.borrow_mut().push(format!("wrapped:{value}"));
            next.ok();
            Ok(())
        }))
    });

    let original = seen.clone();
    router
        .param("id", move |_ctx, next, _value, _name| {
            original.borrow_mut().push("original".to_string());
            next.ok();
            Ok(())
        })
        .expect("param should register");
    router
        .get("/users/:id", |_ctx, next| {
            next.ok();
            Ok(())
        })
        .expect("route should compile");

    dispatch(&router, HttpMethod::Get, "/users/3");
    assert_eq!(*seen.borrow(), vec!["wrapped:3".to_string()]);
}

#[test]
fn param_normalizer_when_reject_then_registration_fails() {
    let router = Router::new(RouterOptions::default());
    router.param_normalizer(|name, _original| {
        if name == "secret" {
            ParamNormalization::Reject("reserved name".to_string())
        } else {
            ParamNormalization::Keep
        }
    });

    let err = router
        .param("secret", |_ctx, next, _value, _name| {
            next.ok();
            Ok(())
        })
        .expect_err("registration should be rejected");

    match err {
        RegistrationError::InvalidParamDefinition { name, reason } => {
            assert_eq!(name, "secret");
            assert_eq!(reason, "reserved name");
        }
    }

    router
        .param("open", |_ctx, next, _value, _name| {
            next.ok();
            Ok(())
        })
        .expect("unrelated name should still register");
}
