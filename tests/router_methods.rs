use std::cell::RefCell;
use std::rc::Rc;

use trellis_router::{
    HandlerError, HttpMethod, Request, Response, Router, RouterOptions, SharedRequest,
    SharedResponse, HTTP_METHODS,
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

fn noop(_ctx: &trellis_router::Context, next: trellis_router::Next) -> trellis_router::DispatchResult {
    next.ok();
    Ok(())
}

#[test]
fn options_when_routes_match_then_automatic_allow_response() {
    let router = Router::new(RouterOptions::default());
    let route = router.route("/thing").expect("route should compile");
    route.get(noop).post(noop);

    let (_, res, outcome) = dispatch(&router, HttpMethod::Options, "/thing");

    let res = res.borrow();
    assert_eq!(res.header("Allow"), Some("GET,POST"));
    assert_eq!(res.body(), Some("GET,POST"));
    // the automatic answer replaces the terminal callback
    assert_eq!(*outcome.borrow(), None);
}

#[test]
fn options_when_multiple_routes_match_then_methods_unioned_in_first_seen_order() {
    let router = Router::new(RouterOptions::default());
    router
        .route("/thing")
        .expect("route should compile")
        .post(noop)
        .get(noop);
    router
        .route("/thing")
        .expect("route should compile")
        .get(noop)
        .delete(noop);

    let (_, res, _) = dispatch(&router, HttpMethod::Options, "/thing");
    assert_eq!(res.borrow().header("Allow"), Some("POST,GET,DELETE"));
}

#[test]
fn options_when_route_handles_options_itself_then_no_automatic_response() {
    let router = Router::new(RouterOptions::default());
    let route = router.route("/thing").expect("route should compile");
    route.get(noop);
    route.options(|ctx, _next| {
        ctx.response().send("custom");
        Ok(())
    });

    let (_, res, outcome) = dispatch(&router, HttpMethod::Options, "/thing");

    let res = res.borrow();
    assert_eq!(res.body(), Some("custom"));
    assert_eq!(res.header("Allow"), None);
    assert_eq!(*outcome.borrow(), None);
}

#[test]
fn options_when_nothing_matches_then_done_called_normally() {
    let router = Router::new(RouterOptions::default());
    router.get("/elsewhere", noop).expect("route should compile");

    let (_, res, outcome) = dispatch(&router, HttpMethod::Options, "/thing");

    assert!(!res.borrow().is_sent());
    assert_eq!(*outcome.borrow(), Some(None));
}

#[test]
fn head_when_only_get_registered_then_request_is_served() {
    let router = Router::new(RouterOptions::default());
    let hit = Rc::new(RefCell::new(false));

    let sink = hit.clone();
    router
        .get("/page", move |_ctx, next| {
            *sink.borrow_mut() = true;
            next.ok();
            Ok(())
        })
        .expect("route should compile");

    dispatch(&router, HttpMethod::Head, "/page");
    assert!(*hit.borrow());
}

#[test]
fn all_when_registered_then_every_method_is_served() {
    let router = Router::new(RouterOptions::default());
    let count = Rc::new(RefCell::new(0u32));

    let sink = count.clone();
    router
        .all("/everything", move |_ctx, next| {
            *sink.borrow_mut() += 1;
            next.ok();
            Ok(())
        })
        .expect("route should compile");

    for method in HTTP_METHODS {
        dispatch(&router, method, "/everything");
    }
    assert_eq!(*count.borrow(), HTTP_METHODS.len() as u32);
}

#[test]
fn route_when_method_not_registered_then_request_falls_through() {
    let router = Router::new(RouterOptions::default());
    let hit = Rc::new(RefCell::new(false));

    let sink = hit.clone();
    router
        .get("/thing", move |_ctx, next| {
            *sink.borrow_mut() = true;
            next.ok();
            Ok(())
        })
        .expect("route should compile");

    let (_, res, outcome) = dispatch(&router, HttpMethod::Post, "/thing");

    assert!(!*hit.borrow());
    assert!(!res.borrow().is_sent());
    assert_eq!(*outcome.borrow(), Some(None));
}
