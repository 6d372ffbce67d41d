// End-to-end resolution behaviour of the router
#[cfg(test)]
mod test {
    use std::sync::Arc;

    use http::Method;
    use switchyard::{
        ConfigError, HandlerTarget, ParamValue, Params, RouteError, Router, RouterMode, SccPatternCache,
        core::router::RouterBuilder,
    };

    fn target(reference: &str) -> HandlerTarget {
        HandlerTarget::parse(reference).unwrap()
    }

    fn any() -> Method {
        Method::from_bytes(b"ANY").unwrap()
    }

    fn router(routes: &[(Method, &str, &str)]) -> Router {
        let mut builder = Router::builder();
        for (method, path, handler) in routes {
            builder.add_route(method.clone(), path, target(handler)).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_typed_placeholders() {
        let router = router(&[
            (Method::GET, "/flag/{on:bool}", "Flags"),
            (Method::GET, "/ratio/{value:number}", "Ratios"),
            (Method::GET, "/page/{slug:string}", "Pages"),
            (Method::GET, "/lang/{code:(en|fr)}/intro", "Intro"),
        ]);

        let flag = router.resolve(&Method::GET, "/flag/Yes").unwrap();
        assert_eq!(flag.params().get("on"), Some(&ParamValue::Bool(true)));
        let flag = router.resolve(&Method::GET, "/flag/n").unwrap();
        assert_eq!(flag.params().get("on"), Some(&ParamValue::Bool(false)));
        assert!(router.resolve(&Method::GET, "/flag/maybe").is_err());

        let ratio = router.resolve(&Method::GET, "/ratio/-0.25").unwrap();
        assert_eq!(ratio.params().get("value"), Some(&ParamValue::Float(-0.25)));
        assert!(router.resolve(&Method::GET, "/ratio/1-2").is_err());

        let page = router.resolve(&Method::GET, "/page/hello-world.v2~1").unwrap();
        assert_eq!(
            page.params().get("slug").and_then(ParamValue::as_str),
            Some("hello-world.v2~1")
        );
        assert!(router.resolve(&Method::GET, "/page/a/b").is_err());

        let intro = router.resolve(&Method::GET, "/lang/fr/intro").unwrap();
        assert_eq!(
            intro.params().get("code").and_then(ParamValue::as_str),
            Some("fr")
        );
        assert!(router.resolve(&Method::GET, "/lang/de/intro").is_err());
    }

    #[test]
    fn test_pattern_routes_ignore_case_but_exact_routes_do_not() {
        let router = router(&[
            (Method::GET, "/Docs", "Docs"),
            (Method::GET, "/Users/{id:int}", "Users"),
        ]);

        assert!(router.resolve(&Method::GET, "/users/7").is_ok());
        assert!(router.resolve(&Method::GET, "/Docs").is_ok());
        assert!(matches!(
            router.resolve(&Method::GET, "/docs"),
            Err(RouteError::NotFound { .. })
        ));
    }

    #[test]
    fn test_mixed_named_and_unnamed_placeholders() {
        let router = router(&[(Method::GET, "/calc/{:int}/{op}", "Calc")]);

        let found = router.resolve(&Method::GET, "/calc/3/add").unwrap();
        assert_eq!(
            found.params(),
            &Params::Named(vec![
                ("0".to_string(), ParamValue::Int(3)),
                ("op".to_string(), ParamValue::Str("add".to_string())),
            ])
        );
    }

    #[test]
    fn test_method_bucket_before_wildcard() {
        let router = router(&[
            (any(), "/items/{id}", "Any"),
            (Method::DELETE, "/items/{id:int}", "Delete"),
        ]);

        let delete = router.resolve(&Method::DELETE, "/items/5").unwrap();
        assert_eq!(delete.route().target().label(), "Delete");

        // DELETE bucket misses on a non-integer, wildcard answers.
        let fallback = router.resolve(&Method::DELETE, "/items/abc").unwrap();
        assert_eq!(fallback.route().target().label(), "Any");

        let head = router.resolve(&Method::HEAD, "/items/abc").unwrap();
        assert_eq!(head.route().method().as_str(), "ANY");
    }

    #[test]
    fn test_method_not_allowed_precedes_path_matching() {
        let router = router(&[(any(), "/anything", "Any")]);
        let method = Method::from_bytes(b"PROPFIND").unwrap();

        let err = router.resolve(&method, "/anything").unwrap_err();
        assert_eq!(err.to_string(), "Method Not Allowed PROPFIND");
    }

    #[test]
    fn test_custom_method_set_and_wildcard() {
        let fallback = Method::from_bytes(b"FALLBACK").unwrap();
        let mut builder = RouterBuilder::new()
            .methods([Method::GET])
            .wildcard_method(fallback.clone());
        builder.add_route(fallback.clone(), "/x", target("X")).unwrap();
        assert!(builder.add_route(Method::POST, "/x", target("Y")).is_err());
        let router = builder.build();

        assert_eq!(router.wildcard_method(), &fallback);
        assert!(router.resolve(&Method::GET, "/x").is_ok());
        assert!(matches!(
            router.resolve(&Method::POST, "/x"),
            Err(RouteError::MethodNotAllowed { .. })
        ));
    }

    #[test]
    fn test_replaced_wildcard_is_no_longer_known() {
        let fallback = Method::from_bytes(b"FALLBACK").unwrap();
        let any = any();
        let mut builder = RouterBuilder::new()
            .methods([Method::GET])
            .wildcard_method(fallback.clone());
        builder.add_route(fallback.clone(), "/x", target("X")).unwrap();
        assert!(matches!(
            builder.add_route(any.clone(), "/y", target("Y")),
            Err(ConfigError::UnknownMethod(_))
        ));
        let router = builder.build();

        assert!(matches!(
            router.resolve(&any, "/x"),
            Err(RouteError::MethodNotAllowed { .. })
        ));
    }

    #[test]
    fn test_wildcard_listed_explicitly_stays_known() {
        let fallback = Method::from_bytes(b"FALLBACK").unwrap();
        let any = any();
        let mut builder = RouterBuilder::new()
            .wildcard_method(fallback.clone())
            .methods([Method::GET, any.clone()]);
        builder.add_route(fallback, "/x", target("X")).unwrap();
        let router = builder.build();

        assert!(router.resolve(&any, "/x").is_ok());
    }

    #[test]
    fn test_padding_is_trimmed_from_requests() {
        let router = router(&[(Method::GET, "/", "Home"), (Method::GET, "a/b", "Ab")]);

        assert_eq!(
            router.resolve(&Method::GET, "").unwrap().route().target().label(),
            "Home"
        );
        assert!(router.resolve(&Method::GET, " /a/b/\n").is_ok());
    }

    #[test]
    fn test_shared_pattern_cache() {
        let cache = Arc::new(SccPatternCache::new());

        for _ in 0..2 {
            let mut builder = Router::builder().pattern_cache(cache.clone());
            builder
                .add_route(Method::GET, "/a/{id:int}", target("A"))
                .unwrap();
            builder
                .add_route(Method::POST, "/a/{id:int}", target("A"))
                .unwrap();
            let router = builder.build();
            assert!(router.resolve(&Method::POST, "/a/1").is_ok());
        }

        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_single_shot_serves_exactly_one_request() {
        let mut builder = Router::builder().mode(RouterMode::SingleShot);
        builder.add_route(Method::GET, "/run", target("Job")).unwrap();
        let router = Arc::new(builder.build());

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let router = router.clone();
                tokio::spawn(async move { router.resolve(&Method::GET, "/run").is_ok() })
            })
            .collect();

        let mut served = 0;
        for task in tasks {
            if task.await.unwrap() {
                served += 1;
            }
        }
        assert_eq!(served, 1);
        assert!(router.table().is_empty());
    }
}
