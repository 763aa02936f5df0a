use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

fn bench_weighted_index(c: &mut Criterion) {
    use feathergate_contract::routing::weighted_index;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let mut rng = StdRng::seed_from_u64(7);

    c.bench_function("weighted_index_two", |b| {
        b.iter(|| weighted_index(black_box(&[1.0, 3.0]), &mut rng))
    });

    let weights: Vec<f64> = (0..32).map(|i| (i % 5) as f64).collect();
    c.bench_function("weighted_index_thirty_two", |b| {
        b.iter(|| weighted_index(black_box(&weights), &mut rng))
    });
}

fn bench_config_parsing(c: &mut Criterion) {
    use feathergate_contract::config::Config;

    let header_style = json!({
        "strategy": {"mode": "fallback", "on_status_codes": [429, 503]},
        "retry": {"attempts": 3},
        "targets": [
            {
                "strategy": {"mode": "loadbalance"},
                "targets": [
                    {"provider": "openai", "api_key": "sk-1", "weight": 1},
                    {"provider": "azure-openai", "resource_name": "r", "deployment_id": "d", "weight": 3}
                ]
            },
            {"provider": "anthropic", "api_key": "sk-ant", "override_params": {"max_tokens": 512}}
        ]
    });

    c.bench_function("config_from_value_snake_case", |b| {
        b.iter(|| Config::from_value(black_box(header_style.clone())))
    });

    let yaml = r#"
mode: loadbalance
cache: simple
options:
  - provider: openai
    weight: 1
  - provider: anthropic
    weight: 3
"#;
    c.bench_function("config_from_yaml_options", |b| {
        b.iter(|| Config::from_yaml_str(black_box(yaml)))
    });
}

fn bench_request_body(c: &mut Criterion) {
    use feathergate_contract::request::RequestBody;

    let body = json!({
        "config": {
            "strategy": {"mode": "single"},
            "targets": [{"provider": "openai", "apiKey": "sk"}]
        },
        "params": {
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": "You are a helpful assistant"},
                {"role": "user", "content": [{"type": "text", "text": "Hello!"}]}
            ],
            "temperature": 0.7,
            "max_tokens": 100
        }
    })
    .to_string();

    c.bench_function("request_body_from_json_str", |b| {
        b.iter(|| RequestBody::from_json_str(black_box(&body)))
    });

    let parsed = RequestBody::from_json_str(&body).unwrap();
    c.bench_function("request_body_serialize", |b| {
        b.iter(|| serde_json::to_string(black_box(&parsed)))
    });
}

fn bench_route_planning(c: &mut Criterion) {
    use feathergate_contract::config::Config;
    use feathergate_contract::routing::RoutePlanner;

    let config = Config::from_value(json!({
        "strategy": {
            "mode": "conditional",
            "conditions": [
                {"query": {"metadata.user_plan": {"$in": ["pro", "enterprise"]}}, "then": "premium"},
                {"query": {"$or": [{"params.model": "gpt-4o-mini"}, {"metadata.tier": "batch"}]}, "then": "cheap"}
            ],
            "default": "cheap"
        },
        "targets": [
            {
                "name": "premium",
                "strategy": {"mode": "fallback"},
                "targets": [
                    {
                        "strategy": {"mode": "loadbalance"},
                        "targets": [{"provider": "openai", "weight": 1}, {"provider": "azure-openai", "weight": 3}]
                    },
                    {"provider": "anthropic"}
                ]
            },
            {"name": "cheap", "provider": "groq"}
        ]
    }))
    .unwrap();
    let tree = config.provider_tree().unwrap();
    let mut planner = RoutePlanner::seeded(42);

    let premium = json!({"metadata": {"user_plan": "enterprise"}, "params": {"model": "gpt-4o"}});
    c.bench_function("plan_conditional_premium", |b| {
        b.iter(|| planner.plan(black_box(&tree), black_box(&premium)).map(|plan| plan.len()))
    });

    let cheap = json!({"metadata": {"tier": "batch"}, "params": {"model": "gpt-4o"}});
    c.bench_function("plan_conditional_fallthrough", |b| {
        b.iter(|| planner.plan(black_box(&tree), black_box(&cheap)).map(|plan| plan.len()))
    });

    c.bench_function("provider_tree_build", |b| b.iter(|| black_box(&config).provider_tree()));
}

criterion_group!(
    benches,
    bench_weighted_index,
    bench_config_parsing,
    bench_request_body,
    bench_route_planning
);
criterion_main!(benches);
