use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;
use validator::Validate;
use wallet_gateway_client::domain::amount::format_base_units;
use wallet_gateway_client::domain::{
    ErrorContext, PublicKeyCredential, build_error_from_response, normalize_unknown,
};
use wallet_gateway_client::infra::{BitcoinAdapter, ChainAdapter};

fn bench_credential_validation(c: &mut Criterion) {
    let credential: PublicKeyCredential = serde_json::from_value(json!({
        "id": "cred-1",
        "rawId": "cred-1",
        "type": "public-key",
        "response": {"clientDataJSON": "eyJ0eXBlIjoid2ViYXV0aG4uZ2V0In0"}
    }))
    .unwrap();

    c.bench_function("validate_credential", |b| {
        b.iter(|| {
            let _ = black_box(&credential).validate();
            let _ = black_box(&credential).validate_shape();
        })
    });
}

fn bench_error_building(c: &mut Criterion) {
    let body = json!({"error": {"message": "Too many requests"}, "retryAfter": 30});

    c.bench_function("build_error_from_response", |b| {
        b.iter(|| {
            let error = build_error_from_response(black_box(429), &body, ErrorContext::new());
            normalize_unknown(error, ErrorContext::new())
        })
    });
}

fn bench_amounts(c: &mut Criterion) {
    c.bench_function("format_base_units_wei", |b| {
        b.iter(|| format_base_units(black_box(1_234_567_890_123_456_789), 18))
    });
}

fn bench_bitcoin_history(c: &mut Criterion) {
    let adapter = BitcoinAdapter::new("https://btc.test/api", "https://btc.test");
    let txs: Vec<_> = (0..25)
        .map(|i| {
            json!({
                "txid": format!("{:064x}", i),
                "vin": [{"prevout": {"scriptpubkey_address": "bc1qbob", "value": 100_000 + i}}],
                "vout": [
                    {"scriptpubkey_address": "bc1qcarol", "value": 10_000},
                    {"scriptpubkey_address": "bc1qalice", "value": 90_000 + i}
                ]
            })
        })
        .collect();
    let payload = json!(txs);

    c.bench_function("parse_bitcoin_history", |b| {
        b.iter(|| adapter.parse_history(black_box(&payload), "bc1qalice"))
    });
}

criterion_group!(
    benches,
    bench_credential_validation,
    bench_error_building,
    bench_amounts,
    bench_bitcoin_history
);
criterion_main!(benches);
