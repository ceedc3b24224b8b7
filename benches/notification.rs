//! 通知处理基准测试
//!
//! 测试告警模板渲染和通知扫描的性能

use criterion::{criterion_group, criterion_main, Criterion};
use site_vitals::health::SiteStatus;
use site_vitals::notification::{AlertTemplate, NoOpSender, Notifier};
use site_vitals::registry::SiteRegistry;
use std::hint::black_box;
use std::sync::Arc;

/// 通知处理基准测试
fn notification_benchmark(c: &mut Criterion) {
    c.bench_function("alert_rendering_default", |b| {
        let template = AlertTemplate::default();
        b.iter(|| {
            let message = template
                .render(black_box("https://api.example.com/health"), SiteStatus::from_code(503))
                .unwrap();
            black_box(message)
        });
    });

    c.bench_function("alert_rendering_custom", |b| {
        let template = AlertTemplate::new(
            "🚨 {{url}} 状态异常\n状态码: {{status}}\n说明: {{description}}",
        )
        .unwrap();
        b.iter(|| {
            let message = template
                .render(black_box("https://api.example.com/health"), SiteStatus::CERT_EXPIRING)
                .unwrap();
            black_box(message)
        });
    });

    c.bench_function("template_creation", |b| {
        b.iter(|| black_box(AlertTemplate::new("CRIT - {{url}} ; status: {{status}}").unwrap()));
    });

    let rt = tokio::runtime::Runtime::new().unwrap();
    let registry = SiteRegistry::new();
    rt.block_on(async {
        for i in 0..200 {
            let url = format!("https://site-{i}.example");
            registry.add(&url).await;
            let code = if i % 4 == 0 { 500 } else { 200 };
            registry.set_status(&url, SiteStatus::from_code(code)).await;
        }
    });
    let notifier = Notifier::new(Arc::new(NoOpSender), AlertTemplate::default());

    c.bench_function("notify_200_sites", |b| {
        b.iter(|| rt.block_on(async { black_box(notifier.notify(&registry).await) }));
    });
}

criterion_group!(benches, notification_benchmark);
criterion_main!(benches);
