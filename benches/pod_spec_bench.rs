//! Pod spec rendering benchmarks for mysql-exporter-charm
//!
//! Measures:
//! - Option parsing and validation
//! - Pod spec rendering with and without ingress
//! - Full hook dispatch including serialization

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mysql_exporter_charm::charm::{Event, MysqlExporterCharm, UnitContext};
use mysql_exporter_charm::config::RawConfig;
use mysql_exporter_charm::pod_spec::{ImageInfo, SpecBuilder};
use mysql_exporter_charm::relation::MysqlRelation;

const CONFIG_YAML: &str = r#"
site_url: "https://mysqld-exporter.example.com"
cluster_issuer: "letsencrypt"
ingress_class: "public"
ingress_whitelist_source_range: "10.0.0.0/8"
tls_secret_name: "mysqld-exporter-tls"
image_pull_policy: IfNotPresent
security_context: true
"#;

fn relation() -> MysqlRelation {
    MysqlRelation {
        host: Some("mysql".to_string()),
        port: Some("3306".to_string()),
        user: Some("mano".to_string()),
        password: Some("manopw".to_string()),
        root_password: Some("rootpw".to_string()),
        database: None,
    }
}

fn bench_config_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("config");

    group.bench_function("parse_yaml", |b| {
        b.iter(|| {
            let raw = RawConfig::from_yaml(CONFIG_YAML).unwrap();
            std::hint::black_box(raw);
        })
    });

    let raw = RawConfig::from_yaml(CONFIG_YAML).unwrap();
    group.bench_function("validate", |b| {
        b.iter(|| {
            let config = raw.validate().unwrap();
            std::hint::black_box(config);
        })
    });

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("pod_spec/render");
    let image = ImageInfo::from_image_path("registry/mysqld-exporter:latest");
    let relation = relation();
    let builder = SpecBuilder::new("mysqld-exporter", 9104);

    let cases = [
        ("no_ingress", RawConfig::default()),
        ("https_ingress", RawConfig::from_yaml(CONFIG_YAML).unwrap()),
    ];

    for (name, raw) in cases {
        let config = raw.validate().unwrap();
        group.bench_with_input(BenchmarkId::new("build", name), &config, |b, config| {
            b.iter(|| {
                let spec = builder.build(Some(&image), config, &relation).unwrap();
                std::hint::black_box(spec);
            })
        });
    }

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let charm = MysqlExporterCharm::default();
    let ctx = UnitContext {
        is_leader: true,
        image: Some(ImageInfo::from_image_path("registry/mysqld-exporter:latest")),
        config: RawConfig::from_yaml(CONFIG_YAML).unwrap(),
        mysql: relation(),
    };

    c.bench_function("charm/config_changed_to_json", |b| {
        b.iter(|| {
            let outcome = charm.dispatch(&Event::ConfigChanged, &ctx);
            let json = serde_json::to_string(&outcome).unwrap();
            std::hint::black_box(json);
        })
    });
}

criterion_group!(benches, bench_config_validate, bench_render, bench_dispatch);

criterion_main!(benches);
