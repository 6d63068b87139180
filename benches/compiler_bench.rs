use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nwc::connect::Connections;
use nwc::graph::{parse_netlist, Graph};
use nwc::*;
use serde_json::{json, Map, Value};
use std::path::Path;

// Representative designs from the integration fixtures.
fn scenarios() -> Vec<(&'static str, String)> {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    [
        ("basic", "basic.json"),
        ("connector_led", "connector_led.json"),
        ("implicit_i2c", "iot_sensor_implicit_i2c.json"),
    ]
    .into_iter()
    .filter_map(|(name, file)| {
        std::fs::read_to_string(fixtures.join(file))
            .ok()
            .map(|text| (name, text))
    })
    .collect()
}

/// Scaling generator: `n_sensors` I2C sensors on one bus behind a
/// controller, a pin header breaking out every fourth sensor's power, and
/// a shared ground. Exercises every pass including connector synthesis and
/// implicit pull-up insertion.
fn generate_scaling_design(n_sensors: usize) -> String {
    let mut nodes = Map::new();
    let mut labels = Map::new();
    let mut label = |name: &str, node: &str, port: u32| {
        let id = format!("l{}", labels.len());
        labels.insert(
            id,
            json!({ "labelName": name, "nodeId": node, "portIdx": port }),
        );
    };

    nodes.insert(
        "mcu".into(),
        json!({ "id": "mcu", "data": { "name": "Mcu", "type": "Xiao_Rp2040", "ports": [
            { "name": "gnd", "type": "Ground", "array": false },
            { "name": "pwr", "type": "VoltageSink", "array": false },
            { "name": "i2c", "type": "I2cController", "array": true },
            { "name": "i2c_0", "type": "I2cController", "array": false, "elementOf": 2 }
        ] } }),
    );
    label("gnd", "mcu", 0);
    label("vdd", "mcu", 1);
    label("i2c", "mcu", 3);

    let n_pins = n_sensors.div_ceil(4).max(1);
    let header_ports: Vec<Value> = (0..n_pins)
        .map(|i| json!({ "name": format!("port_{}", i), "type": "Passive", "array": false }))
        .collect();
    nodes.insert(
        "hdr".into(),
        json!({ "id": "hdr", "data": {
            "name": "J1", "type": "PinHeader254", "superClasses": ["PassiveConnector"],
            "ports": header_ports,
            "argParams": [{ "name": "length", "type": "int", "default_value": null, "value": n_pins }]
        } }),
    );

    for s in 0..n_sensors {
        let id = format!("s{}", s);
        nodes.insert(
            id.clone(),
            json!({ "id": id, "data": { "name": format!("Sensor{}", s), "type": "Hdc1080", "ports": [
                { "name": "gnd", "type": "Ground", "array": false },
                { "name": "pwr", "type": "VoltageSink", "array": false },
                { "name": "i2c", "type": "I2cTarget", "array": false }
            ], "argParams": [
                { "name": "addr", "type": "int", "default_value": 64, "value": 64 + (s % 4) }
            ] } }),
        );
        label("gnd", &id, 0);
        label("i2c", &id, 2);
        if s % 4 == 0 {
            let net = format!("vs{}", s / 4);
            label(&net, &id, 1);
            label(&net, "hdr", (s / 4) as u32);
        } else {
            label("vdd", &id, 1);
        }
    }

    json!({ "graph": { "nodes": nodes }, "labels": labels }).to_string()
}

fn bench_lower_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("kpi/lower_latency");
    let registry = Registry::builtin();
    let options = EmitOptions::default();

    for (name, source) in scenarios() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &source, |b, source| {
            b.iter(|| lower_json(black_box(source), &registry, &options));
        });
    }

    group.finish();
}

fn bench_lower_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("kpi/lower_scaling");
    let registry = Registry::builtin();
    let options = EmitOptions::default();

    for n in [10usize, 100, 1000] {
        let source = generate_scaling_design(n);
        assert!(
            lower_json(&source, &registry, &options).is_ok(),
            "scaling design with {} sensors must lower",
            n
        );
        group.bench_with_input(BenchmarkId::from_parameter(n), &source, |b, source| {
            b.iter(|| lower_json(black_box(source), &registry, &options));
        });
    }

    group.finish();
}

// Decode + graph build + aggregation only, to separate front-end cost from emission.
fn bench_phase_latency(c: &mut Criterion) {
    let registry = Registry::builtin();
    let source = generate_scaling_design(500);
    let netlist = parse_netlist(&source).expect("scaling design must decode");

    let mut group = c.benchmark_group("kpi/phase_latency");
    group.bench_function("decode", |b| {
        b.iter(|| parse_netlist(black_box(&source)))
    });
    group.bench_function("build_graph", |b| {
        b.iter(|| Graph::build(black_box(&netlist), &registry))
    });
    let graph = Graph::build(&netlist, &registry).expect("scaling design must build");
    group.bench_function("aggregate", |b| {
        b.iter(|| Connections::aggregate(black_box(&graph)))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_lower_latency,
    bench_lower_scaling,
    bench_phase_latency
);
criterion_main!(benches);
