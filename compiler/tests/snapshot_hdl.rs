// Snapshot tests: lock the debug views and response records to detect
// unintended behavior changes.
//
// Uses the library API directly. Exact declaration text is covered by
// `lowering.rs`; these lock the `--emit graph`, `--emit connections`, and
// `--emit result` renderings.
//
// Run `cargo insta review` after intentional output changes to update baselines.

use std::path::Path;

use nwc::connect::Connections;
use nwc::graph::{parse_netlist, Graph};
use nwc::{compile, EmitOptions, Registry};

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
}

fn build(name: &str) -> (Graph, Connections) {
    let netlist = parse_netlist(&fixture(name)).unwrap();
    let graph = Graph::build(&netlist, &Registry::builtin()).unwrap();
    let conns = Connections::aggregate(&graph).unwrap();
    (graph, conns)
}

fn result_json(name: &str) -> String {
    let result = compile(&fixture(name), &Registry::builtin(), &EmitOptions::default());
    serde_json::to_string_pretty(&result).unwrap()
}

#[test]
fn snapshot_connector_led_graph() {
    let (graph, _) = build("connector_led.json");
    insta::assert_snapshot!(graph.to_string(), @r###"
Graph (2 nodes, 4 labels)
  node 'PinHeader254Vertical': PinHeader254Vertical [connector]
    port 0 'port_0': Passive
    port 1 'port_1': Passive
    port 2 'port_2': Passive
    arg 'length': int = 3 (default null)
  node 'IndicatorLed': IndicatorLed [plain]
    port 0 'signal': DigitalSink
    port 1 'gnd': Ground
    arg 'current_draw': range = [0.001,0.01] (default [0.001,0.01])
  label 'signal' -> IndicatorLed.signal
  label 'signal' -> PinHeader254Vertical.port_0
  label 'gnd' -> IndicatorLed.gnd
  label 'gnd' -> PinHeader254Vertical.port_1
"###);
}

#[test]
fn snapshot_i2c_device_graph() {
    let (graph, _) = build("i2c_device.json");
    insta::assert_snapshot!(graph.to_string(), @r###"
Graph (3 nodes, 8 labels)
  node 'Xiao_Rp2040': Xiao_Rp2040 [plain]
    port 0 'gnd': Ground
    port 1 'pwr_out': VoltageSource
    port 2 'i2c': I2cController[]
    port 3 'i2c_12': I2cController (slot of 'i2c')
  node 'Hdc1080': Hdc1080 [plain]
    port 0 'gnd': Ground
    port 1 'pwr': VoltageSink
    port 2 'i2c': I2cTarget
  node 'I2cPullup': I2cPullup [i2c support]
    port 0 'pwr': VoltageSink
    port 1 'i2c': I2cPullupPort
  label 'i2c' -> I2cPullup.i2c
  label 'i2c' -> Hdc1080.i2c
  label 'i2c' -> Xiao_Rp2040.i2c_12
  label 'gnd' -> Hdc1080.gnd
  label 'gnd' -> Xiao_Rp2040.gnd
  label 'vdd' -> Hdc1080.pwr
  label 'vdd' -> Xiao_Rp2040.pwr_out
  label 'vdd' -> I2cPullup.pwr
"###);
}

#[test]
fn snapshot_implicit_i2c_connections() {
    let (graph, conns) = build("iot_sensor_implicit_i2c.json");
    insta::assert_snapshot!(conns.describe(&graph), @r###"
vusb [scalar]: UsbCReceptacle.pwr, Ldl1117.pwr_in
gnd [scalar]: Ldl1117.gnd, Esp32_Wroom_32.gnd, Hdc1080.gnd, Bme680.gnd, Bh1750.gnd, UsbCReceptacle.gnd
i2c [scalar]: Bme680.i2c, Bh1750.i2c, Hdc1080.i2c, Esp32_Wroom_32.i2c_16
v3v3 [scalar]: Esp32_Wroom_32.pwr, Hdc1080.pwr, Bme680.pwr, Bh1750.pwr, Ldl1117.pwr_out
"###);
}

#[test]
fn snapshot_mixed_shape_connections() {
    let (graph, conns) = build("mixed_shape.json");
    insta::assert_snapshot!(conns.describe(&graph), @"sig [mixed]: Mcu.gpio, Led.signal");
}

#[test]
fn snapshot_bad_port_name_result() {
    insta::assert_snapshot!(result_json("bad_port_name.json"), @r###"
{
  "edgHdl": "",
  "errors": [
    {
      "path": [
        "A",
        "out-1"
      ],
      "kind": "invalid input",
      "details": "invalid port name"
    }
  ]
}
"###);
}

#[test]
fn snapshot_string_arg_result() {
    insta::assert_snapshot!(result_json("string_arg.json"), @r###"
{
  "edgHdl": "",
  "errors": [
    {
      "path": [
        "A",
        "label"
      ],
      "kind": "invalid input",
      "name": "string",
      "details": "string arguments are not supported"
    }
  ]
}
"###);
}

#[test]
fn snapshot_malformed_result() {
    insta::assert_snapshot!(result_json("malformed.json"), @r###"
{
  "edgHdl": "",
  "errors": [
    {
      "path": [],
      "kind": "invalid input",
      "details": "format error"
    }
  ]
}
"###);
}
