//! Scenario wiring and execution
//!
//! [`Scenario::build`] turns a [`ScenarioConfig`] into a live graph of
//! `pinflow_core` nodes over [`serde_json::Value`]s; [`Scenario::run`] drives
//! its scripted steps and returns what the sinks received, in delivery order.
//!
//! Gates emit their chunks as JSON arrays so every node in a scenario shares
//! one value type.

use pinflow_core::flow::FlowConnect;
use pinflow_core::{
    Actor, Chunk, Converter, Filter, Gate, GateControl, HasInput, HasOutput, Input, OutputPin,
    Signal, Stage, Transformer,
};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::config::{NodeConfig, ScenarioConfig, StepConfig};
use crate::error::{Result, ScenarioError};

/// A value delivered to a sink node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinkRecord {
    /// Name of the sink node
    pub sink: String,
    /// Delivered value
    pub value: Value,
}

/// Emits array elements one by one; other values pass through unchanged
#[derive(Debug, Default)]
pub struct SplitStage;

impl Stage<Value, Value> for SplitStage {
    fn process(&self, value: Value, out: &OutputPin<Value>) -> pinflow_core::Result<()> {
        match value {
            Value::Array(items) => items.into_iter().try_for_each(|item| out.emit(item)),
            other => out.emit(other),
        }
    }
}

/// Drop repeated elements from a JSON array, keeping first occurrences
fn dedupe_array(value: Value) -> pinflow_core::Result<Value> {
    match value {
        Value::Array(items) => {
            let mut seen = HashSet::with_capacity(items.len());
            Ok(Value::Array(
                items
                    .into_iter()
                    .filter(|item| seen.insert(item.to_string()))
                    .collect(),
            ))
        }
        other => Err(pinflow_core::Error::callback(format!(
            "deduplicate expects a JSON array, got {}",
            other
        ))),
    }
}

fn field_matches(value: &Value, field: &str, equals: Option<&Value>) -> bool {
    match (value.get(field), equals) {
        (None | Some(Value::Null), _) => false,
        (Some(_), None) => true,
        (Some(actual), Some(expected)) => actual == expected,
    }
}

/// A built node
enum Node {
    Gate {
        gate: Gate<Value>,
        batches: Converter<Chunk<Value>, Value>,
    },
    Deduplicate(Converter<Value, Value>),
    Split(Transformer<Value, Value, SplitStage>),
    Filter(Filter<Value>),
    Sink(Actor<Value>),
    Control(Input<Signal>),
}

impl Node {
    fn input(&self) -> Option<Input<Value>> {
        match self {
            Self::Gate { gate, .. } => Some(gate.input()),
            Self::Deduplicate(c) => Some(c.input()),
            Self::Split(s) => Some(s.input()),
            Self::Filter(f) => Some(f.input()),
            Self::Sink(a) => Some(a.input()),
            Self::Control(_) => None,
        }
    }

    fn output(&self) -> Option<&OutputPin<Value>> {
        match self {
            Self::Gate { batches, .. } => Some(batches.output()),
            Self::Deduplicate(c) => Some(c.output()),
            Self::Split(s) => Some(s.output()),
            Self::Filter(f) => Some(f.output()),
            Self::Sink(_) | Self::Control(_) => None,
        }
    }

    fn control(&self) -> Option<Input<Signal>> {
        match self {
            Self::Gate { gate, .. } => Some(gate.state()),
            Self::Control(pin) => Some(Rc::clone(pin)),
            _ => None,
        }
    }
}

/// A wired graph plus the steps that drive it
pub struct Scenario {
    name: String,
    nodes: HashMap<String, Node>,
    steps: Vec<StepConfig>,
    records: Rc<RefCell<Vec<SinkRecord>>>,
}

impl Scenario {
    /// Build and wire all nodes of a scenario
    pub fn build(config: &ScenarioConfig) -> Result<Self> {
        let records = Rc::new(RefCell::new(Vec::new()));
        let mut nodes: HashMap<String, Node> = HashMap::with_capacity(config.nodes.len());

        // Controllers wrap a gate's state pin, so gates are built first.
        let (controllers, plain): (Vec<_>, Vec<_>) = config
            .nodes
            .iter()
            .partition(|n| n.controlled_gate().is_some());

        for node in plain.into_iter().chain(controllers) {
            let name = node.name();
            if nodes.contains_key(name) {
                return Err(ScenarioError::invalid(format!(
                    "duplicate node name '{}'",
                    name
                )));
            }
            let built = build_node(node, &nodes, &records)?;
            tracing::debug!(scenario = %config.name, node = name, "node built");
            nodes.insert(name.to_string(), built);
        }

        for connection in &config.connections {
            let from = lookup(&nodes, &connection.from)?;
            let to = lookup(&nodes, &connection.to)?;
            let output = from.output().ok_or_else(|| {
                ScenarioError::invalid(format!("node '{}' has no output pin", connection.from))
            })?;
            let input = to.input().ok_or_else(|| {
                ScenarioError::invalid(format!("node '{}' has no value input pin", connection.to))
            })?;
            output.connect(input);
            tracing::debug!(from = %connection.from, to = %connection.to, "connected");
        }

        let scenario = Self {
            name: config.name.clone(),
            nodes,
            steps: config.steps.clone(),
            records,
        };
        for step in &scenario.steps {
            scenario.check_step(step)?;
        }
        Ok(scenario)
    }

    /// Scenario name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of built nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Put a value on a node's input pin
    pub fn put(&self, node: &str, value: Value) -> Result<()> {
        let input = lookup(&self.nodes, node)?.input().ok_or_else(|| {
            ScenarioError::invalid(format!("node '{}' does not accept values", node))
        })?;
        input.put(value)?;
        Ok(())
    }

    /// Send a signal to a gate or nestable controller
    pub fn signal(&self, node: &str, signal: Signal) -> Result<()> {
        let control = lookup(&self.nodes, node)?.control().ok_or_else(|| {
            ScenarioError::invalid(format!(
                "node '{}' does not accept open/close signals",
                node
            ))
        })?;
        match signal {
            Signal::Open => control.open()?,
            Signal::Close => control.close()?,
        }
        Ok(())
    }

    /// Run every scripted step, returning the sink records they produced
    ///
    /// The first failing step aborts the run and its error is returned.
    pub fn run(&self) -> Result<Vec<SinkRecord>> {
        for (index, step) in self.steps.iter().enumerate() {
            tracing::debug!(scenario = %self.name, step = index, ?step, "running step");
            match step {
                StepConfig::Put { node, value } => self.put(node, value.clone())?,
                StepConfig::Open(node) => self.signal(node, Signal::Open)?,
                StepConfig::Close(node) => self.signal(node, Signal::Close)?,
            }
        }
        Ok(self.take_records())
    }

    /// Drain the records collected so far
    pub fn take_records(&self) -> Vec<SinkRecord> {
        std::mem::take(&mut *self.records.borrow_mut())
    }

    fn check_step(&self, step: &StepConfig) -> Result<()> {
        let (name, ok) = match step {
            StepConfig::Put { node, .. } => (node, lookup(&self.nodes, node)?.input().is_some()),
            StepConfig::Open(node) | StepConfig::Close(node) => {
                (node, lookup(&self.nodes, node)?.control().is_some())
            }
        };
        if ok {
            Ok(())
        } else {
            Err(ScenarioError::invalid(format!(
                "step targets node '{}' which cannot handle it",
                name
            )))
        }
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("nodes", &self.nodes.len())
            .field("steps", &self.steps.len())
            .finish()
    }
}

fn lookup<'a>(nodes: &'a HashMap<String, Node>, name: &str) -> Result<&'a Node> {
    nodes.get(name).ok_or_else(|| ScenarioError::UnknownNode {
        name: name.to_string(),
    })
}

fn build_node(
    config: &NodeConfig,
    built: &HashMap<String, Node>,
    records: &Rc<RefCell<Vec<SinkRecord>>>,
) -> Result<Node> {
    let node = match config {
        NodeConfig::Gate { .. } => {
            let gate: Gate<Value> = Gate::new();
            let batches = gate
                .output()
                .convert(|chunk: Chunk<Value>| Ok(Value::Array(chunk)));
            Node::Gate { gate, batches }
        }
        NodeConfig::Deduplicate { .. } => Node::Deduplicate(Converter::new(dedupe_array)),
        NodeConfig::Split { .. } => Node::Split(Transformer::new(SplitStage)),
        NodeConfig::Filter { field, equals, .. } => {
            let (field, equals) = (field.clone(), equals.clone());
            Node::Filter(Filter::new(move |value: &Value| {
                Ok(field_matches(value, &field, equals.as_ref()))
            }))
        }
        NodeConfig::Sink { name } => {
            let (sink, records) = (name.clone(), Rc::clone(records));
            Node::Sink(Actor::new(move |value: Value| {
                records.borrow_mut().push(SinkRecord {
                    sink: sink.clone(),
                    value,
                });
                Ok(())
            }))
        }
        NodeConfig::Opener { gate, .. } => {
            Node::Control(gate_state(built, gate)?.nestable_opener())
        }
        NodeConfig::Closer { gate, .. } => {
            Node::Control(gate_state(built, gate)?.nestable_closer())
        }
    };
    Ok(node)
}

fn gate_state(built: &HashMap<String, Node>, gate: &str) -> Result<Input<Signal>> {
    match lookup(built, gate)? {
        Node::Gate { gate, .. } => Ok(gate.state()),
        _ => Err(ScenarioError::invalid(format!("'{}' is not a gate", gate))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scenario(yaml: &str) -> Result<Scenario> {
        Scenario::build(&ScenarioConfig::parse(yaml)?)
    }

    #[test]
    fn test_gate_chunk_reaches_sink() {
        let s = scenario(
            r#"
name: gate
nodes:
  - { name: g, kind: gate }
  - { name: out, kind: sink }
connections:
  - { from: g, to: out }
steps:
  - put: { node: g, value: 1 }
  - put: { node: g, value: 2 }
  - open: g
  - put: { node: g, value: 3 }
"#,
        )
        .unwrap();
        let records = s.run().unwrap();
        let values: Vec<_> = records.into_iter().map(|r| r.value).collect();
        assert_eq!(values, vec![json!([1, 2]), json!([3])]);
    }

    #[test]
    fn test_split_and_filter() {
        let s = scenario(
            r#"
name: split
nodes:
  - { name: split, kind: split }
  - { name: active, kind: filter, field: status, equals: active }
  - { name: out, kind: sink }
connections:
  - { from: split, to: active }
  - { from: active, to: out }
"#,
        )
        .unwrap();
        s.put(
            "split",
            json!([{"status": "active", "id": 1}, {"status": "idle", "id": 2}, {"id": 3}]),
        )
        .unwrap();
        let records = s.take_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value["id"], 1);
    }

    #[test]
    fn test_opener_controls_gate() {
        let s = scenario(
            r#"
name: nested
nodes:
  - { name: hold, kind: opener, gate: g }
  - { name: g, kind: gate }
  - { name: out, kind: sink }
connections:
  - { from: g, to: out }
steps:
  - put: { node: g, value: a }
  - open: hold
  - open: hold
  - close: hold
  - put: { node: g, value: b }
  - close: hold
  - put: { node: g, value: c }
"#,
        )
        .unwrap();
        let values: Vec<_> = s.run().unwrap().into_iter().map(|r| r.value).collect();
        assert_eq!(values, vec![json!(["a"]), json!(["b"])]);
    }

    #[test]
    fn test_unbalanced_close_aborts_run() {
        let s = scenario(
            r#"
name: unbalanced
nodes:
  - { name: g, kind: gate }
  - { name: hold, kind: closer, gate: g }
steps:
  - open: hold
"#,
        )
        .unwrap();
        assert!(matches!(
            s.run(),
            Err(ScenarioError::Graph(
                pinflow_core::Error::UnbalancedSignal { .. }
            ))
        ));
    }

    #[test]
    fn test_dedupe_behind_gate() {
        let s = scenario(
            r#"
name: dedupe
nodes:
  - { name: g, kind: gate }
  - { name: dedup, kind: deduplicate }
  - { name: out, kind: sink }
connections:
  - { from: g, to: dedup }
  - { from: dedup, to: out }
steps:
  - put: { node: g, value: { id: 1 } }
  - put: { node: g, value: { id: 2 } }
  - put: { node: g, value: { id: 1 } }
  - open: g
"#,
        )
        .unwrap();
        let records = s.run().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, json!([{"id": 1}, {"id": 2}]));
    }

    #[test]
    fn test_dedupe_rejects_non_array_and_stops_run() {
        let s = scenario(
            r#"
name: broken
nodes:
  - { name: dedup, kind: deduplicate }
  - { name: out, kind: sink }
connections:
  - { from: dedup, to: out }
steps:
  - put: { node: dedup, value: [1, 1] }
  - put: { node: dedup, value: 5 }
  - put: { node: dedup, value: [2] }
"#,
        )
        .unwrap();
        let err = s.run().unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Graph(pinflow_core::Error::Callback(_))
        ));
        // The value delivered before the failing step is still recorded.
        assert_eq!(s.take_records().len(), 1);
    }

    #[test]
    fn test_dedupe_array() {
        assert_eq!(
            dedupe_array(json!([1, {"a": 1}, 1, {"a": 1}, 2])).unwrap(),
            json!([1, {"a": 1}, 2])
        );
        assert!(dedupe_array(json!("x")).is_err());
    }

    #[test]
    fn test_duplicate_node_name() {
        let err = scenario(
            "name: d\nnodes:\n  - { name: a, kind: sink }\n  - { name: a, kind: gate }\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate node name 'a'"));
    }

    #[test]
    fn test_unknown_connection_target() {
        let err = scenario(
            "name: d\nnodes:\n  - { name: a, kind: gate }\nconnections:\n  - { from: a, to: b }\n",
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownNode { name } if name == "b"));
    }

    #[test]
    fn test_sink_has_no_output() {
        let err = scenario(
            "name: d\nnodes:\n  - { name: a, kind: sink }\n  - { name: b, kind: sink }\nconnections:\n  - { from: a, to: b }\n",
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_opener_must_target_gate() {
        let err = scenario(
            "name: d\nnodes:\n  - { name: a, kind: sink }\n  - { name: o, kind: opener, gate: a }\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("'a' is not a gate"));
    }

    #[test]
    fn test_open_step_on_sink_is_rejected() {
        let err = scenario("name: d\nnodes:\n  - { name: a, kind: sink }\nsteps:\n  - open: a\n")
            .unwrap_err();
        assert!(matches!(err, ScenarioError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_field_matches() {
        let v = json!({"a": 1, "n": null});
        assert!(field_matches(&v, "a", None));
        assert!(field_matches(&v, "a", Some(&json!(1))));
        assert!(!field_matches(&v, "a", Some(&json!(2))));
        assert!(!field_matches(&v, "n", None));
        assert!(!field_matches(&v, "missing", None));
        assert!(!field_matches(&json!(5), "a", None));
    }
}
