//! Shared test fixtures: event payloads, resume contexts, and node
//! behaviors exercising the engine the way game code would.
#![allow(dead_code)]

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use ability_flow::graph::GraphNode;
use ability_flow::{
    ConnectionData, EligibilityContext, EventContext, ExecutionContext, FlowState, NextMove,
    NodeBehavior, NodeData, NodeRegistry, NodeVariant, PortKind, ResumeContext, StatId,
    StatModifier, StatRefreshEvent, FLOW_IN, FLOW_OUT,
};

/// Shared observation log for execution-order assertions.
pub type Log = Rc<RefCell<Vec<String>>>;

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn log_contents(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

pub fn rc_event(event: impl EventContext) -> Rc<dyn EventContext> {
    Rc::new(event)
}

// === Event payloads ===

#[derive(Debug)]
pub struct PingEvent {
    pub value: i64,
}

impl EventContext for PingEvent {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct PongEvent;

impl EventContext for PongEvent {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// === Resume contexts ===

#[derive(Debug)]
pub struct TargetPicked {
    pub target: i64,
}

impl ResumeContext for TargetPicked {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct WrongResume;

impl ResumeContext for WrongResume {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// === Node behaviors ===

/// Entry accepting any payload, even none.
pub struct AnyEntry;

impl NodeBehavior for AnyEntry {
    fn can_execute(&self, _ctx: &EligibilityContext<'_>, _payload: Option<&dyn EventContext>) -> bool {
        true
    }
}

/// Entry accepting only `PingEvent` payloads.
pub struct PingEntry;

impl NodeBehavior for PingEntry {
    fn can_execute(&self, _ctx: &EligibilityContext<'_>, payload: Option<&dyn EventContext>) -> bool {
        payload.is_some_and(|payload| payload.is::<PingEvent>())
    }
}

/// Entry accepting only `PongEvent` payloads.
pub struct PongEntry;

impl NodeBehavior for PongEntry {
    fn can_execute(&self, _ctx: &EligibilityContext<'_>, payload: Option<&dyn EventContext>) -> bool {
        payload.is_some_and(|payload| payload.is::<PongEvent>())
    }
}

/// Entry accepting only the synthetic stat refresh payload.
pub struct RefreshEntry;

impl NodeBehavior for RefreshEntry {
    fn can_execute(&self, _ctx: &EligibilityContext<'_>, payload: Option<&dyn EventContext>) -> bool {
        payload.is_some_and(|payload| payload.is::<StatRefreshEvent>())
    }
}

/// Process node appending its label to the shared log.
pub struct LogNode {
    pub label: String,
    pub log: Log,
}

impl NodeBehavior for LogNode {
    fn on_execute(&mut self, _ctx: &mut ExecutionContext<'_>) -> FlowState {
        self.log.borrow_mut().push(self.label.clone());
        FlowState::Success
    }
}

/// Process node writing a constant to its `out` outport.
pub struct SetValueNode {
    pub value: i64,
}

impl NodeBehavior for SetValueNode {
    fn on_execute(&mut self, ctx: &mut ExecutionContext<'_>) -> FlowState {
        ctx.write_outport("out", self.value);
        FlowState::Success
    }
}

/// Process node copying its `in` inport into the `result` blackboard
/// variable (-1 when the value is missing).
pub struct ReadToBlackboardNode;

impl NodeBehavior for ReadToBlackboardNode {
    fn on_execute(&mut self, ctx: &mut ExecutionContext<'_>) -> FlowState {
        let value = ctx.read_inport("in").as_int().unwrap_or(-1);
        ctx.blackboard_mut().set("result", value);
        FlowState::Success
    }
}

/// Value node exposing a constant on its `value` outport, counting
/// evaluations.
pub struct ConstValueNode {
    pub value: i64,
    pub evaluations: Rc<RefCell<u32>>,
}

impl NodeBehavior for ConstValueNode {
    fn evaluate(&mut self, ctx: &mut ExecutionContext<'_>) {
        *self.evaluations.borrow_mut() += 1;
        ctx.write_outport("value", self.value);
    }
}

/// Process node that pauses awaiting a [`TargetPicked`] resume, then
/// records the picked target in the `target` blackboard variable.
pub struct PauseNode;

impl NodeBehavior for PauseNode {
    fn on_execute(&mut self, _ctx: &mut ExecutionContext<'_>) -> FlowState {
        FlowState::Pause
    }

    fn check_resume(&self, resume: &dyn ResumeContext) -> bool {
        resume.is::<TargetPicked>()
    }

    fn resume(&mut self, ctx: &mut ExecutionContext<'_>, resume: &dyn ResumeContext) -> FlowState {
        let Some(picked) = resume.downcast_ref::<TargetPicked>() else {
            return FlowState::Abort;
        };
        ctx.blackboard_mut().set("target", picked.target);
        FlowState::Success
    }
}

/// Process node enqueueing a `PongEvent` follow-up.
pub struct CascadeNode;

impl NodeBehavior for CascadeNode {
    fn on_execute(&mut self, ctx: &mut ExecutionContext<'_>) -> FlowState {
        ctx.enqueue_event(PongEvent);
        FlowState::Success
    }
}

/// Process node appending a stat modifier to its owner.
pub struct ModifierNode {
    pub modifier: StatModifier,
}

impl NodeBehavior for ModifierNode {
    fn on_execute(&mut self, ctx: &mut ExecutionContext<'_>) -> FlowState {
        match ctx.owner_mut() {
            Some(owner) => {
                owner.append_modifier(self.modifier);
                FlowState::Success
            }
            None => FlowState::Abort,
        }
    }
}

/// User-data flag gating [`GateEntry`].
pub struct GateFlag(pub bool);

/// Entry eligible only while the instance's user data holds an enabled
/// [`GateFlag`].
pub struct GateEntry;

impl NodeBehavior for GateEntry {
    fn can_execute(&self, ctx: &EligibilityContext<'_>, _payload: Option<&dyn EventContext>) -> bool {
        ctx.user_data::<GateFlag>().is_some_and(|flag| flag.0)
    }
}

/// Entry gated on an owner stat covering a cost, the way a play-card
/// check compares mana against card cost.
pub struct CostEntry {
    pub stat: StatId,
    pub cost: i64,
}

impl NodeBehavior for CostEntry {
    fn can_execute(&self, ctx: &EligibilityContext<'_>, payload: Option<&dyn EventContext>) -> bool {
        if !payload.is_some_and(|payload| payload.is::<PingEvent>()) {
            return false;
        }
        ctx.owner()
            .and_then(|owner| owner.stat_value(self.stat))
            .is_some_and(|value| value >= self.cost)
    }
}

/// Process node copying the ping payload's value onto its `out`
/// outport.
pub struct PayloadValueNode;

impl NodeBehavior for PayloadValueNode {
    fn on_execute(&mut self, ctx: &mut ExecutionContext<'_>) -> FlowState {
        let value = ctx.payload::<PingEvent>().map_or(0, |ping| ping.value);
        ctx.write_outport("out", value);
        FlowState::Success
    }
}

enum SelectionState {
    Initial,
    Selection,
    Complete,
}

/// Entry node reproducing the selection push pattern: when a
/// `selection` successor is wired, the node pushes itself and completes
/// on its second run. The pushed node wins over the `Next` relation, so
/// the wired selection successor itself never executes.
pub struct SelectionEntry {
    state: SelectionState,
    log: Log,
}

impl SelectionEntry {
    pub fn new(log: Log) -> Self {
        Self {
            state: SelectionState::Initial,
            log,
        }
    }
}

impl NodeBehavior for SelectionEntry {
    fn can_execute(&self, _ctx: &EligibilityContext<'_>, payload: Option<&dyn EventContext>) -> bool {
        payload.is_some_and(|payload| payload.is::<PingEvent>())
    }

    fn on_execute(&mut self, ctx: &mut ExecutionContext<'_>) -> FlowState {
        self.log.borrow_mut().push("entry".to_string());
        match self.state {
            SelectionState::Initial => {
                if ctx.flow_target("selection").is_some() {
                    self.state = SelectionState::Selection;
                    ctx.push_self();
                } else {
                    self.state = SelectionState::Complete;
                }
            }
            SelectionState::Selection => {
                self.state = SelectionState::Complete;
            }
            SelectionState::Complete => {}
        }
        FlowState::Success
    }

    fn next(&self) -> NextMove {
        // The pushed re-run advances past Selection before the cursor
        // asks for a successor, so only Initial and Complete are
        // observable here.
        match self.state {
            SelectionState::Initial => NextMove::Stop,
            SelectionState::Selection | SelectionState::Complete => NextMove::Follow,
        }
    }

    fn reset(&mut self) {
        self.state = SelectionState::Initial;
    }
}

/// Process node routing to its `alt` successor when the `use_alt`
/// blackboard variable is set, and to its normal successor otherwise.
pub struct ForkNode {
    use_alt: bool,
}

impl NodeBehavior for ForkNode {
    fn on_execute(&mut self, ctx: &mut ExecutionContext<'_>) -> FlowState {
        self.use_alt = ctx.blackboard().get("use_alt") != 0;
        FlowState::Success
    }

    fn next(&self) -> NextMove {
        if self.use_alt {
            NextMove::Branch("alt".to_string())
        } else {
            NextMove::Follow
        }
    }

    fn reset(&mut self) {
        self.use_alt = false;
    }
}

// === Registry and graph-building helpers ===

pub fn param_i64(node: &GraphNode, key: &str) -> i64 {
    node.params()[key].as_i64().unwrap_or(0)
}

pub fn param_str(node: &GraphNode, key: &str) -> String {
    node.params()[key].as_str().unwrap_or("").to_string()
}

fn param_modifier(node: &GraphNode) -> StatModifier {
    let stat = StatId::new(param_i64(node, "stat") as u32);
    let value = param_i64(node, "value");
    match param_str(node, "op").as_str() {
        "mul" => StatModifier::mul(stat, value),
        _ => StatModifier::add(stat, value),
    }
}

/// Registry with every fixture node kind wired to the shared log.
pub fn test_registry(log: &Log) -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    registry.register("AnyEntry", |_node| Box::new(AnyEntry));
    registry.register("PingEntry", |_node| Box::new(PingEntry));
    registry.register("PongEntry", |_node| Box::new(PongEntry));
    registry.register("RefreshEntry", |_node| Box::new(RefreshEntry));

    let log_for_nodes = log.clone();
    registry.register("Log", move |node| {
        Box::new(LogNode {
            label: param_str(node, "label"),
            log: log_for_nodes.clone(),
        })
    });

    registry.register("SetValue", |node| {
        Box::new(SetValueNode {
            value: param_i64(node, "value"),
        })
    });
    registry.register("ReadToBlackboard", |_node| Box::new(ReadToBlackboardNode));
    registry.register("Pause", |_node| Box::new(PauseNode));
    registry.register("Cascade", |_node| Box::new(CascadeNode));
    registry.register("GateEntry", |_node| Box::new(GateEntry));
    registry.register("PayloadValue", |_node| Box::new(PayloadValueNode));
    registry.register("CostEntry", |node| {
        Box::new(CostEntry {
            stat: StatId::new(param_i64(node, "stat") as u32),
            cost: param_i64(node, "cost"),
        })
    });
    registry.register("Modifier", |node| {
        Box::new(ModifierNode {
            modifier: param_modifier(node),
        })
    });

    registry.register("Fork", |_node| Box::new(ForkNode { use_alt: false }));

    let log_for_selection = log.clone();
    registry.register("SelectionEntry", move |_node| {
        Box::new(SelectionEntry::new(log_for_selection.clone()))
    });

    registry
}

/// An entry node declaration with the conventional flow outport.
pub fn entry_node(id: u32, kind: &str) -> NodeData {
    NodeData::new(id, kind, NodeVariant::Entry).with_outport(FLOW_OUT, PortKind::Flow)
}

/// A process node declaration with the conventional flow ports.
pub fn process_node(id: u32, kind: &str) -> NodeData {
    NodeData::new(id, kind, NodeVariant::Process)
        .with_inport(FLOW_IN, PortKind::Flow)
        .with_outport(FLOW_OUT, PortKind::Flow)
}

/// The conventional flow connection between two nodes.
pub fn flow_connection(from: u32, to: u32) -> ConnectionData {
    ConnectionData::new(from, FLOW_OUT, to, FLOW_IN)
}
