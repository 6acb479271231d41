//! The graph encoder / driver.
//!
//! A pass is a linear pipeline: seed placeholders, encode call nodes in
//! definition order, resolve outputs, serialize. Any encoder error is fatal
//! for the whole pass and no partial artifact is emitted; operators without
//! a registered encoder only log a warning and are skipped (partial
//! encoding is permitted; the eligibility filter should have excluded them
//! upstream, so reaching that path is worth surfacing but not halting on).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tensorsmt_ir::{Argument, Graph, NodeKind};
use tensorsmt_smt::SmtExpr;

use crate::encode::EncoderRegistry;
use crate::error::BackendError;
use crate::regfile::TypeTag;
use crate::state::State;

/// Key of the debug side-channel entry listing the resolved output
/// expressions.
pub const FINAL_SMT_EXPRS_KEY: &str = "final_smt_exprs";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Combine every encoded node's defining equation plus the overall
    /// precondition into one conjunction. When off, the artifact carries
    /// only the resolved output expressions.
    pub whole_formula: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        PreprocessConfig {
            whole_formula: true,
        }
    }
}

/// The serialized artifact plus the debug side-channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreprocessResult {
    /// UTF-8 text of the final combined expression.
    pub processed_bytes: Vec<u8>,
    pub debug_map: BTreeMap<String, String>,
}

impl PreprocessResult {
    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.processed_bytes)
    }
}

/// The symbolic lowering backend.
pub struct SmtBackend;

impl SmtBackend {
    /// Encode the graph into one combined formula.
    ///
    /// # Examples
    ///
    /// ```
    /// use tensorsmt_backend::{PreprocessConfig, SmtBackend};
    /// use tensorsmt_ir::{Argument, Graph, Metadata, NodeKind, PlaceholderRole};
    ///
    /// let mut graph = Graph::new();
    /// let x = graph
    ///     .add_node(
    ///         NodeKind::Placeholder(PlaceholderRole::UserInput),
    ///         "x",
    ///         "x",
    ///         vec![],
    ///         Metadata::new(),
    ///     )
    ///     .unwrap();
    /// let add = graph
    ///     .add_node(
    ///         NodeKind::CallOperator,
    ///         "aten.add.Tensor",
    ///         "add",
    ///         vec![Argument::Node(x), Argument::Node(x)],
    ///         Metadata::new(),
    ///     )
    ///     .unwrap();
    /// graph
    ///     .add_node(
    ///         NodeKind::Output,
    ///         "output",
    ///         "output",
    ///         vec![Argument::Node(add)],
    ///         Metadata::new(),
    ///     )
    ///     .unwrap();
    ///
    /// let result = SmtBackend::preprocess(&graph, &PreprocessConfig::default()).unwrap();
    /// assert!(result.payload_str().contains("(+ x x)"));
    /// ```
    pub fn preprocess(
        graph: &Graph,
        config: &PreprocessConfig,
    ) -> Result<PreprocessResult, BackendError> {
        let registry = EncoderRegistry::build()?;
        let mut state = State::new();

        Self::seed_placeholders(graph, &mut state)?;
        let encoded = Self::encode_operators(graph, &registry, &mut state)?;
        let outputs = Self::resolve_outputs(graph, &state)?;
        Self::serialize(config, &state, &encoded, &outputs)
    }

    /// Bind every placeholder: parameters, buffers and lifted constants
    /// become constants via the scalar-conversion rule; free inputs become
    /// fresh named variables.
    fn seed_placeholders(graph: &Graph, state: &mut State) -> Result<(), BackendError> {
        for node in graph.nodes() {
            let NodeKind::Placeholder(role) = node.kind else {
                continue;
            };
            let (expr, vtype) = if role.is_parameter_like() {
                match node.meta.value.as_ref().and_then(|v| v.first_element()) {
                    Some(v) => (SmtExpr::real(v), TypeTag::Float),
                    // Not concretizable: substitute a fresh symbol keyed by
                    // the attribute's name. Logged, not failed: exported
                    // programs may carry shape-dependent scalars.
                    None => {
                        tracing::debug!(
                            value = %node.name,
                            "placeholder payload not concretizable; using a symbol"
                        );
                        (SmtExpr::var(node.name.clone()), TypeTag::Tensor)
                    }
                }
            } else {
                (SmtExpr::var(node.name.clone()), TypeTag::Tensor)
            };
            state.regs.bind(node.id, expr, vtype)?;
            tracing::debug!(placeholder = %node.name, "seeded placeholder");
        }
        Ok(())
    }

    /// Encode every call node with a registered encoder; skip the rest with
    /// a warning. Returns `(name, expression)` per encoded node, in
    /// definition order.
    fn encode_operators(
        graph: &Graph,
        registry: &EncoderRegistry,
        state: &mut State,
    ) -> Result<Vec<(String, SmtExpr)>, BackendError> {
        let mut encoded = Vec::new();
        for node in graph.nodes() {
            if node.kind != NodeKind::CallOperator {
                continue;
            }
            match registry.get(&node.target) {
                Some(op) => {
                    let expr = op.encode(node, graph, state)?;
                    tracing::debug!(node = %node.name, target = %node.target, expr = %expr, "encoded");
                    encoded.push((node.name.clone(), expr));
                }
                None if state.regs.contains(node.id) => {
                    // Already bound by a fusing producer (trailing ReLU).
                    tracing::debug!(node = %node.name, target = %node.target, "bound by fusion");
                }
                None => {
                    tracing::warn!(
                        target = %node.target,
                        node = %node.name,
                        "operator not supported by the SMT backend; skipping"
                    );
                }
            }
        }
        Ok(encoded)
    }

    /// Resolve each output node to its bound expression(s): a single value
    /// binds directly, several pack into an ordered tuple.
    fn resolve_outputs(graph: &Graph, state: &State) -> Result<Vec<SmtExpr>, BackendError> {
        let mut outputs = Vec::new();
        for out in graph.outputs() {
            let mut exprs = Vec::new();
            for arg in &out.args {
                match arg {
                    Argument::Node(id) => exprs.push(state.regs.expr(*id)?.clone()),
                    Argument::NodeList(ids) => {
                        for id in ids {
                            exprs.push(state.regs.expr(*id)?.clone());
                        }
                    }
                    _ => {}
                }
            }
            match exprs.len() {
                0 => {}
                1 => outputs.push(exprs.remove(0)),
                _ => outputs.push(SmtExpr::call("tuple", exprs)),
            }
        }
        Ok(outputs)
    }

    fn serialize(
        config: &PreprocessConfig,
        state: &State,
        encoded: &[(String, SmtExpr)],
        outputs: &[SmtExpr],
    ) -> Result<PreprocessResult, BackendError> {
        let payload = if config.whole_formula {
            // One defining equation per encoded node, conjoined with the
            // overall precondition.
            let mut formula = state.precondition().clone();
            for (name, expr) in encoded {
                let lhs = SmtExpr::var(name.clone());
                let equation = SmtExpr::eq(lhs, expr.clone())?;
                formula = SmtExpr::and(formula, equation)?;
            }
            formula.to_string()
        } else {
            outputs
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        };

        let mut debug_map = BTreeMap::new();
        debug_map.insert(
            FINAL_SMT_EXPRS_KEY.to_string(),
            outputs
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        );

        Ok(PreprocessResult {
            processed_bytes: payload.into_bytes(),
            debug_map,
        })
    }
}

/// Convenience accessor used by tests and diagnostics: encode and return
/// the state alongside the result.
pub fn preprocess_with_state(
    graph: &Graph,
    config: &PreprocessConfig,
) -> Result<(PreprocessResult, State), BackendError> {
    let registry = EncoderRegistry::build()?;
    let mut state = State::new();
    SmtBackend::seed_placeholders(graph, &mut state)?;
    let encoded = SmtBackend::encode_operators(graph, &registry, &mut state)?;
    let outputs = SmtBackend::resolve_outputs(graph, &state)?;
    let result = SmtBackend::serialize(config, &state, &encoded, &outputs)?;
    Ok((result, state))
}
