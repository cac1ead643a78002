use crate::adapter::Payload;
use crate::compiler::DependencyEdge;
use crate::error::ExecutionError;
use ahash::AHashMap;
use itertools::Itertools;

/// Assembles the input payload for one operation from its inbound edges
/// and the externally supplied inputs.
///
/// Wired values win over external fields of the same name; external
/// fields are merged in untouched otherwise, so operations read their
/// declared external parameters straight from the caller's input object.
pub(super) fn assemble_input(
    step_id: &str,
    edges: &[DependencyEdge],
    external: &Payload,
    completed: &AHashMap<String, Payload>,
) -> Result<Payload, ExecutionError> {
    let mut input = serde_json::Map::new();

    let inbound = edges.iter().filter(|edge| edge.consumer == step_id);

    // Edges are emitted parameter-by-parameter by the inferencer, so
    // consecutive grouping recovers the per-parameter sets in order.
    for (param, param_edges) in &inbound.chunk_by(|edge| edge.param.clone()) {
        let param_edges: Vec<&DependencyEdge> = param_edges.collect();
        let value = wire_param(step_id, &param_edges, completed)?;
        input.insert(param, value);
    }

    if let Payload::Object(fields) = external {
        for (name, value) in fields {
            input.entry(name.clone()).or_insert_with(|| value.clone());
        }
    }

    Ok(Payload::Object(input))
}

/// Resolves one parameter from its producer edges. Element-matched edges
/// collect into an array (several producers may feed one list
/// parameter); otherwise the first producer in declaration order wins.
fn wire_param(
    consumer: &str,
    edges: &[&DependencyEdge],
    completed: &AHashMap<String, Payload>,
) -> Result<Payload, ExecutionError> {
    let collects = edges.iter().any(|edge| edge.element);

    if collects {
        let mut items = Vec::new();
        for edge in edges {
            let value = extract(consumer, edge, completed)?;
            if edge.element {
                items.push(value);
            } else if let Payload::Array(inner) = value {
                // A producer whose output is already a list contributes
                // its elements.
                items.extend(inner);
            } else {
                items.push(value);
            }
        }
        Ok(Payload::Array(items))
    } else {
        let first = edges
            .first()
            .expect("wire_param is only called with at least one edge");
        extract(consumer, first, completed)
    }
}

/// Reads a producer's completed output, descending the aggregate access
/// path when the value sits inside a nested group's record.
fn extract(
    consumer: &str,
    edge: &DependencyEdge,
    completed: &AHashMap<String, Payload>,
) -> Result<Payload, ExecutionError> {
    let mut current =
        completed
            .get(&edge.producer)
            .ok_or_else(|| ExecutionError::MissingProducerOutput {
                producer: edge.producer.clone(),
                consumer: consumer.to_string(),
            })?;

    for segment in &edge.access {
        current = current
            .get(segment)
            .ok_or_else(|| ExecutionError::MissingProducerOutput {
                producer: format!("{}.{segment}", edge.producer),
                consumer: consumer.to_string(),
            })?;
    }

    Ok(current.clone())
}
