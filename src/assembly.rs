// 🔧 Assembly Merge Engine - Build a mouse part by part
//
// Parts are picked one at a time, each becoming a one-part component.
// Components merge in selection order, and every merge must keep the parts
// aligned with the required sequence:
//
//   merged.parts[i].name starts with required_sequence[i]
//
// Prefix matching is deliberate: "Body Premium" must fit the "Body" slot.

use crate::error::{AssemblyError, SessionError};
use crate::notification::{NotificationBus, ObserverHandle};
use crate::parts::{Part, PartCatalog};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// The default assembly order for a mouse.
pub fn default_required_sequence() -> Vec<String> {
    [
        "Body",
        "Sensor",
        "Circuit Board",
        "Right Button",
        "Left Button",
        "Scroll",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// ============================================================================
// COMPONENT
// ============================================================================

/// Stable handle for a component in the engine's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u64);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One or more parts joined in assembly order.
///
/// Only the engine creates components, so the part list is never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssemblyComponent {
    id: ComponentId,
    parts: Vec<Part>,
}

impl AssemblyComponent {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn cost(&self) -> f64 {
        self.parts.iter().map(|p| p.price).sum()
    }

    pub fn names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }

    /// "Body + Sensor + ..."
    pub fn label(&self) -> String {
        self.names().join(" + ")
    }
}

/// Check that `parts` fits the head of `required`.
pub fn validate_sequence(required: &[String], parts: &[Part]) -> Result<(), AssemblyError> {
    if parts.len() > required.len() {
        return Err(AssemblyError::SequenceOverflow {
            merged: parts.len(),
            allowed: required.len(),
        });
    }

    for (position, (part, expected)) in parts.iter().zip(required).enumerate() {
        if !part.matches_category(expected) {
            return Err(AssemblyError::SequenceMismatch {
                position,
                expected: expected.clone(),
                found: part.name.clone(),
            });
        }
    }

    Ok(())
}

// ============================================================================
// REPAIR PROCESS
// ============================================================================

/// Owns the active components of one repair session and publishes the
/// running total cost after every change.
pub struct RepairProcess {
    required_sequence: Vec<String>,
    /// Active components in activation order
    components: Vec<AssemblyComponent>,
    next_id: u64,
    total_cost: f64,
    bus: NotificationBus<f64>,
}

impl RepairProcess {
    pub fn new(required_sequence: Vec<String>) -> Self {
        RepairProcess {
            required_sequence,
            components: Vec::new(),
            next_id: 1,
            total_cost: 0.0,
            bus: NotificationBus::new(),
        }
    }

    pub fn required_sequence(&self) -> &[String] {
        &self.required_sequence
    }

    pub fn register(&mut self, observer: ObserverHandle<f64>) -> bool {
        self.bus.register(observer)
    }

    pub fn unregister(&mut self, observer: &ObserverHandle<f64>) -> bool {
        self.bus.unregister(observer)
    }

    /// Wrap `part` in a new component and activate it.
    pub fn add_part(&mut self, part: Part) -> ComponentId {
        debug!(part = %part.name, price = part.price, "Adding part");
        let id = self.activate(vec![part]);
        self.update_total_cost();
        id
    }

    /// Merge `a` then `b` into one component.
    ///
    /// On error nothing changes: both inputs stay active and no
    /// notification is sent.
    pub fn merge(
        &mut self,
        a: ComponentId,
        b: ComponentId,
    ) -> Result<AssemblyComponent, AssemblyError> {
        let first = self.index_of(a).ok_or(AssemblyError::NotFound(a))?;
        let second = self.index_of(b).ok_or(AssemblyError::NotFound(b))?;
        if first == second {
            return Err(AssemblyError::SameComponent(a));
        }

        let merged_parts: Vec<Part> = self.components[first]
            .parts
            .iter()
            .chain(self.components[second].parts.iter())
            .cloned()
            .collect();
        validate_sequence(&self.required_sequence, &merged_parts)?;

        self.components.retain(|c| c.id != a && c.id != b);
        let id = self.activate(merged_parts);
        let merged = self.components[self.components.len() - 1].clone();

        info!(
            component = %id,
            parts = %merged.label(),
            cost = merged.cost(),
            "Components merged"
        );
        if self.is_complete(&merged) {
            info!(component = %id, cost = merged.cost(), "Mouse assembly complete");
        }

        self.update_total_cost();
        Ok(merged)
    }

    /// Deactivate a component and return it.
    pub fn remove(&mut self, id: ComponentId) -> Result<AssemblyComponent, AssemblyError> {
        let index = self.index_of(id).ok_or(AssemblyError::NotFound(id))?;
        let removed = self.components.remove(index);
        debug!(component = %id, parts = %removed.label(), "Component removed");
        self.update_total_cost();
        Ok(removed)
    }

    /// Merges already enforce per-position categories, so length is enough.
    pub fn is_complete(&self, component: &AssemblyComponent) -> bool {
        component.len() == self.required_sequence.len()
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn components(&self) -> &[AssemblyComponent] {
        &self.components
    }

    pub fn component(&self, id: ComponentId) -> Option<&AssemblyComponent> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn is_active(&self, id: ComponentId) -> bool {
        self.index_of(id).is_some()
    }

    /// First active component that holds the whole sequence.
    pub fn completed_assembly(&self) -> Option<&AssemblyComponent> {
        self.components.iter().find(|c| self.is_complete(c))
    }

    fn index_of(&self, id: ComponentId) -> Option<usize> {
        self.components.iter().position(|c| c.id == id)
    }

    fn activate(&mut self, parts: Vec<Part>) -> ComponentId {
        let id = ComponentId(self.next_id);
        self.next_id += 1;
        self.components.push(AssemblyComponent { id, parts });
        id
    }

    fn update_total_cost(&mut self) {
        self.total_cost = self.components.iter().map(|c| c.cost()).sum();

        let report = self.bus.notify(&self.total_cost);
        for failure in &report.failures {
            warn!(observer = %failure.observer, error = %failure.message, "Cost observer failed");
        }
    }
}

// ============================================================================
// REPAIR SESSION
// ============================================================================

/// A repair process that picks parts from a catalog by id.
pub struct RepairSession<'a> {
    catalog: &'a PartCatalog,
    process: RepairProcess,
}

impl<'a> RepairSession<'a> {
    pub fn new(catalog: &'a PartCatalog, required_sequence: Vec<String>) -> Self {
        RepairSession {
            catalog,
            process: RepairProcess::new(required_sequence),
        }
    }

    /// Buy part `part_id` from the catalog and add it to the bench.
    pub fn select_part(&mut self, part_id: i64) -> Result<ComponentId, SessionError> {
        let part = self
            .catalog
            .find(part_id)?
            .ok_or(AssemblyError::UnknownPart(part_id))?;
        Ok(self.process.add_part(part))
    }

    pub fn catalog(&self) -> &PartCatalog {
        self.catalog
    }

    pub fn process(&self) -> &RepairProcess {
        &self.process
    }

    pub fn process_mut(&mut self) -> &mut RepairProcess {
        &mut self.process
    }

    pub fn into_process(self) -> RepairProcess {
        self.process
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ObserverError;
    use crate::notification::{CostHistory, FnObserver};
    use std::sync::Arc;

    fn create_test_part(id: i64, name: &str, price: f64) -> Part {
        Part::new(id, name, 1000, price, "test.png")
    }

    fn two_step_process() -> RepairProcess {
        RepairProcess::new(vec!["Body".to_string(), "Sensor".to_string()])
    }

    #[test]
    fn test_merge_in_order_completes() {
        let mut process = two_step_process();
        let body = process.add_part(create_test_part(1, "Body", 20.0));
        let sensor = process.add_part(create_test_part(2, "Sensor", 15.0));

        let merged = process.merge(body, sensor).unwrap();

        assert_eq!(merged.cost(), 35.0);
        assert_eq!(merged.names(), vec!["Body", "Sensor"]);
        assert!(process.is_complete(&merged));
        assert!(!process.is_active(body));
        assert!(!process.is_active(sensor));
        assert!(process.is_active(merged.id()));
        assert_eq!(process.total_cost(), 35.0);
        assert_eq!(process.completed_assembly().map(|c| c.id()), Some(merged.id()));
    }

    #[test]
    fn test_merge_wrong_order_is_rejected() {
        let mut process = two_step_process();
        let sensor = process.add_part(create_test_part(2, "Sensor", 15.0));
        let body = process.add_part(create_test_part(1, "Body", 20.0));

        let err = process.merge(sensor, body).unwrap_err();

        assert_eq!(
            err,
            AssemblyError::SequenceMismatch {
                position: 0,
                expected: "Body".to_string(),
                found: "Sensor".to_string(),
            }
        );
        assert!(process.is_active(sensor));
        assert!(process.is_active(body));
        assert_eq!(process.components().len(), 2);
        assert_eq!(process.total_cost(), 35.0);
    }

    #[test]
    fn test_merge_mismatch_after_first_position() {
        let mut process = RepairProcess::new(default_required_sequence());
        let body = process.add_part(create_test_part(1, "Body", 20.0));
        let scroll = process.add_part(create_test_part(6, "Scroll", 7.0));

        let err = process.merge(body, scroll).unwrap_err();

        assert_eq!(
            err,
            AssemblyError::SequenceMismatch {
                position: 1,
                expected: "Sensor".to_string(),
                found: "Scroll".to_string(),
            }
        );
        assert!(process.is_active(body));
        assert!(process.is_active(scroll));
        assert_eq!(process.components().len(), 2);
        assert_eq!(process.total_cost(), 27.0);
    }

    #[test]
    fn test_merge_overflow_is_rejected() {
        let mut process = two_step_process();
        let body = process.add_part(create_test_part(1, "Body", 20.0));
        let sensor = process.add_part(create_test_part(2, "Sensor", 15.0));
        let pair = process.merge(body, sensor).unwrap();
        let extra = process.add_part(create_test_part(3, "Body", 20.0));

        let err = process.merge(pair.id(), extra).unwrap_err();

        assert_eq!(err, AssemblyError::SequenceOverflow { merged: 3, allowed: 2 });
        assert!(process.is_active(pair.id()));
        assert!(process.is_active(extra));
        assert_eq!(process.total_cost(), 55.0);
    }

    #[test]
    fn test_merge_keeps_selection_order() {
        let mut process = RepairProcess::new(default_required_sequence());
        let body = process.add_part(create_test_part(1, "Body", 20.0));
        let sensor = process.add_part(create_test_part(2, "Sensor", 15.0));
        let board = process.add_part(create_test_part(3, "Circuit Board", 25.0));

        let head = process.merge(body, sensor).unwrap();
        let longer = process.merge(head.id(), board).unwrap();

        let mut expected = head.parts().to_vec();
        expected.push(create_test_part(3, "Circuit Board", 25.0));
        assert_eq!(longer.parts(), expected.as_slice());
        assert!(!process.is_complete(&longer));
    }

    #[test]
    fn test_premium_variant_matches_base_category() {
        let mut process = two_step_process();
        let body = process.add_part(create_test_part(7, "Body Premium", 35.0));
        let sensor = process.add_part(create_test_part(8, "Sensor Pro", 30.0));

        let merged = process.merge(body, sensor).unwrap();
        assert!(process.is_complete(&merged));
    }

    #[test]
    fn test_prefix_match_accepts_unrelated_names() {
        // Any name that happens to start with the label passes the check.
        let required = vec!["Body".to_string()];
        let parts = vec![create_test_part(1, "Bodywork Polish", 3.0)];
        assert!(validate_sequence(&required, &parts).is_ok());

        let parts = vec![create_test_part(1, "Premium Body", 3.0)];
        assert!(validate_sequence(&required, &parts).is_err());
    }

    #[test]
    fn test_merge_unknown_or_same_component() {
        let mut process = two_step_process();
        let body = process.add_part(create_test_part(1, "Body", 20.0));

        assert_eq!(
            process.merge(body, ComponentId(99)).unwrap_err(),
            AssemblyError::NotFound(ComponentId(99))
        );
        assert_eq!(
            process.merge(body, body).unwrap_err(),
            AssemblyError::SameComponent(body)
        );
        assert!(process.is_active(body));

        process.remove(body).unwrap();
        assert_eq!(
            process.merge(body, body).unwrap_err(),
            AssemblyError::NotFound(body)
        );
    }

    #[test]
    fn test_same_part_twice_gives_distinct_components() {
        let mut process = two_step_process();
        let part = create_test_part(1, "Body", 20.0);
        let a = process.add_part(part.clone());
        let b = process.add_part(part);

        assert_ne!(a, b);
        assert_eq!(process.components().len(), 2);
        assert_eq!(process.total_cost(), 40.0);
    }

    #[test]
    fn test_remove() {
        let mut process = two_step_process();
        let body = process.add_part(create_test_part(1, "Body", 20.0));
        let sensor = process.add_part(create_test_part(2, "Sensor", 15.0));

        let removed = process.remove(body).unwrap();
        assert_eq!(removed.names(), vec!["Body"]);
        assert_eq!(process.total_cost(), 15.0);
        assert!(process.is_active(sensor));

        assert_eq!(process.remove(body).unwrap_err(), AssemblyError::NotFound(body));
    }

    #[test]
    fn test_cost_notifications() {
        let mut process = two_step_process();
        let history = Arc::new(CostHistory::new());
        process.register(history.clone());

        let body = process.add_part(create_test_part(1, "Body", 20.0));
        let sensor = process.add_part(create_test_part(2, "Sensor", 15.0));
        let _ = process.merge(sensor, body);
        let merged = process.merge(body, sensor).unwrap();
        process.remove(merged.id()).unwrap();

        // The failed merge publishes nothing
        assert_eq!(history.values(), vec![20.0, 35.0, 35.0, 0.0]);
    }

    #[test]
    fn test_observer_failure_does_not_undo_merge() {
        let mut process = two_step_process();
        process.register(Arc::new(FnObserver::new(|_: &f64| {
            Err(ObserverError::new("broken", "gone"))
        })));

        let body = process.add_part(create_test_part(1, "Body", 20.0));
        let sensor = process.add_part(create_test_part(2, "Sensor", 15.0));
        let merged = process.merge(body, sensor).unwrap();

        assert!(process.is_active(merged.id()));
        assert_eq!(process.total_cost(), 35.0);
    }

    #[test]
    fn test_full_mouse_from_catalog() {
        let catalog = PartCatalog::with_defaults().unwrap();
        let mut session = RepairSession::new(&catalog, default_required_sequence());

        let mut ids = Vec::new();
        for part_id in [7, 2, 3, 4, 5, 6] {
            ids.push(session.select_part(part_id).unwrap());
        }

        let process = session.process_mut();
        let mut acc = ids[0];
        for next in &ids[1..] {
            acc = process.merge(acc, *next).unwrap().id();
        }

        let done = process.completed_assembly().unwrap();
        assert_eq!(done.id(), acc);
        assert_eq!(done.len(), 6);
        assert!((process.total_cost() - 92.0).abs() < 1e-9);
    }

    #[test]
    fn test_select_unknown_part() {
        let catalog = PartCatalog::with_defaults().unwrap();
        let mut session = RepairSession::new(&catalog, default_required_sequence());

        let err = session.select_part(404).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Assembly(AssemblyError::UnknownPart(404))
        ));
        assert!(session.process().components().is_empty());
    }
}
