// 📣 Notification Bus - Synchronous observer registry
//
// Observers are delivered in registration order on the caller's thread.
// A failing observer does not stop delivery to the ones after it; failures
// are collected into the returned NotifyReport.

use crate::error::ObserverError;
use std::sync::{Arc, Mutex};

/// Receives values published on a `NotificationBus`.
pub trait Observer<T>: Send + Sync {
    fn update(&self, value: &T) -> Result<(), ObserverError>;
}

/// Shared handle to an observer. Identity is the allocation, not the value.
pub type ObserverHandle<T> = Arc<dyn Observer<T>>;

fn same_observer<T>(a: &ObserverHandle<T>, b: &ObserverHandle<T>) -> bool {
    // Compare data pointers only; vtable pointers are not guaranteed unique.
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

// ============================================================================
// NOTIFY REPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotifyReport {
    /// Observers that handled the value
    pub delivered: usize,
    /// Observers that returned an error, in delivery order
    pub failures: Vec<ObserverError>,
}

impl NotifyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ============================================================================
// BUS
// ============================================================================

pub struct NotificationBus<T> {
    observers: Vec<ObserverHandle<T>>,
}

impl<T> NotificationBus<T> {
    pub fn new() -> Self {
        NotificationBus {
            observers: Vec::new(),
        }
    }

    /// Register an observer. Returns false if it was already registered.
    pub fn register(&mut self, observer: ObserverHandle<T>) -> bool {
        if self.is_registered(&observer) {
            return false;
        }
        self.observers.push(observer);
        true
    }

    /// Unregister an observer. Returns false if it was not registered.
    pub fn unregister(&mut self, observer: &ObserverHandle<T>) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| !same_observer(o, observer));
        self.observers.len() != before
    }

    pub fn is_registered(&self, observer: &ObserverHandle<T>) -> bool {
        self.observers.iter().any(|o| same_observer(o, observer))
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver `value` to every observer, once each, in registration order.
    pub fn notify(&self, value: &T) -> NotifyReport {
        let mut report = NotifyReport::default();
        for observer in &self.observers {
            match observer.update(value) {
                Ok(()) => report.delivered += 1,
                Err(e) => report.failures.push(e),
            }
        }
        report
    }
}

impl<T> Default for NotificationBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// STOCK OBSERVERS
// ============================================================================

/// Keeps the latest total-cost label, e.g. "Total cost: 35.00 TL".
pub struct CostDisplay {
    currency: String,
    label: Mutex<String>,
}

impl CostDisplay {
    pub fn new(currency: &str) -> Self {
        CostDisplay {
            currency: currency.to_string(),
            label: Mutex::new(format_cost(0.0, currency)),
        }
    }

    pub fn label(&self) -> String {
        match self.label.lock() {
            Ok(label) => label.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Observer<f64> for CostDisplay {
    fn update(&self, total_cost: &f64) -> Result<(), ObserverError> {
        let mut label = self
            .label
            .lock()
            .map_err(|_| ObserverError::new("cost_display", "label lock poisoned"))?;
        *label = format_cost(*total_cost, &self.currency);
        Ok(())
    }
}

fn format_cost(total: f64, currency: &str) -> String {
    format!("Total cost: {:.2} {}", total, currency)
}

/// Records every published total, oldest first.
#[derive(Default)]
pub struct CostHistory {
    values: Mutex<Vec<f64>>,
}

impl CostHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<f64> {
        match self.values.lock() {
            Ok(values) => values.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn latest(&self) -> Option<f64> {
        self.values().last().copied()
    }
}

impl Observer<f64> for CostHistory {
    fn update(&self, total_cost: &f64) -> Result<(), ObserverError> {
        self.values
            .lock()
            .map_err(|_| ObserverError::new("cost_history", "history lock poisoned"))?
            .push(*total_cost);
        Ok(())
    }
}

/// Adapts a closure into an observer.
pub struct FnObserver<F> {
    f: F,
}

impl<F> FnObserver<F> {
    pub fn new<T>(f: F) -> Self
    where
        F: Fn(&T) -> Result<(), ObserverError> + Send + Sync,
    {
        FnObserver { f }
    }
}

impl<T, F> Observer<T> for FnObserver<F>
where
    F: Fn(&T) -> Result<(), ObserverError> + Send + Sync,
{
    fn update(&self, value: &T) -> Result<(), ObserverError> {
        (self.f)(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let mut bus: NotificationBus<f64> = NotificationBus::new();
        let history: ObserverHandle<f64> = Arc::new(CostHistory::new());

        assert!(bus.register(history.clone()));
        assert!(!bus.register(history.clone()));
        assert_eq!(bus.len(), 1);

        let report = bus.notify(&12.5);
        assert_eq!(report.delivered, 1);
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let mut bus: NotificationBus<f64> = NotificationBus::new();
        let a: ObserverHandle<f64> = Arc::new(CostHistory::new());
        let b: ObserverHandle<f64> = Arc::new(CostHistory::new());

        bus.register(a.clone());
        assert!(!bus.unregister(&b));
        assert_eq!(bus.len(), 1);

        assert!(bus.unregister(&a));
        assert!(bus.is_empty());
        assert_eq!(bus.notify(&1.0), NotifyReport::default());
    }

    #[test]
    fn test_delivery_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut bus: NotificationBus<f64> = NotificationBus::new();

        for name in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.register(Arc::new(FnObserver::new(move |_: &f64| {
                order.lock().unwrap().push(name);
                Ok(())
            })));
        }

        bus.notify(&1.0);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_failing_observer_does_not_block_others() {
        let mut bus: NotificationBus<f64> = NotificationBus::new();
        let before = Arc::new(CostHistory::new());
        let after = Arc::new(CostHistory::new());

        bus.register(before.clone());
        bus.register(Arc::new(FnObserver::new(|_: &f64| {
            Err(ObserverError::new("flaky", "display detached"))
        })));
        bus.register(after.clone());

        let report = bus.notify(&40.0);
        assert_eq!(report.delivered, 2);
        assert!(!report.is_clean());
        assert_eq!(report.failures[0].observer, "flaky");

        assert_eq!(before.values(), vec![40.0]);
        assert_eq!(after.values(), vec![40.0]);
    }

    #[test]
    fn test_values_are_not_deduplicated() {
        let mut bus: NotificationBus<f64> = NotificationBus::new();
        let history = Arc::new(CostHistory::new());
        bus.register(history.clone());

        bus.notify(&5.0);
        bus.notify(&5.0);
        assert_eq!(history.values(), vec![5.0, 5.0]);
        assert_eq!(history.latest(), Some(5.0));
    }

    #[test]
    fn test_cost_display_label() {
        let display = CostDisplay::new("TL");
        assert_eq!(display.label(), "Total cost: 0.00 TL");

        display.update(&35.0).unwrap();
        assert_eq!(display.label(), "Total cost: 35.00 TL");
    }
}
