//! Page orchestration: wires a calculator's fields to its formula and owns
//! the result panel.
//!
//! ```text
//! set_input ──► (live page) ──┐
//!                             ▼
//! calculate ──► Calculating ──► run() ──► Idle
//!                                 │
//!                 ok: replace result, notify observers
//!                 err: push notice, result untouched
//! ```
//!
//! Telemetry never runs inside a formula. Observers see a
//! [`CalculationEvent`] only after a calculation has succeeded.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::backend::SiteBackend;
use crate::calculator::{Calculator, CalculatorMeta, run};
use crate::error::{CalcError, CalcResult};
use crate::models::{CalculationResult, InputField, NewAnalyticsEvent, Notice, ResultField};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultPolicy {
    /// Keep showing the last good result until a new one replaces it.
    #[default]
    Sticky,
    /// Clear the result as soon as any input changes.
    ClearOnChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Idle,
    Calculating,
}

/// Emitted after every successful calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationEvent {
    pub slug: String,
    pub inputs: BTreeMap<String, String>,
    pub primary: ResultField,
    pub at: DateTime<Utc>,
}

pub trait CalculationObserver: Send + Sync {
    fn on_calculated(
        &self,
        event: &CalculationEvent,
    );
}

/// Forwards events into a bounded channel. A full channel drops the event.
pub struct ChannelObserver {
    sender: mpsc::Sender<CalculationEvent>,
}

impl ChannelObserver {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<CalculationEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl CalculationObserver for ChannelObserver {
    fn on_calculated(
        &self,
        event: &CalculationEvent,
    ) {
        if let Err(e) = self.sender.try_send(event.clone()) {
            warn!(slug = %event.slug, error = %e, "Dropping calculation event");
        }
    }
}

/// Drains `events` into the backend's analytics log until every sender is
/// gone. Failed inserts are logged and skipped. Returns how many were stored.
pub async fn forward_analytics(
    backend: &dyn SiteBackend,
    mut events: mpsc::Receiver<CalculationEvent>,
) -> usize {
    let mut stored = 0;
    while let Some(event) = events.recv().await {
        let record = NewAnalyticsEvent {
            event_type: "calculation".to_string(),
            page: Some(format!("/calculators/{}", event.slug)),
            payload: Some(serde_json::json!({
                "inputs": event.inputs,
                "primary": event.primary,
                "at": event.at,
            })),
        };
        match backend.record_analytics_event(record).await {
            Ok(_) => stored += 1,
            Err(e) => error!(slug = %event.slug, error = %e, "Failed to record analytics event"),
        }
    }
    stored
}

/// One calculator page instance.
pub struct CalculatorPage<'a> {
    calculator: &'a dyn Calculator,
    fields: Vec<InputField>,
    inputs: BTreeMap<String, String>,
    result: Option<CalculationResult>,
    status: PageStatus,
    notices: Vec<Notice>,
    policy: ResultPolicy,
    observers: Vec<Box<dyn CalculationObserver + 'a>>,
}

impl<'a> CalculatorPage<'a> {
    pub fn new(calculator: &'a dyn Calculator) -> Self {
        let fields = calculator.fields();
        let inputs = default_inputs(&fields);
        Self {
            calculator,
            fields,
            inputs,
            result: None,
            status: PageStatus::Idle,
            notices: Vec::new(),
            policy: ResultPolicy::default(),
            observers: Vec::new(),
        }
    }

    pub fn with_policy(
        mut self,
        policy: ResultPolicy,
    ) -> Self {
        self.policy = policy;
        self
    }

    pub fn add_observer(
        &mut self,
        observer: Box<dyn CalculationObserver + 'a>,
    ) {
        self.observers.push(observer);
    }

    pub fn meta(&self) -> CalculatorMeta {
        self.calculator.meta()
    }

    pub fn fields(&self) -> &[InputField] {
        &self.fields
    }

    pub fn inputs(&self) -> &BTreeMap<String, String> {
        &self.inputs
    }

    pub fn input(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.inputs.get(key).map(String::as_str)
    }

    pub fn result(&self) -> Option<&CalculationResult> {
        self.result.as_ref()
    }

    pub fn status(&self) -> PageStatus {
        self.status
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Notices are transient; taking them clears the queue.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Updates one raw input. Live pages recompute immediately and stay
    /// silent on invalid input.
    pub fn set_input(
        &mut self,
        key: &str,
        raw: &str,
    ) {
        self.inputs.insert(key.to_string(), raw.to_string());
        if self.policy == ResultPolicy::ClearOnChange {
            self.result = None;
        }
        if self.calculator.meta().live {
            let _ = self.compute(false);
        }
    }

    /// Explicit "Calculate".
    ///
    /// # Errors
    ///
    /// The validation or domain error, after a notice has been queued. The
    /// previous result is left in place.
    pub fn calculate(&mut self) -> CalcResult<&CalculationResult> {
        self.status = PageStatus::Calculating;
        self.compute(true)
    }

    /// [`calculate`](Self::calculate) with a spinner pause between entering
    /// the calculating state and computing.
    pub async fn calculate_with_delay(
        &mut self,
        delay: Duration,
    ) -> CalcResult<&CalculationResult> {
        self.status = PageStatus::Calculating;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.compute(true)
    }

    /// Restores field defaults and clears the result and notices.
    pub fn reset(&mut self) {
        self.inputs = default_inputs(&self.fields);
        self.result = None;
        self.notices.clear();
        self.status = PageStatus::Idle;
    }

    /// Runs the calculator and leaves the page idle. On success the new
    /// result is stored and returned.
    fn compute(
        &mut self,
        notify_errors: bool,
    ) -> CalcResult<&CalculationResult> {
        let slug = self.calculator.meta().slug;
        debug!(slug, "Calculating");

        let outcome = run(self.calculator, &self.inputs);
        self.status = PageStatus::Idle;
        match outcome {
            Ok(result) => {
                let event = CalculationEvent {
                    slug: slug.to_string(),
                    inputs: self.inputs.clone(),
                    primary: result.primary.clone(),
                    at: Utc::now(),
                };
                for observer in &self.observers {
                    observer.on_calculated(&event);
                }
                Ok(&*self.result.insert(result))
            }
            Err(err) => {
                warn!(slug, code = err.error_code(), error = %err, "Calculation rejected");
                if notify_errors {
                    self.notices.push(error_notice(&err));
                }
                Err(err)
            }
        }
    }
}

fn default_inputs(fields: &[InputField]) -> BTreeMap<String, String> {
    fields
        .iter()
        .map(|f| (f.key.clone(), f.default.clone().unwrap_or_default()))
        .collect()
}

fn error_notice(err: &CalcError) -> Notice {
    if err.is_validation() {
        Notice::error(format!("Please enter valid values: {err}"))
    } else {
        Notice::error(format!("Cannot calculate: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::backend::testing::RecordingBackend;
    use crate::calculations::finance::simple::DiscountCalculator;
    use crate::calculations::math::quadratic::QuadraticCalculator;
    use crate::models::ResultValue;

    #[derive(Default)]
    struct Collecting(Arc<Mutex<Vec<CalculationEvent>>>);

    impl CalculationObserver for Collecting {
        fn on_calculated(
            &self,
            event: &CalculationEvent,
        ) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn solved_quadratic(page: &mut CalculatorPage<'_>) {
        page.set_input("a", "1");
        page.set_input("b", "-5");
        page.set_input("c", "6");
        page.calculate().unwrap();
    }

    #[test]
    fn new_page_is_prefilled_with_defaults() {
        let page = CalculatorPage::new(&crate::calculations::finance::simple::TipCalculator);

        assert_eq!(page.input("tip"), Some("15"));
        assert_eq!(page.input("bill"), Some(""));
        assert_eq!(page.status(), PageStatus::Idle);
    }

    #[test]
    fn failed_calculation_keeps_previous_result() {
        let mut page = CalculatorPage::new(&QuadraticCalculator);
        solved_quadratic(&mut page);
        let before = page.result().cloned();

        page.set_input("a", "abc");
        let err = page.calculate().unwrap_err();

        assert_eq!(err.error_code(), "NOT_A_NUMBER");
        assert_eq!(page.result().cloned(), before);
        let notices = page.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].message.starts_with("Please enter valid values"));
        assert!(page.notices().is_empty());
    }

    #[test]
    fn domain_error_surfaces_as_notice() {
        let mut page = CalculatorPage::new(&QuadraticCalculator);
        page.set_input("a", "0");
        page.set_input("b", "1");
        page.set_input("c", "1");

        assert!(page.calculate().is_err());
        assert!(page.notices()[0].message.starts_with("Cannot calculate"));
        assert!(page.result().is_none());
    }

    #[test]
    fn clear_on_change_drops_result() {
        let mut page = CalculatorPage::new(&QuadraticCalculator).with_policy(ResultPolicy::ClearOnChange);
        solved_quadratic(&mut page);

        page.set_input("c", "7");

        assert!(page.result().is_none());
    }

    #[test]
    fn calculate_returns_the_fresh_result_under_clear_on_change() {
        let mut page = CalculatorPage::new(&QuadraticCalculator).with_policy(ResultPolicy::ClearOnChange);
        solved_quadratic(&mut page);
        let before = page.result().cloned();
        page.set_input("c", "4");

        let result = page.calculate().unwrap().clone();

        assert_eq!(page.status(), PageStatus::Idle);
        assert_eq!(page.result(), Some(&result));
        assert_ne!(Some(result), before);
    }

    #[test]
    fn live_page_recalculates_on_input() {
        let mut page = CalculatorPage::new(&DiscountCalculator);

        page.set_input("price", "80");
        page.set_input("discount", "25");

        assert_eq!(
            page.result().map(|r| r.primary.value.clone()),
            Some(ResultValue::Currency(60.0))
        );
    }

    #[test]
    fn live_page_is_silent_on_invalid_input() {
        let mut page = CalculatorPage::new(&DiscountCalculator);
        page.set_input("price", "80");
        page.set_input("discount", "25");

        page.set_input("discount", "150");

        assert!(page.notices().is_empty());
        assert_eq!(
            page.result().map(|r| r.primary.value.clone()),
            Some(ResultValue::Currency(60.0))
        );
    }

    #[test]
    fn observers_hear_only_successes() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut page = CalculatorPage::new(&QuadraticCalculator);
        page.add_observer(Box::new(Collecting(events.clone())));

        solved_quadratic(&mut page);
        page.set_input("a", "0");
        let _ = page.calculate();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].slug, "quadratic");
        assert_eq!(events[0].inputs.get("b").map(String::as_str), Some("-5"));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut page = CalculatorPage::new(&QuadraticCalculator);
        solved_quadratic(&mut page);

        page.reset();

        assert!(page.result().is_none());
        assert_eq!(page.input("a"), Some(""));
    }

    #[tokio::test]
    async fn delayed_calculation_returns_to_idle() {
        let mut page = CalculatorPage::new(&QuadraticCalculator);
        page.set_input("a", "1");
        page.set_input("b", "2");
        page.set_input("c", "1");

        let result = page.calculate_with_delay(Duration::from_millis(5)).await.unwrap();

        assert_eq!(result.primary.value, ResultValue::Text("x = -1".to_string()));
        assert_eq!(page.status(), PageStatus::Idle);
    }

    #[tokio::test]
    async fn channel_observer_feeds_analytics() {
        let backend = RecordingBackend::default();
        let (observer, receiver) = ChannelObserver::new(8);
        {
            let mut page = CalculatorPage::new(&QuadraticCalculator);
            page.add_observer(Box::new(observer));
            solved_quadratic(&mut page);
        }

        let stored = forward_analytics(&backend, receiver).await;

        assert_eq!(stored, 1);
        let recorded = backend.recorded.lock().unwrap();
        assert_eq!(recorded[0].page.as_deref(), Some("/calculators/quadratic"));
    }

    #[tokio::test]
    async fn failed_analytics_inserts_are_skipped() {
        let backend = RecordingBackend {
            fail_record: true,
            ..Default::default()
        };
        let (observer, receiver) = ChannelObserver::new(8);
        {
            let mut page = CalculatorPage::new(&QuadraticCalculator);
            page.add_observer(Box::new(observer));
            solved_quadratic(&mut page);
        }

        assert_eq!(forward_analytics(&backend, receiver).await, 0);
    }
}
