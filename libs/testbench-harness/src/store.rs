/// Test Case Store - Entities, Visibility, Lifecycle
///
/// Holds every test case of the current problem plus the visible subset and
/// the active selection.
///
/// **Invariants:**
/// - Database cases are never removed
/// - The visible set never becomes empty through `remove`
/// - Cases are kept in ascending id order

use testbench_common::types::{is_hidden_id, Origin, TestCase, TestStatus};
use tracing::debug;

use crate::error::{HarnessError, Result};

/// Field edits accepted by `TestCaseStore::update`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestCaseField {
    Input(String),
    ExpectedOutput(String),
    ActualOutput(String),
    Status(TestStatus),
}

#[derive(Debug, Clone, Default)]
pub struct TestCaseStore {
    cases: Vec<TestCase>,
    visible: Vec<u32>,
    active: Option<u32>,
}

impl TestCaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with the problem's stored cases (ids 1..=N)
    pub fn load_from_problem(&mut self, inputs: &[String], outputs: &[String]) -> Result<()> {
        if inputs.len() != outputs.len() {
            return Err(HarnessError::Validation(format!(
                "problem has {} inputs but {} expected outputs",
                inputs.len(),
                outputs.len()
            )));
        }

        self.cases = inputs
            .iter()
            .zip(outputs)
            .enumerate()
            .map(|(idx, (input, output))| TestCase::new(idx as u32 + 1, input.as_str(), output.as_str(), Origin::Database))
            .collect();
        self.visible = self
            .cases
            .iter()
            .filter(|case| !case.is_hidden())
            .map(|case| case.id)
            .collect();
        self.active = self.cases.first().map(|case| case.id);

        debug!(total = self.cases.len(), visible = self.visible.len(), "Loaded problem test cases");
        Ok(())
    }

    /// Add a user case with the next unused id; it becomes visible and active
    pub fn add(&mut self, input: impl Into<String>, expected_output: impl Into<String>) -> u32 {
        let id = self.next_id();
        self.cases.push(TestCase::new(id, input, expected_output, Origin::UserAdded));
        self.visible.push(id);
        self.active = Some(id);
        id
    }

    pub fn remove(&mut self, id: u32) -> Result<TestCase> {
        let position = self.position(id)?;

        if self.cases[position].origin == Origin::Database {
            return Err(HarnessError::AccessDenied(format!(
                "test case {} comes from the problem and cannot be removed",
                id
            )));
        }
        if self.is_visible(id) && self.visible.len() <= 1 {
            return Err(HarnessError::AccessDenied(
                "at least one test case must remain visible".to_string(),
            ));
        }

        let removed = self.cases.remove(position);
        self.visible.retain(|visible_id| *visible_id != id);
        if self.active == Some(id) {
            self.active = self.visible.first().copied();
        }

        debug!(test_id = id, "Removed test case");
        Ok(removed)
    }

    pub fn update(&mut self, id: u32, field: TestCaseField) -> Result<()> {
        let position = self.position(id)?;
        let case = &mut self.cases[position];
        match field {
            TestCaseField::Input(input) => case.input = input,
            TestCaseField::ExpectedOutput(expected) => case.expected_output = expected,
            TestCaseField::ActualOutput(actual) => case.actual_output = actual,
            TestCaseField::Status(status) => case.status = status,
        }
        Ok(())
    }

    pub fn select(&mut self, id: u32) -> Result<()> {
        self.position(id)?;
        self.active = Some(id);
        Ok(())
    }

    pub fn get(&self, id: u32) -> Option<&TestCase> {
        self.cases.iter().find(|case| case.id == id)
    }

    /// All cases, ascending by id
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn visible_cases(&self) -> impl Iterator<Item = &TestCase> {
        self.cases.iter().filter(move |case| self.is_visible(case.id))
    }

    pub fn hidden_cases(&self) -> impl Iterator<Item = &TestCase> {
        self.cases.iter().filter(|case| is_hidden_id(case.id))
    }

    pub fn is_visible(&self, id: u32) -> bool {
        self.visible.contains(&id)
    }

    pub fn active(&self) -> Option<u32> {
        self.active
    }

    /// Ids a batch run executes: both input and expected output present
    pub fn runnable_ids(&self) -> Vec<u32> {
        self.cases
            .iter()
            .filter(|case| case.is_runnable())
            .map(|case| case.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    fn next_id(&self) -> u32 {
        self.cases.iter().map(|case| case.id).max().unwrap_or(0) + 1
    }

    fn position(&self, id: u32) -> Result<usize> {
        self.cases
            .iter()
            .position(|case| case.id == id)
            .ok_or_else(|| HarnessError::Validation(format!("no test case with id {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn make_store(count: usize) -> TestCaseStore {
        let inputs: Vec<String> = (1..=count).map(|i| format!("{} {}", i, i)).collect();
        let outputs: Vec<String> = (1..=count).map(|i| (i * 2).to_string()).collect();
        let mut store = TestCaseStore::new();
        store.load_from_problem(&inputs, &outputs).unwrap();
        store
    }

    #[test]
    fn test_load_from_problem() {
        let store = make_store(4);

        assert_eq!(store.len(), 4);
        let ids: Vec<u32> = store.cases().iter().map(|case| case.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(store.cases().iter().all(|case| case.origin == Origin::Database));
        assert!(store.cases().iter().all(|case| case.status == TestStatus::Idle));
        assert!(store.is_visible(1) && store.is_visible(2));
        assert!(!store.is_visible(3) && !store.is_visible(4));
        assert_eq!(store.hidden_cases().count(), 2);
        assert_eq!(store.active(), Some(1));
    }

    #[test]
    fn test_load_rejects_mismatched_lengths() {
        let mut store = make_store(2);
        let result = store.load_from_problem(&strings(&["1", "2"]), &strings(&["1"]));

        assert!(matches!(result, Err(HarnessError::Validation(_))));
        // previous contents untouched
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_add_uses_next_id_and_becomes_visible() {
        let mut store = make_store(4);
        let id = store.add("5 5", "10");

        assert_eq!(id, 5);
        let case = store.get(5).unwrap();
        assert_eq!(case.origin, Origin::UserAdded);
        assert_eq!(case.expected_output, "10");
        assert!(store.is_visible(5));
        assert_eq!(store.active(), Some(5));
    }

    #[test]
    fn test_add_to_empty_store() {
        let mut store = TestCaseStore::new();
        assert_eq!(store.add("", ""), 1);
        assert_eq!(store.add("", ""), 2);
    }

    #[test]
    fn test_remove_database_case_denied_and_store_unchanged() {
        let mut store = make_store(3);
        let before: Vec<TestCase> = store.cases().to_vec();

        for id in 1..=3 {
            let result = store.remove(id);
            assert!(matches!(result, Err(HarnessError::AccessDenied(_))));
        }
        assert_eq!(store.cases(), before.as_slice());
        assert_eq!(store.active(), Some(1));
    }

    #[test]
    fn test_remove_last_visible_denied() {
        let mut store = TestCaseStore::new();
        let id = store.add("1", "1");

        let result = store.remove(id);
        assert!(matches!(result, Err(HarnessError::AccessDenied(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_user_case_reselects_first_visible() {
        let mut store = make_store(2);
        let id = store.add("9", "18");
        assert_eq!(store.active(), Some(id));

        let removed = store.remove(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(store.get(id).is_none());
        assert!(!store.is_visible(id));
        assert_eq!(store.active(), Some(1));
    }

    #[test]
    fn test_remove_keeps_selection_when_not_active() {
        let mut store = make_store(2);
        let first = store.add("a", "b");
        let _second = store.add("c", "d");
        store.select(2).unwrap();

        store.remove(first).unwrap();
        assert_eq!(store.active(), Some(2));
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut store = make_store(2);
        assert!(matches!(store.remove(42), Err(HarnessError::Validation(_))));
    }

    #[test]
    fn test_update_fields() {
        let mut store = make_store(3);
        store.update(3, TestCaseField::Input("7 7".into())).unwrap();
        store.update(3, TestCaseField::ExpectedOutput("14".into())).unwrap();
        store.update(3, TestCaseField::ActualOutput("13".into())).unwrap();
        store.update(3, TestCaseField::Status(TestStatus::Failed)).unwrap();

        let case = store.get(3).unwrap();
        assert_eq!(case.input, "7 7");
        assert_eq!(case.expected_output, "14");
        assert_eq!(case.actual_output, "13");
        assert_eq!(case.status, TestStatus::Failed);
        assert!(matches!(
            store.update(99, TestCaseField::Input(String::new())),
            Err(HarnessError::Validation(_))
        ));
    }

    #[test]
    fn test_runnable_ids_skip_incomplete_cases() {
        let mut store = make_store(2);
        store.add("", "");
        store.add("1 2", "3");
        store.update(2, TestCaseField::ExpectedOutput("  ".into())).unwrap();

        assert_eq!(store.runnable_ids(), vec![1, 4]);
    }

    #[test]
    fn test_visible_cases_include_user_cases() {
        let mut store = make_store(4);
        store.add("x", "y");
        let visible: Vec<u32> = store.visible_cases().map(|case| case.id).collect();
        assert_eq!(visible, vec![1, 2, 5]);
    }
}
