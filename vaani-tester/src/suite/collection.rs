use std::path::Path;

use super::types::{normalize_expected, CaseFilter, TestCase, TransactionType};
use crate::error::SuiteError;

/// Owned, in-memory collection of test cases.
///
/// Ids are unique and positive. Appends always allocate `max(existing) + 1`
/// so ids stay unique even after cases have been removed or re-imported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestSuite {
    cases: Vec<TestCase>,
}

/// Fields accepted by a manual add
#[derive(Debug, Clone)]
pub struct NewCase {
    pub transaction_type: TransactionType,
    pub input: String,
    pub expected_intent: Option<String>,
    pub expected_output: Option<serde_json::Value>,
    pub category: Option<String>,
    pub context: Option<String>,
}

impl TestSuite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cases(cases: Vec<TestCase>) -> Self {
        Self { cases }
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.id == id)
    }

    pub fn next_id(&self) -> u32 {
        self.cases.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }

    /// Add a single case, returning its id
    pub fn add_case(&mut self, new_case: NewCase) -> Result<u32, SuiteError> {
        if new_case.input.trim().is_empty() {
            return Err(SuiteError::BlankInput);
        }

        let id = self.next_id();
        let expected_intent = new_case
            .expected_intent
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| new_case.transaction_type.as_str().to_string());

        self.cases.push(TestCase {
            id,
            transaction_type: new_case.transaction_type,
            input: new_case.input,
            expected_intent,
            expected_output: normalize_expected(new_case.expected_output),
            category: new_case
                .category
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "custom".to_string()),
            context: new_case.context.filter(|s| !s.trim().is_empty()),
        });
        Ok(id)
    }

    /// Append already-numbered cases (used by bulk import)
    pub(crate) fn extend(&mut self, cases: Vec<TestCase>) {
        self.cases.extend(cases);
    }

    pub fn remove(&mut self, id: u32) -> Result<TestCase, SuiteError> {
        let pos = self
            .cases
            .iter()
            .position(|c| c.id == id)
            .ok_or(SuiteError::UnknownCase(id))?;
        Ok(self.cases.remove(pos))
    }

    pub fn filter(&self, filter: &CaseFilter) -> Vec<&TestCase> {
        self.cases.iter().filter(|c| filter.matches(c)).collect()
    }

    /// Re-number every case to `index + 1`
    pub fn renumber(&mut self) {
        for (idx, case) in self.cases.iter_mut().enumerate() {
            case.id = idx as u32 + 1;
        }
    }

    /// Load a suite saved by [`TestSuite::save`]. A missing file is an empty suite.
    pub fn load(path: &Path) -> Result<Self, SuiteError> {
        if !path.exists() {
            log::debug!("Suite file {} not found, starting empty", path.display());
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        let cases: Vec<TestCase> = serde_json::from_str(&content)?;
        Ok(Self { cases })
    }

    pub fn save(&self, path: &Path) -> Result<(), SuiteError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.cases)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_case(input: &str) -> NewCase {
        NewCase {
            transaction_type: TransactionType::Expense,
            input: input.to_string(),
            expected_intent: None,
            expected_output: None,
            category: None,
            context: None,
        }
    }

    #[test]
    fn test_add_case_allocates_after_max_id() {
        let mut suite = TestSuite::from_cases(vec![
            TestCase::new(3, TransactionType::Expense, "a", "basic"),
            TestCase::new(10, TransactionType::Expense, "b", "basic"),
        ]);
        let id = suite.add_case(new_case("Spent 40 on tea")).unwrap();
        assert_eq!(id, 11);

        let added = suite.get(11).unwrap();
        assert_eq!(added.expected_intent, "expense");
        assert_eq!(added.category, "custom");
    }

    #[test]
    fn test_add_case_rejects_blank_input() {
        let mut suite = TestSuite::new();
        assert!(matches!(
            suite.add_case(new_case("   ")),
            Err(SuiteError::BlankInput)
        ));
        assert!(suite.is_empty());
    }

    #[test]
    fn test_ids_stay_unique_after_remove() {
        let mut suite = TestSuite::new();
        suite.add_case(new_case("one")).unwrap();
        suite.add_case(new_case("two")).unwrap();
        suite.remove(1).unwrap();
        let id = suite.add_case(new_case("three")).unwrap();
        assert_eq!(id, 3);
        assert!(matches!(suite.remove(1), Err(SuiteError::UnknownCase(1))));
    }

    #[test]
    fn test_renumber_makes_ids_contiguous() {
        let mut suite = TestSuite::from_cases(vec![
            TestCase::new(40, TransactionType::Expense, "a", "basic"),
            TestCase::new(7, TransactionType::Other, "b", "basic"),
        ]);
        suite.renumber();
        let ids: Vec<u32> = suite.cases().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("suite.json");

        let mut suite = TestSuite::new();
        let mut case = new_case("Received 200 from Amit");
        case.transaction_type = TransactionType::PaymentIn;
        case.expected_output = Some(json!({"amount": 200}));
        suite.add_case(case).unwrap();
        suite.save(&path).unwrap();

        let loaded = TestSuite::load(&path).unwrap();
        assert_eq!(loaded, suite);
        assert!(TestSuite::load(&dir.path().join("missing.json"))
            .unwrap()
            .is_empty());
    }
}
