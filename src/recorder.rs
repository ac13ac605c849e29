//! Result recording for a single test run.
//!
//! [`ResultRecorder`] keeps every command and its output in execution order,
//! keyed by `"{switch} {timestamp} {command}"`, and finally the
//! `result.detail` / `result.status` summary. [`TestOutcome`] is the running
//! pass/fail flag plus the failure summary text the checks append to.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of the final pass/fail entry.
pub const STATUS_KEY: &str = "result.status";
/// Key of the accumulated failure summary entry.
pub const DETAIL_KEY: &str = "result.detail";

/// Overall status of a test run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    Passed,
    Failed,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Passed => "Passed",
            TestStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running pass/fail state of a test run.
///
/// Once failed, the outcome never goes back to passed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestOutcome {
    failed: bool,
    detail: String,
}

impl TestOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the run failed and append `reason` to the failure summary.
    pub fn fail(&mut self, reason: impl AsRef<str>) {
        self.failed = true;
        self.detail.push_str(reason.as_ref());
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn status(&self) -> TestStatus {
        if self.failed {
            TestStatus::Failed
        } else {
            TestStatus::Passed
        }
    }

    /// Failure summary accumulated so far.
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// Ordered log of command outputs for one run.
///
/// Serializes as a flat JSON object; commands without output map to `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRecorder {
    entries: IndexMap<String, Option<String>>,
}

impl ResultRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the key a command is recorded under.
    pub fn entry_key(switch_name: &str, exec_time: Option<&str>, cli: &str) -> String {
        format!("{} {} {}", switch_name, display_value(exec_time), cli)
    }

    /// Record the output of `cli`, run on `switch_name` at `exec_time`.
    ///
    /// Returns the key used. A key that is already present keeps its
    /// position and takes the new value.
    pub fn record(
        &mut self,
        switch_name: &str,
        exec_time: Option<&str>,
        cli: &str,
        output: Option<String>,
    ) -> String {
        let key = Self::entry_key(switch_name, exec_time, cli);
        self.entries.insert(key.clone(), output);
        key
    }

    /// Append the `result.detail` and `result.status` summary entries.
    pub fn finish(&mut self, outcome: &TestOutcome) {
        self.entries
            .insert(DETAIL_KEY.to_string(), Some(outcome.detail().to_string()));
        self.entries.insert(
            STATUS_KEY.to_string(),
            Some(outcome.status().as_str().to_string()),
        );
    }

    pub fn get(&self, key: &str) -> Option<&Option<String>> {
        self.entries.get(key)
    }

    /// Recorded status, if [`finish`](Self::finish) has run.
    pub fn status(&self) -> Option<TestStatus> {
        match self.entries.get(STATUS_KEY)?.as_deref()? {
            "Passed" => Some(TestStatus::Passed),
            "Failed" => Some(TestStatus::Failed),
            _ => None,
        }
    }

    /// Recorded failure summary, if [`finish`](Self::finish) has run.
    pub fn detail(&self) -> Option<&str> {
        self.entries.get(DETAIL_KEY)?.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

/// Text form of a possibly missing value, `None` when absent.
pub fn display_value(value: Option<&str>) -> &str {
    value.unwrap_or("None")
}
