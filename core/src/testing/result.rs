use std::time::Duration;

use super::{testcase::TestCase, verifier::Verification};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum JudgeCode {
    AC,
    WA,
    TLE,
}

/// Outcome of one source candidate against one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestVerdict {
    pub testcase: TestCase,
    pub judge: JudgeCode,
    pub execution_time: Duration,
    /// Absent for timed-out runs, whose output is never compared.
    pub verification: Option<Verification>,
}

impl TestVerdict {
    pub fn judged(testcase: TestCase, execution_time: Duration, verification: Verification) -> Self {
        let judge = if verification.is_pass() {
            JudgeCode::AC
        } else {
            JudgeCode::WA
        };
        Self {
            testcase,
            judge,
            execution_time,
            verification: Some(verification),
        }
    }

    pub fn timed_out(testcase: TestCase, execution_time: Duration) -> Self {
        Self {
            testcase,
            judge: JudgeCode::TLE,
            execution_time,
            verification: None,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.judge == JudgeCode::AC
    }
}
