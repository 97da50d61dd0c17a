//! Applies the judge to every row of a table.

use crate::client::Generate;
use crate::judge::{Judge, Sleep};
use crate::table::Table;
use crate::types::{
    AnswerRecord, Judgment, CANDIDATE_COLUMN, EXPECTED_COLUMN, FLAG_COLUMN, QUESTION_COLUMN,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    /// A required column is absent. Raised before any row is judged.
    #[error("missing required column '{column}'")]
    MissingColumn { column: &'static str },
}

/// How one row was judged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowReport {
    /// Zero-based data row index.
    pub row: usize,
    pub judgment: Judgment,
}

/// The input table with `correction_flag` filled in, plus per-row reports.
#[derive(Debug, Clone)]
pub struct ResultTable {
    table: Table,
    reports: Vec<RowReport>,
}

impl ResultTable {
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn reports(&self) -> &[RowReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn correct_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.judgment.verdict.correct)
            .count()
    }

    /// Rows whose verdict defaulted to incorrect because the endpoint failed.
    pub fn warnings(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.reports
            .iter()
            .filter_map(|r| r.judgment.diagnostic.as_deref().map(|d| (r.row, d)))
    }
}

struct Columns {
    question: usize,
    expected: usize,
    candidate: usize,
}

impl Columns {
    fn resolve(table: &Table) -> Result<Self, BatchError> {
        let find = |column: &'static str| {
            table
                .column(column)
                .ok_or(BatchError::MissingColumn { column })
        };
        Ok(Self {
            question: find(QUESTION_COLUMN)?,
            expected: find(EXPECTED_COLUMN)?,
            candidate: find(CANDIDATE_COLUMN)?,
        })
    }

    fn record<'a>(&self, row: &'a [String]) -> AnswerRecord<'a> {
        AnswerRecord {
            question: &row[self.question],
            expected_answer: &row[self.expected],
            candidate_answer: &row[self.candidate],
        }
    }
}

pub fn run<C: Generate, S: Sleep>(
    table: &Table,
    judge: &Judge<C, S>,
) -> Result<ResultTable, BatchError> {
    run_with(table, judge, |_, _| {})
}

/// Judge each row in order, calling `on_row` after each judgment.
///
/// Row failures only degrade that row's verdict; a missing column aborts
/// before the endpoint is called at all.
pub fn run_with<C, S, F>(
    table: &Table,
    judge: &Judge<C, S>,
    mut on_row: F,
) -> Result<ResultTable, BatchError>
where
    C: Generate,
    S: Sleep,
    F: FnMut(&AnswerRecord<'_>, &RowReport),
{
    let columns = Columns::resolve(table)?;

    let mut reports = Vec::with_capacity(table.len());
    let mut flags = Vec::with_capacity(table.len());
    for (row, cells) in table.rows().iter().enumerate() {
        let record = columns.record(cells);
        let report = RowReport {
            row,
            judgment: judge.judge(&record),
        };
        on_row(&record, &report);
        flags.push(report.judgment.verdict.as_flag().to_string());
        reports.push(report);
    }

    let mut table = table.clone();
    table.set_column(FLAG_COLUMN, flags);
    Ok(ResultTable { table, reports })
}
