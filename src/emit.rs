use std::io::{BufWriter, Write};

use crate::collapse::CanonicalGroup;
use crate::record::{Record, RecordSet};
use crate::rescue::CandidateWeight;
use crate::signature::CandidateSignatures;

/// One output row: a record and its coefficient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RescuedRow {
    pub record: usize,
    pub coefficient: f64,
}

impl RescuedRow {
    /// Coefficient scaled by the record's original score
    pub fn weight(&self, set: &RecordSet) -> f64 {
        self.coefficient * set.records[self.record].score
    }
}

impl From<CandidateWeight> for RescuedRow {
    fn from(w: CandidateWeight) -> Self {
        RescuedRow {
            record: w.record,
            coefficient: w.coefficient,
        }
    }
}

/// Expand a representative's weights onto every member of its group
///
/// Members share the representative's sorted signature, so the k-th weight
/// applies to every row behind each member's k-th signature tuple.
pub fn expand_group(
    group: &CanonicalGroup,
    weights: &[CandidateWeight],
    signatures: &CandidateSignatures,
) -> Vec<RescuedRow> {
    let mut rows = Vec::with_capacity(group.size() * weights.len());
    let Some(rep) = signatures.get(group.representative) else {
        return rows;
    };

    for &member in &group.members {
        let Some(signature) = signatures.get(member) else {
            continue;
        };
        for weight in weights {
            let Some(pos) = rep.records.iter().position(|&r| r == weight.record) else {
                continue;
            };
            for &record in &signature.rows[pos] {
                rows.push(RescuedRow {
                    record,
                    coefficient: weight.coefficient,
                });
            }
        }
    }

    rows
}

/// Keep rows whose record lies on `chromosome`
pub fn retain_chromosome(rows: &mut Vec<RescuedRow>, set: &RecordSet, chromosome: &str) {
    rows.retain(|row| set.records[row.record].chromosome == chromosome);
}

/// Writes rescued rows as the original line plus coefficient and weight
pub struct RowWriter<W: Write> {
    writer: BufWriter<W>,
    rows: usize,
}

impl<W: Write> RowWriter<W> {
    pub fn new(inner: W) -> Self {
        RowWriter {
            writer: BufWriter::new(inner),
            rows: 0,
        }
    }

    pub fn write_header(&mut self, header: &str) -> std::io::Result<()> {
        writeln!(self.writer, "{header}")
    }

    pub fn write_row(&mut self, record: &Record, coefficient: f64) -> std::io::Result<()> {
        writeln!(
            self.writer,
            "{}\t{}\t{}",
            record,
            format_value(coefficient),
            format_value(coefficient * record.score)
        )?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_rows(&mut self, set: &RecordSet, rows: &[RescuedRow]) -> std::io::Result<()> {
        for row in rows {
            self.write_row(&set.records[row.record], row.coefficient)?;
        }
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn finish(mut self) -> std::io::Result<usize> {
        self.writer.flush()?;
        Ok(self.rows)
    }
}

fn format_value(value: f64) -> String {
    format!("{value:.6}")
}
