use crate::config::ReviewSettings;
use crate::domain::{FlatRow, ReviewStatus, ReviewedRow};
use crate::error::Result;
use crate::ports::{DecisionAppender, DecisionLog};
use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::path::PathBuf;

pub const APP_TITLE: &str = "Instagram Following Review";
const PROMPT: &str = "> ";
const USAGE_HINT: &str = "Please use Enter, 'r', or 'q'.";

/// Operator command after trimming and lower-casing the input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Confirm,
    Toggle,
    Keep,
    Delete,
    Quit,
    Unknown,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "" => Command::Confirm,
            "r" => Command::Toggle,
            "y" | "yes" | "j" | "ja" | "k" | "keep" => Command::Keep,
            "n" | "no" | "d" | "delete" | "del" => Command::Delete,
            "q" | "quit" | "exit" => Command::Quit,
            _ => Command::Unknown,
        }
    }
}

/// Terminal state of the per-entry confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Confirmed(ReviewStatus),
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFinish {
    Completed,
    Aborted,
    NothingToReview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewReport {
    /// Durable output path; always returned, also after an abort.
    pub output: PathBuf,
    pub appended: usize,
    pub finish: ReviewFinish,
}

/// Interactive keep/delete review over rows not yet present in the decision log.
pub struct ReviewLoop<'a> {
    log: &'a dyn DecisionLog,
    settings: ReviewSettings,
}

impl<'a> ReviewLoop<'a> {
    pub fn new(log: &'a dyn DecisionLog, settings: ReviewSettings) -> Self {
        Self { log, settings }
    }

    pub fn run<R, W>(&self, rows: &[FlatRow], input: &mut R, out: &mut W) -> Result<ReviewReport>
    where
        R: BufRead,
        W: Write,
    {
        let mut done_ids = self.log.load_done_ids()?;
        log::info!("Resuming with {} finalized ids", done_ids.len());

        let mut appender = self.log.open_appender()?;
        let open_rows = open_rows(rows, &done_ids);
        let output = self.log.location().to_path_buf();

        writeln!(out, "{APP_TITLE}\n")?;
        if open_rows.is_empty() {
            writeln!(out, "Nothing left to review.")?;
            return Ok(ReviewReport {
                output,
                appended: 0,
                finish: ReviewFinish::NothingToReview,
            });
        }

        let total = open_rows.len();
        let mut appended = 0;
        for (idx, row) in open_rows.into_iter().enumerate() {
            match self.confirm(row, idx + 1, total, input, out)? {
                Outcome::Confirmed(status) => {
                    write_decision(appender.as_mut(), row, status)?;
                    done_ids.insert(row.id);
                    appended += 1;
                }
                Outcome::Aborted => {
                    writeln!(out, "\nQuitting without losing progress.")?;
                    log::info!("Review aborted after {appended} decisions");
                    return Ok(ReviewReport {
                        output,
                        appended,
                        finish: ReviewFinish::Aborted,
                    });
                }
            }
        }

        log::info!("Review completed with {appended} decisions");
        Ok(ReviewReport {
            output,
            appended,
            finish: ReviewFinish::Completed,
        })
    }

    /// Runs the confirmation state machine for one entry.
    fn confirm<R, W>(
        &self,
        row: &FlatRow,
        pos: usize,
        total: usize,
        input: &mut R,
        out: &mut W,
    ) -> Result<Outcome>
    where
        R: BufRead,
        W: Write,
    {
        let mut status = ReviewStatus::Keep;
        let mut emphasize_next = false;

        loop {
            self.render(out, row, pos, total, status, emphasize_next)?;
            emphasize_next = false;

            write!(out, "{PROMPT}")?;
            out.flush()?;

            let mut line = Vec::new();
            if input.read_until(b'\n', &mut line)? == 0 {
                // Closed input behaves like quit
                return Ok(Outcome::Aborted);
            }

            match Command::parse(&String::from_utf8_lossy(&line)) {
                Command::Confirm => return Ok(Outcome::Confirmed(status)),
                Command::Toggle => {
                    status = status.toggled();
                    emphasize_next = true;
                }
                Command::Keep => return Ok(Outcome::Confirmed(ReviewStatus::Keep)),
                Command::Delete => return Ok(Outcome::Confirmed(ReviewStatus::Delete)),
                Command::Quit => return Ok(Outcome::Aborted),
                Command::Unknown => writeln!(out, "{USAGE_HINT}")?,
            }
        }
    }

    fn render<W: Write>(
        &self,
        out: &mut W,
        row: &FlatRow,
        pos: usize,
        total: usize,
        status: ReviewStatus,
        emphasize: bool,
    ) -> Result<()> {
        let shown_status = if emphasize && self.settings.emphasize {
            console::style(status.as_str())
                .bold()
                .force_styling(true)
                .to_string()
        } else {
            status.as_str().to_string()
        };

        writeln!(out, "{}", "=".repeat(50))?;
        writeln!(out, "Entry {pos}/{total}")?;
        writeln!(out, "ID:        {}", row.id)?;
        writeln!(out, "Username:  {}", row.username)?;
        writeln!(out, "URL:       {}", row.url)?;
        writeln!(out, "Date:      {}", row.timestamp)?;
        writeln!(out, "Status:    {shown_status}")?;
        writeln!(out, "\nEnter = done | r = change status | q = quit")?;
        Ok(())
    }
}

/// Rows whose id is not finalized yet, in table order. A repeated id is
/// offered only once.
fn open_rows<'r>(rows: &'r [FlatRow], done_ids: &HashSet<u64>) -> Vec<&'r FlatRow> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| !done_ids.contains(&row.id) && seen.insert(row.id))
        .collect()
}

fn write_decision(
    appender: &mut dyn DecisionAppender,
    row: &FlatRow,
    status: ReviewStatus,
) -> Result<()> {
    appender.append(&ReviewedRow {
        row: row.clone(),
        status,
    })
}
