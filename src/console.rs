//! Coloured progress output for the command-line front end.

use super::{
    model::{Mode, RunReport, TaskId, WorkerReport},
    observer::Observer,
};
use colored::Colorize;

/// Prints worker progress to stdout, worded per execution mode.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleObserver {
    mode: Mode,
}

impl ConsoleObserver {
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }
}

impl Observer for ConsoleObserver {
    fn task_started(&self, worker: &str, task: TaskId) {
        let line = match self.mode {
            Mode::Blocking => format!("Processing task: {task}"),
            Mode::Cooperative => format!("{worker} processing task: {task}"),
        };
        println!("{}", line.red().bold());
    }

    fn task_completed(&self, worker: &str, task: TaskId) {
        let line = match self.mode {
            Mode::Blocking => format!("Task {task} completed"),
            Mode::Cooperative => format!("{worker} completed task: {task}"),
        };
        println!("{}", line.cyan().bold());
    }

    fn worker_finished(&self, report: &WorkerReport) {
        if self.mode == Mode::Cooperative {
            println!(
                "{} completed in {:.2} seconds.",
                report.label,
                report.elapsed.as_secs_f64()
            );
        }
    }
}

pub fn summary_line(report: &RunReport) -> String {
    let kind = match report.mode {
        Mode::Blocking => "Blocking",
        Mode::Cooperative => "Non-blocking",
    };
    format!(
        "{kind} tasks completed in {:.3} seconds.",
        report.elapsed.as_secs_f64()
    )
}

pub fn print_summary(report: &RunReport) {
    println!("{}", summary_line(report).green().bold());
}
