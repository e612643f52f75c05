//! Console Progress Reporting
//!
//! Renders build events as a single updating line on stderr:
//! section position, chunk progress bar, running cost and ETA.

use console::{Term, style};
use std::path::Path;
use std::time::Instant;

use crate::ai::pricing::format_cost;
use crate::ai::provider::TokenUsage;
use crate::build::{BuildObserver, BuildPlan, SectionResult};
use crate::catalog::Section;

/// Snapshot of the run as seen by the console
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressState {
    pub section_index: usize,
    pub total_sections: usize,
    pub section_label: String,
    pub chunks_done: u32,
    pub total_chunks: u32,
    pub running_cost: f64,
    pub elapsed_secs: u64,
    pub eta_secs: Option<u64>,
}

/// [`BuildObserver`] printing to the terminal
pub struct ConsoleProgress {
    term: Term,
    state: ProgressState,
    start_time: Option<Instant>,
    quiet: bool,
}

impl ConsoleProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            state: ProgressState::default(),
            start_time: None,
            quiet,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    fn refresh_timing(&mut self) {
        let elapsed = self
            .start_time
            .map(|s| s.elapsed().as_secs_f32())
            .unwrap_or(0.0);
        self.state.elapsed_secs = elapsed as u64;

        let done = self.state.chunks_done;
        let remaining = self.state.total_chunks.saturating_sub(done);
        self.state.eta_secs = if done > 0 && remaining > 0 {
            Some((elapsed / done as f32 * remaining as f32) as u64)
        } else {
            None
        };
    }

    /// Current status line
    pub fn render(&self) -> String {
        let state = &self.state;
        let eta = state
            .eta_secs
            .map(|s| format!(" ETA: {}", format_duration(s)))
            .unwrap_or_default();

        format!(
            "[{}/{}] {} {} {}/{} chunks {}{}",
            state.section_index + 1,
            state.total_sections,
            state.section_label,
            render_progress_bar(state.chunks_done as usize, state.total_chunks as usize, 30),
            state.chunks_done,
            state.total_chunks,
            format_cost(state.running_cost),
            eta
        )
    }

    fn draw(&self) {
        if self.quiet {
            return;
        }
        if self.term.is_term() {
            let _ = self.term.clear_line();
            let _ = self.term.write_str(&self.render());
        }
    }

    fn println(&self, line: &str) {
        if self.quiet {
            return;
        }
        if self.term.is_term() {
            let _ = self.term.clear_line();
        }
        let _ = self.term.write_line(line);
    }
}

impl BuildObserver for ConsoleProgress {
    fn build_started(&mut self, plan: &BuildPlan) {
        self.start_time = Some(Instant::now());
        self.state = ProgressState {
            total_sections: plan.sections.len(),
            total_chunks: plan.total_chunks,
            ..Default::default()
        };
        self.println(&format!(
            "{} Generating {} sections ({} chunks) with {}",
            style("▶").cyan(),
            plan.sections.len(),
            plan.total_chunks,
            plan.model
        ));
    }

    fn section_started(&mut self, index: usize, _total: usize, section: &Section, _chunks: u32) {
        self.state.section_index = index;
        self.state.section_label = section.label.clone();
        self.draw();
    }

    fn chunk_completed(
        &mut self,
        _section: &Section,
        _chunk_index: u32,
        _total_chunks: u32,
        _usage: &TokenUsage,
        running_cost: f64,
    ) {
        self.state.chunks_done += 1;
        self.state.running_cost = running_cost;
        self.refresh_timing();
        self.draw();
    }

    fn section_completed(&mut self, result: &SectionResult) {
        self.println(&format!(
            "{} {} ({} chunks, {} tokens)",
            style("✓").green(),
            result.section_label,
            result.num_chunks,
            result.usage.total_tokens
        ));
    }

    fn archive_written(&mut self, path: &Path) {
        tracing::debug!(path = %path.display(), "Archive written");
    }
}

/// Render a simple progress bar
fn render_progress_bar(completed: usize, total: usize, width: usize) -> String {
    if total == 0 {
        return format!("[{}]", " ".repeat(width));
    }

    let progress = (completed as f32 / total as f32).min(1.0);
    let filled = (progress * width as f32) as usize;
    let empty = width.saturating_sub(filled);

    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format duration as human-readable string
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Format byte count with binary units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::PlannedSection;
    use std::path::PathBuf;

    fn plan() -> BuildPlan {
        BuildPlan {
            model: "gpt-4o-mini".to_string(),
            root_dir: PathBuf::from("/out/bundle"),
            master_archive: PathBuf::from("/out/bundle/bundle_complete.zip"),
            generate_pdfs: false,
            sections: vec![PlannedSection {
                id: "guide".to_string(),
                label: "Guide".to_string(),
                chunks: 4,
                dir: PathBuf::from("/out/bundle/guide"),
            }],
            total_chunks: 4,
        }
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(render_progress_bar(0, 0, 4), "[    ]");
        assert_eq!(render_progress_bar(2, 4, 4), "[██░░]");
        assert_eq!(render_progress_bar(9, 4, 4), "[████]");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(61), "1m 1s");
        assert_eq!(format_duration(3700), "1h 1m");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_observer_tracks_chunks_and_cost() {
        let mut progress = ConsoleProgress::new(true);
        let plan = plan();
        let section = Section::new("guide", "Guide", "A guide", 4);

        progress.build_started(&plan);
        progress.section_started(0, 1, &section, 4);
        progress.chunk_completed(&section, 0, 4, &TokenUsage::new(10, 5, 15), 0.0012);
        progress.chunk_completed(&section, 1, 4, &TokenUsage::new(10, 5, 15), 0.0024);

        let state = progress.state();
        assert_eq!(state.chunks_done, 2);
        assert_eq!(state.total_chunks, 4);
        assert_eq!(state.section_label, "Guide");
        assert_eq!(state.running_cost, 0.0024);

        let line = progress.render();
        assert!(line.starts_with("[1/1] Guide"));
        assert!(line.contains("2/4 chunks"));
        assert!(line.contains("$0.0024"));
    }
}
