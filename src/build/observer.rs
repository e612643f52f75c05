//! Build progress hooks
//!
//! Hooks run synchronously on the coordinator's call path, between chunk
//! requests. They only observe; failures are reported through the run result.

use std::path::Path;

use super::report::{BuildPlan, SectionResult};
use crate::ai::provider::TokenUsage;
use crate::catalog::Section;

pub trait BuildObserver {
    fn build_started(&mut self, _plan: &BuildPlan) {}

    /// `index` is 0-based within the selection
    fn section_started(&mut self, _index: usize, _total: usize, _section: &Section, _chunks: u32) {}

    /// `running_cost` is the run total after this chunk
    fn chunk_completed(
        &mut self,
        _section: &Section,
        _chunk_index: u32,
        _total_chunks: u32,
        _usage: &TokenUsage,
        _running_cost: f64,
    ) {
    }

    fn section_completed(&mut self, _result: &SectionResult) {}

    fn archive_written(&mut self, _path: &Path) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BuildObserver for NoopObserver {}
