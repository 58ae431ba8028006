//! LUT construction: the resumable build task and its drivers.
//!
//! A build is modeled as a [`LutBuild`] task that advances one progress
//! step per [`Iterator::next`] call. Each step evaluates whole r-planes of
//! the grid until the next 5% boundary is crossed, then yields a
//! [`BuildProgress`]. Drivers decide how the task is pumped:
//!
//! | Driver | Progress | Threads |
//! |--------|----------|---------|
//! | [`LutBuilder::build`] | none | caller |
//! | [`LutBuilder::build_with_progress`] | callback, may stop | caller |
//! | [`LutBuilder::build_async`] | optional channel | tokio task, yields per step |
//! | [`LutBuilder::build_parallel`] | none | rayon, one r-plane per job |
//!
//! A task that is dropped or stopped early yields [`BuildOutcome::Cancelled`];
//! the partially filled grid is never exposed.

use std::ops::ControlFlow;
use std::time::Instant;

use rayon::prelude::*;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::analysis::classify::ImageProfile;
use crate::error::{Result, TransferError};
use crate::image::PixelBuffer;
use crate::transform::evaluate::{NodeContext, NodeEvents, evaluate_node};
use crate::transform::lut::Lut3D;
use crate::transform::params::{LUT_SIZE, StatsOptions, TransferConfig};

/// Minimum distance between two progress reports, in percent.
pub const PROGRESS_STEP: u8 = 5;

/// One progress report of a running build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProgress {
    /// 0–100.
    pub percent: u8,
    pub message: String,
}

/// How a build ended.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Completed(Lut3D),
    /// The caller stopped driving the build before it finished.
    Cancelled,
}

impl BuildOutcome {
    /// The LUT, or [`TransferError::BuildCancelled`].
    pub fn into_lut(self) -> Result<Lut3D> {
        match self {
            Self::Completed(lut) => Ok(lut),
            Self::Cancelled => Err(TransferError::BuildCancelled),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Per-build event counters. Always collected; individual events are only
/// logged when [`TransferConfig::diagnostics`] is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildDiagnostics {
    /// L\*a\*b\* inversions that clamped their input or output.
    pub clamped_inversions: usize,
    /// L\*a\*b\* inversions that failed; the node color was substituted.
    pub failed_inversions: usize,
    /// Nodes changed by at least one gamut repair stage.
    pub gamut_repairs: usize,
    /// Nodes whose output was non-finite and fell back to identity.
    pub non_finite_nodes: usize,
}

impl BuildDiagnostics {
    fn record(&mut self, events: &NodeEvents) {
        self.clamped_inversions += usize::from(events.lab_clamped);
        self.failed_inversions += usize::from(events.lab_failed);
        self.gamut_repairs += usize::from(events.repair.any());
        self.non_finite_nodes += usize::from(events.non_finite);
    }

    /// Sum of two sets of counters.
    pub fn merge(self, other: Self) -> Self {
        Self {
            clamped_inversions: self.clamped_inversions + other.clamped_inversions,
            failed_inversions: self.failed_inversions + other.failed_inversions,
            gamut_repairs: self.gamut_repairs + other.gamut_repairs,
            non_finite_nodes: self.non_finite_nodes + other.non_finite_nodes,
        }
    }
}

/// Builds 3D LUTs that carry a reference image's look onto a target.
#[derive(Debug, Clone)]
pub struct LutBuilder {
    config: TransferConfig,
    stats: StatsOptions,
    size: usize,
}

impl LutBuilder {
    /// Validate the config and create a builder for [`LUT_SIZE`] grids.
    pub fn new(config: TransferConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stats: StatsOptions::default(),
            size: LUT_SIZE,
        })
    }

    /// Same builder with different statistics options.
    pub fn with_stats_options(mut self, stats: StatsOptions) -> Self {
        self.stats = stats;
        self
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Grid size per axis of the LUTs this builder produces.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Analyze one image with this builder's statistics options.
    pub fn analyze(&self, buffer: &PixelBuffer) -> Result<ImageProfile> {
        ImageProfile::analyze(buffer, &self.stats)
    }

    /// Start a resumable build. Nothing is evaluated until the task is
    /// driven.
    pub fn start<'a>(
        &'a self,
        reference: &'a ImageProfile,
        target: &'a ImageProfile,
    ) -> Result<LutBuild<'a>> {
        let ctx = NodeContext::new(&self.config, reference, target)?;
        info!(
            size = self.size,
            intensity = self.config.intensity,
            anti_banding = self.config.anti_banding,
            stylize = self.config.stylize,
            "starting LUT build"
        );
        Ok(LutBuild {
            ctx,
            size: self.size,
            data: vec![[0.0; 3]; self.size * self.size * self.size],
            next_plane: 0,
            percent: 0,
            diagnostics: BuildDiagnostics::default(),
            started: Instant::now(),
        })
    }

    /// Blocking build from two pixel buffers.
    pub fn build(&self, reference: &PixelBuffer, target: &PixelBuffer) -> Result<Lut3D> {
        let (reference, target) = self.analyze_pair(reference, target)?;
        self.build_profiles(&reference, &target)
    }

    /// Blocking build from already analyzed images.
    pub fn build_profiles(&self, reference: &ImageProfile, target: &ImageProfile) -> Result<Lut3D> {
        let mut build = self.start(reference, target)?;
        for _ in build.by_ref() {}
        build.into_outcome().into_lut()
    }

    /// Blocking build that reports every progress step to `on_progress`.
    /// Returning `ControlFlow::Break` cancels the build.
    pub fn build_with_progress<F>(
        &self,
        reference: &PixelBuffer,
        target: &PixelBuffer,
        mut on_progress: F,
    ) -> Result<BuildOutcome>
    where
        F: FnMut(&BuildProgress) -> ControlFlow<()>,
    {
        let (reference, target) = self.analyze_pair(reference, target)?;
        let mut build = self.start(&reference, &target)?;
        for progress in build.by_ref() {
            if on_progress(&progress).is_break() {
                info!(percent = progress.percent, "LUT build cancelled");
                return Ok(BuildOutcome::Cancelled);
            }
        }
        Ok(build.into_outcome())
    }

    /// Build on the current tokio task, yielding to the scheduler after
    /// every progress step. Progress goes to `progress` when given; a closed
    /// receiver is ignored. Dropping the future cancels the build.
    pub async fn build_async(
        &self,
        reference: &PixelBuffer,
        target: &PixelBuffer,
        progress: Option<mpsc::UnboundedSender<BuildProgress>>,
    ) -> Result<Lut3D> {
        let (reference, target) = self.analyze_pair(reference, target)?;
        let mut build = self.start(&reference, &target)?;
        for step in build.by_ref() {
            if let Some(tx) = &progress {
                // The receiver may have gone away; the build still completes.
                let _ = tx.send(step);
            }
            tokio::task::yield_now().await;
        }
        build.into_outcome().into_lut()
    }

    /// Evaluate r-planes in parallel with rayon. Produces the same LUT as
    /// the sequential drivers.
    pub fn build_parallel(&self, reference: &PixelBuffer, target: &PixelBuffer) -> Result<Lut3D> {
        let (reference, target) = self.analyze_pair(reference, target)?;
        self.build_profiles_parallel(&reference, &target)
    }

    /// Parallel build from already analyzed images.
    pub fn build_profiles_parallel(
        &self,
        reference: &ImageProfile,
        target: &ImageProfile,
    ) -> Result<Lut3D> {
        let ctx = NodeContext::new(&self.config, reference, target)?;
        let size = self.size;
        let started = Instant::now();
        let mut data = vec![[0.0_f32; 3]; size * size * size];

        let diagnostics = data
            .par_chunks_mut(size * size)
            .enumerate()
            .map(|(r, plane)| evaluate_plane(&ctx, size, r, plane))
            .reduce(BuildDiagnostics::default, BuildDiagnostics::merge);

        report_finished(&diagnostics, size, started);
        Ok(Lut3D::from_parts(size, data))
    }

    fn analyze_pair(
        &self,
        reference: &PixelBuffer,
        target: &PixelBuffer,
    ) -> Result<(ImageProfile, ImageProfile)> {
        Ok((self.analyze(reference)?, self.analyze(target)?))
    }
}

/// A LUT build in progress. Drive it with [`Iterator::next`] and finish it
/// with [`LutBuild::into_outcome`].
#[derive(Debug)]
pub struct LutBuild<'a> {
    ctx: NodeContext<'a>,
    size: usize,
    data: Vec<[f32; 3]>,
    next_plane: usize,
    percent: u8,
    diagnostics: BuildDiagnostics,
    started: Instant,
}

impl LutBuild<'_> {
    /// Progress reported by the last step.
    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// `true` once every node has been evaluated.
    pub fn is_complete(&self) -> bool {
        self.next_plane >= self.size
    }

    /// Counters so far.
    pub fn diagnostics(&self) -> &BuildDiagnostics {
        &self.diagnostics
    }

    /// Finish the task. Anything short of a complete grid is `Cancelled`.
    pub fn into_outcome(self) -> BuildOutcome {
        if !self.is_complete() {
            debug!(
                planes = self.next_plane,
                size = self.size,
                "discarding partial LUT build"
            );
            return BuildOutcome::Cancelled;
        }
        report_finished(&self.diagnostics, self.size, self.started);
        BuildOutcome::Completed(Lut3D::from_parts(self.size, self.data))
    }
}

impl Iterator for LutBuild<'_> {
    type Item = BuildProgress;

    fn next(&mut self) -> Option<BuildProgress> {
        if self.is_complete() {
            return None;
        }

        let goal = self.percent.saturating_add(PROGRESS_STEP).min(100);
        let plane_len = self.size * self.size;
        while !self.is_complete() {
            let r = self.next_plane;
            let plane = &mut self.data[r * plane_len..(r + 1) * plane_len];
            let counters = evaluate_plane(&self.ctx, self.size, r, plane);
            self.diagnostics = self.diagnostics.merge(counters);
            self.next_plane += 1;

            let percent = (self.next_plane * 100 / self.size) as u8;
            // Fold a final sliver into the last step so reports stay 5% apart.
            let room_left = 100 - percent >= PROGRESS_STEP;
            if (percent >= goal && room_left) || self.is_complete() {
                self.percent = percent;
                break;
            }
        }

        Some(BuildProgress {
            percent: self.percent,
            message: format!("Building LUT: {}/{} planes", self.next_plane, self.size),
        })
    }
}

/// Evaluate every node of r-plane `r` into `plane` (length `size²`).
fn evaluate_plane(
    ctx: &NodeContext<'_>,
    size: usize,
    r: usize,
    plane: &mut [[f32; 3]],
) -> BuildDiagnostics {
    let scale = 1.0 / (size - 1) as f32;
    let log_events = ctx.config.diagnostics;
    let mut diagnostics = BuildDiagnostics::default();

    for g in 0..size {
        for b in 0..size {
            let rgb = [r as f32 * scale, g as f32 * scale, b as f32 * scale];
            let out = evaluate_node(ctx, rgb, [r, g, b]);
            plane[g * size + b] = out.rgb;
            diagnostics.record(&out.events);
            if log_events {
                log_node_events(&out.events, (r * size + g) * size + b, rgb);
            }
        }
    }
    diagnostics
}

fn log_node_events(events: &NodeEvents, node: usize, rgb: [f32; 3]) {
    let [r, g, b] = rgb;
    if events.lab_failed {
        debug!(node, r, g, b, "L*a*b* inversion failed, substituted node color");
    } else if events.lab_clamped {
        trace!(node, r, g, b, "L*a*b* inversion clamped");
    }
    if events.repair.any() {
        trace!(
            node,
            r,
            g,
            b,
            cyan_bias = events.repair.cyan_bias,
            wash_out = events.repair.wash_out,
            "gamut repaired"
        );
    }
    if events.non_finite {
        debug!(node, r, g, b, "non-finite node output, kept identity");
    }
}

fn report_finished(diagnostics: &BuildDiagnostics, size: usize, started: Instant) {
    info!(
        size,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "LUT build complete"
    );
    debug!(?diagnostics, "LUT build counters");
    if diagnostics.non_finite_nodes > 0 || diagnostics.failed_inversions > 0 {
        warn!(
            non_finite = diagnostics.non_finite_nodes,
            failed_inversions = diagnostics.failed_inversions,
            "some LUT nodes fell back to identity"
        );
    }
}
