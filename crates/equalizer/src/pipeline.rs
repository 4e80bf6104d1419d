//! Frame orchestration: Build → Map → Remap.
//!
//! A frame moves through `Idle → Building → Mapping → Remapping → Done`.
//! Each arrow is a barrier: a stage only starts once the previous stage has
//! returned its complete, frozen result. The histogram and the mapping table
//! live on the frame's stack and are dropped when the frame ends.
//!
//! A frame that fails (bad input, verification mismatch, cancellation,
//! deadline) ends in `Failed` and publishes nothing; `last_output` keeps the
//! previous good image.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use equalize_common::{
    Channel, EqualizeError, EqualizeResult, FrameStage, Image, ImageView, PixelLayout,
    CHANNEL_COUNT,
};
use serde::Serialize;

use crate::builder::HistogramBuilder;
use crate::config::PipelineConfig;
use crate::histogram::ChannelStats;
use crate::mapper::EqualizationMapper;
use crate::remap::RemapStage;

/// Where the current (or most recent) frame is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Building,
    Mapping,
    Remapping,
    Done,
    Failed,
}

impl PipelineState {
    fn as_u8(self) -> u8 {
        match self {
            PipelineState::Idle => 0,
            PipelineState::Building => 1,
            PipelineState::Mapping => 2,
            PipelineState::Remapping => 3,
            PipelineState::Done => 4,
            PipelineState::Failed => 5,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => PipelineState::Building,
            2 => PipelineState::Mapping,
            3 => PipelineState::Remapping,
            4 => PipelineState::Done,
            5 => PipelineState::Failed,
            _ => PipelineState::Idle,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

impl From<FrameStage> for PipelineState {
    fn from(stage: FrameStage) -> Self {
        match stage {
            FrameStage::Building => PipelineState::Building,
            FrameStage::Mapping => PipelineState::Mapping,
            FrameStage::Remapping => PipelineState::Remapping,
        }
    }
}

/// Shared flag used to abandon a frame from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Caller policy for a single frame, checked at every stage boundary.
///
/// Work already running inside a stage is never interrupted; it completes and
/// its result is thrown away.
#[derive(Debug, Clone, Default)]
pub struct FrameControl {
    pub cancel: CancelToken,
    pub deadline: Option<Instant>,
}

impl FrameControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    fn check(&self, next: FrameStage, started: Instant) -> EqualizeResult<()> {
        if self.cancel.is_cancelled() {
            return Err(EqualizeError::Cancelled { stage: next });
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(EqualizeError::DeadlineExceeded {
                    stage: next,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                });
            }
        }
        Ok(())
    }
}

/// Receives every state transition. Called on the thread running the frame.
pub trait FrameObserver: Send + Sync {
    fn on_transition(&self, frame_id: u64, state: PipelineState);
}

/// Summary of a published frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub frame_id: u64,
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub build_ms: f64,
    pub map_ms: f64,
    pub remap_ms: f64,
    pub total_ms: f64,
    pub degenerate_channels: Vec<Channel>,
    pub channels: [ChannelStats; CHANNEL_COUNT],
}

/// A published frame: the equalized image and how it was produced.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub image: Arc<Image>,
    pub report: FrameReport,
}

/// Clears the in-flight flag however the frame ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Runs equalization frames, one at a time.
pub struct EqualizationPipeline {
    config: PipelineConfig,
    builder: HistogramBuilder,
    mapper: EqualizationMapper,
    remap: RemapStage,
    pool: Option<rayon::ThreadPool>,
    observer: Option<Arc<dyn FrameObserver>>,
    state: AtomicU8,
    in_flight: AtomicBool,
    last_output: RwLock<Option<Arc<Image>>>,
    next_frame_id: AtomicU64,
    frames_completed: AtomicU64,
    frames_failed: AtomicU64,
}

// Manual Debug implementation (thread pool and observer don't implement Debug)
impl std::fmt::Debug for EqualizationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EqualizationPipeline")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("frames_completed", &self.frames_completed())
            .field("frames_failed", &self.frames_failed())
            .finish_non_exhaustive()
    }
}

impl EqualizationPipeline {
    pub fn new(config: PipelineConfig) -> EqualizeResult<Self> {
        config.validate()?;

        let pool = match config.workers {
            Some(workers) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("equalize-worker-{}", i))
                    .build()
                    .map_err(|e| EqualizeError::WorkerPool(e.to_string()))?,
            ),
            None => None,
        };

        tracing::debug!(
            workers = ?config.workers,
            strategy = %config.builder.strategy,
            mapping = %config.mapping,
            rounding = %config.rounding,
            "Equalization pipeline created"
        );

        Ok(Self {
            builder: HistogramBuilder::new(config.builder.clone()),
            mapper: EqualizationMapper::new(config.mapping, config.rounding),
            remap: RemapStage::new(),
            config,
            pool,
            observer: None,
            state: AtomicU8::new(PipelineState::Idle.as_u8()),
            in_flight: AtomicBool::new(false),
            last_output: RwLock::new(None),
            next_frame_id: AtomicU64::new(0),
            frames_completed: AtomicU64::new(0),
            frames_failed: AtomicU64::new(0),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn FrameObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Most recent successfully published image.
    pub fn last_output(&self) -> Option<Arc<Image>> {
        match self.last_output.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn frames_completed(&self) -> u64 {
        self.frames_completed.load(Ordering::Relaxed)
    }

    pub fn frames_failed(&self) -> u64 {
        self.frames_failed.load(Ordering::Relaxed)
    }

    /// Equalize one image with no cancellation or deadline.
    pub fn equalize(&self, input: ImageView<'_>) -> EqualizeResult<Arc<Image>> {
        self.equalize_with(input, &FrameControl::default())
            .map(|output| output.image)
    }

    /// Equalize one image under the given frame policy.
    ///
    /// Fails with `FrameInFlight`, without touching the running frame, if
    /// another frame is already being processed by this pipeline.
    pub fn equalize_with(
        &self,
        input: ImageView<'_>,
        control: &FrameControl,
    ) -> EqualizeResult<FrameOutput> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(EqualizeError::FrameInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let frame_id = self.next_frame_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.transition(frame_id, PipelineState::Idle);

        let result = match &self.pool {
            Some(pool) => pool.install(|| self.run_frame(frame_id, input, control)),
            None => self.run_frame(frame_id, input, control),
        };

        match result {
            Ok(output) => {
                self.publish(Arc::clone(&output.image));
                self.frames_completed.fetch_add(1, Ordering::Relaxed);
                self.transition(frame_id, PipelineState::Done);
                tracing::debug!(
                    frame_id,
                    width = output.report.width,
                    height = output.report.height,
                    build_ms = output.report.build_ms,
                    map_ms = output.report.map_ms,
                    remap_ms = output.report.remap_ms,
                    total_ms = output.report.total_ms,
                    "Frame equalized"
                );
                Ok(output)
            }
            Err(e) => {
                self.frames_failed.fetch_add(1, Ordering::Relaxed);
                self.transition(frame_id, PipelineState::Failed);
                tracing::warn!(frame_id, code = e.code(), error = %e, "Frame failed");
                Err(e)
            }
        }
    }

    /// Runs the three stages on the calling thread (or inside the worker pool).
    ///
    /// Input that fails validation is rejected before `Building` is entered, so
    /// an observer sees `Idle -> Failed` for `InvalidInput`: no stage ever ran,
    /// and the frame still ends in the terminal `Failed` state.
    fn run_frame(
        &self,
        frame_id: u64,
        input: ImageView<'_>,
        control: &FrameControl,
    ) -> EqualizeResult<FrameOutput> {
        let started = Instant::now();

        // Malformed input never enters Building
        input.validate()?;

        control.check(FrameStage::Building, started)?;
        self.transition(frame_id, PipelineState::Building);
        let stage_start = Instant::now();
        let histogram = self.builder.build(&input)?;
        let build_time = stage_start.elapsed();

        control.check(FrameStage::Mapping, started)?;
        self.transition(frame_id, PipelineState::Mapping);
        tracing::trace!(
            frame_id,
            mode = %self.mapper.mode(),
            rounding = %self.mapper.rounding(),
            degenerate = ?Channel::ALL.map(|c| histogram.is_degenerate(c)),
            "Deriving mapping tables"
        );
        let stage_start = Instant::now();
        let table = self.mapper.map(&histogram);
        let map_time = stage_start.elapsed();

        control.check(FrameStage::Remapping, started)?;
        self.transition(frame_id, PipelineState::Remapping);
        let stage_start = Instant::now();
        let image = self.remap.apply(&input, &table)?;
        let remap_time = stage_start.elapsed();

        let report = FrameReport {
            frame_id,
            width: input.width(),
            height: input.height(),
            layout: input.layout(),
            build_ms: millis(build_time),
            map_ms: millis(map_time),
            remap_ms: millis(remap_time),
            total_ms: millis(started.elapsed()),
            degenerate_channels: table.degenerate_channels(),
            channels: histogram.all_stats(),
        };

        Ok(FrameOutput {
            image: Arc::new(image),
            report,
        })
    }

    fn transition(&self, frame_id: u64, state: PipelineState) {
        self.state.store(state.as_u8(), Ordering::Release);
        tracing::trace!(frame_id, state = ?state, "Pipeline transition");
        if let Some(observer) = &self.observer {
            observer.on_transition(frame_id, state);
        }
    }

    fn publish(&self, image: Arc<Image>) {
        match self.last_output.write() {
            Ok(mut slot) => *slot = Some(image),
            Err(poisoned) => *poisoned.into_inner() = Some(image),
        }
    }
}

/// Equalize a single image with the default configuration.
///
/// Every call is self-contained: nothing is kept between invocations.
pub fn equalize(input: ImageView<'_>) -> EqualizeResult<Image> {
    let pipeline = EqualizationPipeline::new(PipelineConfig::default())?;
    let output = pipeline.equalize_with(input, &FrameControl::default())?;
    drop(pipeline);
    Ok(Arc::try_unwrap(output.image).unwrap_or_else(|shared| (*shared).clone()))
}
