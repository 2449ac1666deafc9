//! Pooled, isolated render pages.
//!
//! Each page is a worker thread with its own asset bundle and its own
//! viewport-sized surfaces. Pages pull jobs from one shared queue. A caller that
//! gives up on a running job marks it abandoned; the page finishing that job
//! retires and a fresh page takes its place.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use crate::assets::bundle::AssetBundle;
use crate::compose::context::RenderContext;
use crate::compose::pipeline::Pipeline;
use crate::compose::request::RenderRequest;
use crate::foundation::core::Viewport;
use crate::foundation::error::{ArtError, ArtResult};
use crate::render::backend::{AssetSource, BackendKind, RenderBackend, RenderedArtwork, rasterize};
use crate::render::cpu::CpuSurface;
use crate::seed::noise::NoiseFidelity;

const QUEUED: u8 = 0;
const RUNNING: u8 = 1;
const DONE: u8 = 2;
const ABANDONED: u8 = 3;

type Reply = ArtResult<RenderedArtwork>;

struct Job {
    request: RenderRequest,
    state: Arc<AtomicU8>,
    reply: mpsc::SyncSender<Reply>,
}

struct PoolShared {
    jobs: Mutex<mpsc::Receiver<Job>>,
    source: AssetSource,
    fidelity: NoiseFidelity,
    live: AtomicUsize,
    next_id: AtomicUsize,
}

/// Render backend that dispatches each request to an isolated page and waits
/// for its ready flag, bounded by a hard timeout.
pub struct HeadlessBackend {
    tx: Mutex<mpsc::Sender<Job>>,
    shared: Arc<PoolShared>,
    timeout: Duration,
}

impl std::fmt::Debug for HeadlessBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessBackend")
            .field("live_pages", &self.live_pages())
            .field("timeout", &self.timeout)
            .field("source", &self.shared.source)
            .finish()
    }
}

impl HeadlessBackend {
    /// Start `pages` page workers. Pages load their assets on first use.
    pub fn new(
        source: AssetSource,
        fidelity: NoiseFidelity,
        pages: usize,
        timeout: Duration,
    ) -> ArtResult<Self> {
        if pages == 0 {
            return Err(ArtError::validation("headless pool needs at least one page"));
        }
        if timeout.is_zero() {
            return Err(ArtError::validation("headless timeout must be > 0"));
        }
        let (tx, rx) = mpsc::channel();
        let shared = Arc::new(PoolShared {
            jobs: Mutex::new(rx),
            source,
            fidelity,
            live: AtomicUsize::new(0),
            next_id: AtomicUsize::new(0),
        });
        for _ in 0..pages {
            spawn_page(&shared)?;
        }
        tracing::info!(pages, timeout_ms = timeout.as_millis() as u64, "headless pool started");
        Ok(Self {
            tx: Mutex::new(tx),
            shared,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Pages currently alive, including one still finishing an abandoned job.
    pub fn live_pages(&self) -> usize {
        self.shared.live.load(Ordering::Acquire)
    }

    /// Like [`RenderBackend::render`] with an explicit deadline.
    pub fn render_with_timeout(
        &self,
        request: &RenderRequest,
        timeout: Duration,
    ) -> ArtResult<RenderedArtwork> {
        request.validate()?;

        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        let state = Arc::new(AtomicU8::new(QUEUED));
        let job = Job {
            request: request.clone(),
            state: state.clone(),
            reply: reply_tx,
        };
        self.tx
            .lock()
            .map_err(|_| ArtError::render("headless queue poisoned"))?
            .send(job)
            .map_err(|_| ArtError::render("headless pool is shut down"))?;

        match reply_rx.recv_timeout(timeout) {
            Ok(res) => res,
            Err(mpsc::RecvTimeoutError::Timeout) => self.abandon(&state, &reply_rx, timeout),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(ArtError::render("headless page exited without a result"))
            }
        }
    }

    fn abandon(
        &self,
        state: &AtomicU8,
        reply_rx: &mpsc::Receiver<Reply>,
        timeout: Duration,
    ) -> ArtResult<RenderedArtwork> {
        let expired = || {
            ArtError::timeout(format!(
                "headless render exceeded {} ms",
                timeout.as_millis()
            ))
        };
        if state
            .compare_exchange(QUEUED, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            tracing::warn!("headless render timed out while queued");
            return Err(expired());
        }
        match state.compare_exchange(RUNNING, ABANDONED, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => {
                tracing::warn!("headless render timed out; replacing page");
                if let Err(e) = spawn_page(&self.shared) {
                    tracing::error!(error = %e, "failed to spawn replacement page");
                }
                Err(expired())
            }
            // Finished between the deadline and now; the reply is on its way.
            Err(_) => reply_rx
                .recv()
                .map_err(|_| ArtError::render("headless page exited without a result"))?,
        }
    }
}

impl RenderBackend for HeadlessBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Headless
    }

    #[tracing::instrument(
        skip_all,
        fields(signer = request.signer_ordinal, viewport = ?request.viewport)
    )]
    fn render(&self, request: &RenderRequest) -> ArtResult<RenderedArtwork> {
        tracing::debug!("headless render started");
        let out = self.render_with_timeout(request, self.timeout);
        match &out {
            Ok(art) => tracing::debug!(bytes = art.png.len(), "headless render finished"),
            Err(e) => tracing::error!(error = %e, "headless render failed"),
        }
        out
    }
}

fn spawn_page(shared: &Arc<PoolShared>) -> ArtResult<()> {
    let id = shared.next_id.fetch_add(1, Ordering::Relaxed);
    let worker = shared.clone();
    shared.live.fetch_add(1, Ordering::AcqRel);
    let spawned = std::thread::Builder::new()
        .name(format!("maverick-page-{id}"))
        .spawn(move || {
            Page::new(id).run(&worker);
            worker.live.fetch_sub(1, Ordering::AcqRel);
        });
    if let Err(e) = spawned {
        shared.live.fetch_sub(1, Ordering::AcqRel);
        return Err(ArtError::render(format!("spawn headless page: {e}")));
    }
    Ok(())
}

/// One isolated page: lazily loaded assets plus a surface per viewport.
struct Page {
    id: usize,
    assets: Option<Arc<AssetBundle>>,
    surfaces: HashMap<Viewport, CpuSurface>,
}

impl Page {
    fn new(id: usize) -> Self {
        Self {
            id,
            assets: None,
            surfaces: HashMap::new(),
        }
    }

    fn run(mut self, shared: &PoolShared) {
        loop {
            let next = match shared.jobs.lock() {
                Ok(rx) => rx.recv(),
                Err(_) => return,
            };
            let Ok(job) = next else {
                // Backend dropped.
                return;
            };
            if job
                .state
                .compare_exchange(QUEUED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                continue;
            }

            let res = self.render(shared, &job.request);

            if job
                .state
                .compare_exchange(RUNNING, DONE, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                tracing::debug!(page = self.id, "page retiring after abandoned render");
                return;
            }
            let _ = job.reply.send(res);
        }
    }

    fn render(&mut self, shared: &PoolShared, request: &RenderRequest) -> ArtResult<RenderedArtwork> {
        let assets = match &self.assets {
            Some(a) => a.clone(),
            None => {
                let a = shared.source.load()?;
                tracing::debug!(page = self.id, icons = a.icon_count(), "page assets loaded");
                self.assets = Some(a.clone());
                a
            }
        };

        let ctx = RenderContext::new(request.clone(), shared.fidelity, assets.icon_count())?;
        let g = ctx.geometry;
        let pipeline = Pipeline::new(ctx, assets.clone());

        let surface = match self.surfaces.entry(request.viewport) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(CpuSurface::new(g.width, g.height, assets.fonts.clone())?)
            }
        };

        let (frame, _) = rasterize(&pipeline, surface)?;
        // The raster pass marks the artwork ready; encode only after that.
        let report = pipeline.ready().wait(Duration::ZERO)?;
        RenderedArtwork::from_frame(&frame, report)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/headless.rs"]
mod tests;
