//! Shared FFT planning
//!
//! Plan construction and teardown go through one mutex-guarded cache.
//! Executing a plan never touches the lock, so analyzers run their
//! transforms concurrently once configured.

use parking_lot::Mutex;
use realfft::{RealFftPlanner, RealToComplex};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Forward real-to-complex plan handed to analyzers
pub type ForwardPlan = Arc<dyn RealToComplex<f32>>;

/// Process-wide engine behind [`FftEngine::shared`]
static SHARED: OnceLock<Arc<FftEngine>> = OnceLock::new();

/// Plan cache guarded by the planning lock
pub struct FftEngine {
    plans: Mutex<HashMap<usize, ForwardPlan>>,
}

impl std::fmt::Debug for FftEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftEngine")
            .field("cached_plans", &self.cached_plans())
            .finish()
    }
}

impl Default for FftEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FftEngine {
    /// Isolated engine, for hosts that inject their own
    pub fn new() -> Self {
        Self {
            plans: Mutex::new(HashMap::new()),
        }
    }

    /// Process-wide engine
    pub fn shared() -> Arc<FftEngine> {
        SHARED.get_or_init(|| Arc::new(FftEngine::new())).clone()
    }

    /// Forward plan for `len` real samples, created on first use
    ///
    /// Setup-time only: blocks on the planning lock.
    pub fn plan_forward(&self, len: usize) -> ForwardPlan {
        let mut plans = self.plans.lock();
        plans
            .entry(len)
            .or_insert_with(|| {
                log::debug!("FftEngine: planning forward transform, len={}", len);
                RealFftPlanner::<f32>::new().plan_fft_forward(len)
            })
            .clone()
    }

    /// Return a plan obtained from [`plan_forward`](Self::plan_forward)
    ///
    /// The cached plan is dropped, under the lock, once no analyzer holds it.
    pub fn release(&self, plan: ForwardPlan) {
        let mut plans = self.plans.lock();
        let len = plan.len();
        drop(plan);

        let unused = plans
            .get(&len)
            .is_some_and(|cached| Arc::strong_count(cached) == 1);
        if unused {
            plans.remove(&len);
            log::debug!("FftEngine: released forward transform, len={}", len);
        }
    }

    /// Number of plans currently cached
    pub fn cached_plans(&self) -> usize {
        self.plans.lock().len()
    }
}
