//! The measure trait and batch application.

use ems_program::{EmsModel, NameAllocator};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::comfort::ComfortHalt;
use crate::condenser::CondenserLoopOverride;
use crate::curve::CurveResultOverride;
use crate::error::MeasureResult;
use crate::sizing::DiscretePackageSizing;
use crate::thermochromic::ThermochromicWindow;
use crate::vrf::VrfModeOverride;
use crate::zone_average::ZoneAverageTemperature;

/// A model edit that adds EMS objects.
///
/// Implementations only describe what to add ([`build`](Measure::build));
/// [`apply`](Measure::apply) merges the result so that a failing measure
/// leaves the model untouched.
pub trait Measure: Send + Sync {
    /// Display name.
    fn name(&self) -> &'static str;

    /// Number of indices this measure takes from the name allocator.
    ///
    /// Batch application uses it to hand out disjoint index ranges before
    /// building in parallel.
    fn allocations(&self) -> u32 {
        0
    }

    /// Build the objects this measure adds, numbering generated names from
    /// `names`. Returns the objects and the advanced allocator.
    fn build(&self, names: NameAllocator) -> MeasureResult<(EmsModel, NameAllocator)>;

    /// Build and merge into `model`.
    fn apply(&self, model: &mut EmsModel, names: NameAllocator) -> MeasureResult<NameAllocator> {
        let before = model.summary();
        let (objects, next) = self.build(names)?;
        model.merge(objects)?;
        info!(
            measure = self.name(),
            before = %before,
            after = %model.summary(),
            "applied measure"
        );
        Ok(next)
    }
}

/// Any measure, as written in project files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "measure", rename_all = "snake_case")]
pub enum MeasureConfig {
    ThermochromicWindow(ThermochromicWindow),
    CondenserLoopOverride(CondenserLoopOverride),
    ComfortHalt(ComfortHalt),
    DiscretePackageSizing(DiscretePackageSizing),
    ZoneAverageTemperature(ZoneAverageTemperature),
    CurveResultOverride(CurveResultOverride),
    VrfModeOverride(VrfModeOverride),
}

impl MeasureConfig {
    fn inner(&self) -> &dyn Measure {
        match self {
            Self::ThermochromicWindow(m) => m,
            Self::CondenserLoopOverride(m) => m,
            Self::ComfortHalt(m) => m,
            Self::DiscretePackageSizing(m) => m,
            Self::ZoneAverageTemperature(m) => m,
            Self::CurveResultOverride(m) => m,
            Self::VrfModeOverride(m) => m,
        }
    }
}

impl Measure for MeasureConfig {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn allocations(&self) -> u32 {
        self.inner().allocations()
    }

    fn build(&self, names: NameAllocator) -> MeasureResult<(EmsModel, NameAllocator)> {
        self.inner().build(names)
    }
}

/// Apply independent measures.
///
/// Index ranges are reserved in input order, the measures are built in
/// parallel, and the results are merged in input order. Output is identical
/// to applying the measures one after another. If any measure fails the model
/// is left unchanged.
pub fn apply_batch<M: Measure>(
    model: &mut EmsModel,
    measures: &[M],
    names: NameAllocator,
) -> MeasureResult<NameAllocator> {
    let mut starts = Vec::with_capacity(measures.len());
    let mut next = names;
    for measure in measures {
        starts.push(next);
        next = next.skip(measure.allocations())?;
    }

    let built: Vec<MeasureResult<(EmsModel, NameAllocator)>> = measures
        .par_iter()
        .zip(starts.par_iter())
        .map(|(measure, start)| measure.build(*start))
        .collect();

    let mut combined = EmsModel::new();
    for (measure, result) in measures.iter().zip(built) {
        let (objects, _) = result?;
        combined.merge(objects)?;
        info!(measure = measure.name(), "built measure");
    }

    let before = model.summary();
    model.merge(combined)?;
    info!(
        measures = measures.len(),
        before = %before,
        after = %model.summary(),
        "applied measure batch"
    );
    Ok(next)
}
