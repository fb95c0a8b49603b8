//! Discrete package sizing.
//!
//! During system sizing, each air loop's calculated main supply flow is
//! replaced by the smallest catalog package that covers it. A shared
//! subroutine does the snapping; flows above the largest package raise a
//! severe warning and leave the calculated value in place.

use ems_core::{format_real, parse_volume_rate, round_to, to_m3ps};
use ems_program::{
    Actuator, CallingPoint, ComponentKind, ComponentRef, EmsModel, GlobalVariable, Identifier,
    InternalVariable, NameAllocator, PiecewiseRuleProgramBuilder, Program, ProgramBuilder,
    ProgramCallingManager, sanitize,
};
use serde::{Deserialize, Serialize};

use crate::error::{MeasureError, MeasureResult};
use crate::measure::Measure;

const MEASURE: &str = "discrete package sizing";

const DISCRETE_FLOW: &str = "argDiscreteMainVdot";
const CALCULATED_FLOW: &str = "argMainVdot";
const SELECT_SUBROUTINE: &str = "Select_Discrete_Nominal_Air_Flow";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscretePackageSizing {
    pub air_loops: Vec<String>,
    /// Package flows, smallest first, with unit (`"1200 cfm"`); bare numbers are m³/s.
    pub package_sizes: Vec<String>,
    pub program: String,
    pub calling_manager: String,
}

impl Default for DiscretePackageSizing {
    fn default() -> Self {
        Self {
            air_loops: Vec::new(),
            package_sizes: [
                "0.56628", "0.75504", "0.9438", "1.13256", "1.4157", "1.60446", "1.8879",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            program: "Resize_PSZ_To_Match_Product_Availability".to_string(),
            calling_manager: "Apply Discrete Package Sizes to Air System Sizing".to_string(),
        }
    }
}

impl DiscretePackageSizing {
    pub fn new(air_loops: Vec<String>) -> Self {
        Self {
            air_loops,
            ..Self::default()
        }
    }

    /// Package sizes in m³/s, checked positive and strictly ascending.
    pub fn sizes_m3ps(&self) -> MeasureResult<Vec<f64>> {
        let mut sizes = Vec::with_capacity(self.package_sizes.len());
        for raw in &self.package_sizes {
            let size = round_to(to_m3ps(parse_volume_rate(raw)?), 6);
            if size <= 0.0 {
                return Err(MeasureError::InvalidArgument {
                    measure: MEASURE,
                    what: format!("package size '{raw}' must be positive"),
                });
            }
            if sizes.last().is_some_and(|prev| *prev >= size) {
                return Err(MeasureError::InvalidArgument {
                    measure: MEASURE,
                    what: format!("package size '{raw}' is not larger than the previous one"),
                });
            }
            sizes.push(size);
        }
        Ok(sizes)
    }
}

impl Measure for DiscretePackageSizing {
    fn name(&self) -> &'static str {
        MEASURE
    }

    fn build(&self, names: NameAllocator) -> MeasureResult<(EmsModel, NameAllocator)> {
        if self.air_loops.is_empty() {
            return Err(MeasureError::NothingToApply {
                measure: MEASURE,
                what: "no air loops selected",
            });
        }
        let sizes = self.sizes_m3ps()?;

        let mut model = EmsModel::new();
        model.add_global(GlobalVariable::new(Identifier::new(DISCRETE_FLOW)?))?;
        model.add_global(GlobalVariable::new(Identifier::new(CALCULATED_FLOW)?))?;

        let select = PiecewiseRuleProgramBuilder::new(CALCULATED_FLOW)
            .rules(
                sizes
                    .iter()
                    .map(|size| (*size, DISCRETE_FLOW, format_real(*size))),
            )
            .otherwise("dummy", "@SevereWarnEP 666.0")
            .build()?;
        model.add_subroutine(Program::new(Identifier::new(SELECT_SUBROUTINE)?, select))?;

        let mut body = ProgramBuilder::new();
        for air_loop in &self.air_loops {
            let stem = sanitize(air_loop);

            let calculated = Identifier::new(format!("{stem}_CalcMainSupVdot"))?;
            model.add_internal_variable(InternalVariable::new(
                calculated.clone(),
                air_loop.as_str(),
                "Intermediate Air System Main Supply Volume Flow Rate",
            ))?;

            let sizing = ComponentRef::new(air_loop.as_str(), ComponentKind::AirSystemSizing);
            let actuator = Identifier::new(format!("{stem}MainSupVdotSet"))?;
            model.add_actuator(Actuator::for_component(
                actuator.clone(),
                &sizing,
                "Main Supply Volume Flow Rate",
            )?)?;

            body = body
                .set(CALCULATED_FLOW, calculated.as_str())
                .run(SELECT_SUBROUTINE)
                .set(actuator.as_str(), DISCRETE_FLOW);
        }

        let program = Identifier::new(self.program.as_str())?;
        model.add_program(Program::new(program.clone(), body.build()?))?;
        model.add_calling_manager(
            ProgramCallingManager::new(self.calling_manager.as_str(), CallingPoint::EndOfSystemSizing)
                .with_program(program),
        )?;

        Ok((model, names))
    }
}
