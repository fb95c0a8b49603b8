//! IDF text export.
//!
//! Renders an [`EmsModel`] as `EnergyManagementSystem:*` input objects, one
//! field per line with the usual `!-` field comments. Program lines become
//! `Program Line N` fields.

use crate::error::{ProgramError, ProgramResult};
use crate::model::EmsModel;
use crate::objects::Program;

const VALUE_WIDTH: usize = 28;

/// Why `text` cannot be written as one IDF field, if it cannot.
pub fn field_text_error(text: &str) -> Option<&'static str> {
    if text.contains(['\n', '\r']) {
        Some("must fit on one line")
    } else if text.contains([',', ';', '!']) {
        Some("must not contain ',', ';' or '!'")
    } else {
        None
    }
}

pub(crate) fn check_field(field: &'static str, value: &str) -> ProgramResult<()> {
    match field_text_error(value) {
        Some(reason) => Err(ProgramError::InvalidFieldText {
            field,
            value: value.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

struct ObjectWriter<'a> {
    out: &'a mut String,
    fields: Vec<(String, String)>,
}

impl<'a> ObjectWriter<'a> {
    fn new(out: &'a mut String) -> Self {
        Self {
            out,
            fields: Vec::new(),
        }
    }

    fn field(mut self, value: impl Into<String>, comment: impl Into<String>) -> Self {
        self.fields.push((value.into(), comment.into()));
        self
    }

    fn finish(self, class: &str) {
        self.out.push_str(class);
        self.out.push_str(",\n");
        let last = self.fields.len().saturating_sub(1);
        for (idx, (value, comment)) in self.fields.iter().enumerate() {
            let sep = if idx == last { ';' } else { ',' };
            let cell = format!("{value}{sep}");
            self.out.push_str(&format!(
                "    {cell:<width$} !- {comment}\n",
                width = VALUE_WIDTH
            ));
        }
        self.out.push('\n');
    }
}

fn write_program(out: &mut String, class: &str, program: &Program) {
    let mut writer = ObjectWriter::new(out).field(program.name.as_str(), "Name");
    for (idx, line) in program.body.lines().iter().enumerate() {
        writer = writer.field(line.as_str(), format!("Program Line {}", idx + 1));
    }
    writer.finish(class);
}

/// Render every object of `model` as IDF text.
pub fn to_idf(model: &EmsModel) -> String {
    let mut out = String::new();

    let reporting = model.reporting();
    ObjectWriter::new(&mut out)
        .field(
            reporting.actuator_availability.as_str(),
            "Actuator Availability Dictionary Reporting",
        )
        .field(
            reporting.internal_variable_availability.as_str(),
            "Internal Variable Availability Dictionary Reporting",
        )
        .field(
            reporting.debug_level.as_str(),
            "EMS Runtime Language Debug Output Level",
        )
        .finish("Output:EnergyManagementSystem");

    for sensor in model.sensors() {
        ObjectWriter::new(&mut out)
            .field(sensor.name.as_str(), "Name")
            .field(
                sensor.key.as_str(),
                "Output:Variable or Output:Meter Index Key Name",
            )
            .field(
                sensor.output_variable.as_str(),
                "Output:Variable or Output:Meter Name",
            )
            .finish("EnergyManagementSystem:Sensor");
    }

    for actuator in model.actuators() {
        ObjectWriter::new(&mut out)
            .field(actuator.name.as_str(), "Name")
            .field(
                actuator.component_name.as_str(),
                "Actuated Component Unique Name",
            )
            .field(actuator.component_type.as_str(), "Actuated Component Type")
            .field(
                actuator.control_type.as_str(),
                "Actuated Component Control Type",
            )
            .finish("EnergyManagementSystem:Actuator");
    }

    for global in model.globals() {
        ObjectWriter::new(&mut out)
            .field(global.name.as_str(), "Erl Variable 1 Name")
            .finish("EnergyManagementSystem:GlobalVariable");
    }

    for trend in model.trends() {
        ObjectWriter::new(&mut out)
            .field(trend.name.as_str(), "Name")
            .field(trend.source.as_str(), "EMS Variable Name")
            .field(
                trend.timesteps.to_string(),
                "Number of Timesteps to be Logged",
            )
            .finish("EnergyManagementSystem:TrendVariable");
    }

    for variable in model.internal_variables() {
        ObjectWriter::new(&mut out)
            .field(variable.name.as_str(), "Name")
            .field(variable.key.as_str(), "Internal Data Index Key Name")
            .field(variable.data_type.as_str(), "Internal Data Type")
            .finish("EnergyManagementSystem:InternalVariable");
    }

    for variable in model.construction_indices() {
        ObjectWriter::new(&mut out)
            .field(variable.name.as_str(), "Name")
            .field(variable.construction.as_str(), "Construction Object Name")
            .finish("EnergyManagementSystem:ConstructionIndexVariable");
    }

    for program in model.programs() {
        write_program(&mut out, "EnergyManagementSystem:Program", program);
    }

    for subroutine in model.subroutines() {
        write_program(&mut out, "EnergyManagementSystem:Subroutine", subroutine);
    }

    for manager in model.calling_managers() {
        let mut writer = ObjectWriter::new(&mut out)
            .field(manager.name.as_str(), "Name")
            .field(
                manager.calling_point.as_str(),
                "EnergyPlus Model Calling Point",
            );
        for (idx, program) in manager.programs.iter().enumerate() {
            writer = writer.field(program.as_str(), format!("Program Name {}", idx + 1));
        }
        writer.finish("EnergyManagementSystem:ProgramCallingManager");
    }

    for output in model.output_variables() {
        ObjectWriter::new(&mut out)
            .field(output.name.as_str(), "Name")
            .field(output.ems_variable.as_str(), "EMS Variable Name")
            .field(output.data.as_str(), "Type of Data in Variable")
            .field(output.frequency.as_str(), "Update Frequency")
            .field("", "EMS Program or Subroutine Name")
            .field(output.units.as_deref().unwrap_or(""), "Units")
            .finish("EnergyManagementSystem:OutputVariable");
    }

    for request in model.output_requests() {
        ObjectWriter::new(&mut out)
            .field(request.key.as_str(), "Key Value")
            .field(request.variable.as_str(), "Variable Name")
            .field(request.frequency.as_str(), "Reporting Frequency")
            .finish("Output:Variable");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Identifier;
    use crate::objects::{CallingPoint, ProgramCallingManager, Sensor};
    use crate::piecewise::PiecewiseRuleProgramBuilder;

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    #[test]
    fn renders_objects_in_order() {
        let mut model = EmsModel::new();
        model
            .add_sensor(Sensor::new(
                id("Tout"),
                "Win1",
                "Surface Outside Face Temperature",
            ))
            .unwrap();
        let body = PiecewiseRuleProgramBuilder::new("Tout")
            .rule(26.0, "C", "TC_25")
            .otherwise("C", "TC_85")
            .build()
            .unwrap();
        model.add_program(Program::new(id("Win1_Control"), body)).unwrap();
        model
            .add_calling_manager(
                ProgramCallingManager::new("Emulator", CallingPoint::BeginTimestepBeforePredictor)
                    .with_program(id("Win1_Control")),
            )
            .unwrap();

        let idf = to_idf(&model);
        let output = idf.find("Output:EnergyManagementSystem,").unwrap();
        let sensor = idf.find("EnergyManagementSystem:Sensor,").unwrap();
        let program = idf.find("EnergyManagementSystem:Program,").unwrap();
        let manager = idf.find("EnergyManagementSystem:ProgramCallingManager,").unwrap();
        assert!(output < sensor && sensor < program && program < manager);

        assert!(idf.contains("    IF Tout <= 26.0,"));
        assert!(idf.contains("!- Program Line 1\n"));
        assert!(idf.contains("    ENDIF;"));
        assert!(idf.contains("    BeginTimestepBeforePredictor,"));
        assert!(idf.contains("    Win1_Control;"));
    }

    #[test]
    fn output_requests_render_after_ems_objects() {
        use crate::objects::{OutputRequest, ReportingFrequency};

        let mut model = EmsModel::new();
        model
            .add_output_request(
                OutputRequest::new("EMS Condenser Flow Override On1")
                    .with_frequency(ReportingFrequency::Hourly),
            )
            .unwrap();
        let idf = to_idf(&model);
        let request = idf.find("Output:Variable,\n").unwrap();
        assert!(idf.find("Output:EnergyManagementSystem,").unwrap() < request);
        assert!(idf.contains("    *,"));
        assert!(idf.contains("    EMS Condenser Flow Override On1,"));
        assert!(idf.contains("    Hourly;"));
    }

    #[test]
    fn last_field_ends_with_semicolon() {
        let model = EmsModel::new();
        let idf = to_idf(&model);
        assert!(idf.starts_with("Output:EnergyManagementSystem,\n    None,"));
        assert!(idf.contains("    None;"));
    }
}
