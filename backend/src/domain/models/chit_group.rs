use tracing::warn;

use super::generate_id;
use crate::domain::commands::chit::CreateChitGroupCommand;
use shared::{ChitGroup, ChitStatus};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ChitGroupValidationError {
    #[error("Chit group name cannot be empty")]
    EmptyName,
    #[error("Chit group must run for at least one month")]
    NoMonths,
    #[error("Chit value must be positive")]
    NonPositiveChitValue,
    #[error("Installment amounts must be positive")]
    NonPositiveInstallment,
    #[error("Chit group not found: {0}")]
    NotFound(String),
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Validate a creation command and build the new, active group.
pub fn build_chit_group(command: &CreateChitGroupCommand) -> Result<ChitGroup, ChitGroupValidationError> {
    let name = command.name.trim();
    if name.is_empty() {
        return Err(ChitGroupValidationError::EmptyName);
    }
    if command.total_months == 0 {
        return Err(ChitGroupValidationError::NoMonths);
    }
    if !positive(command.chit_value) {
        return Err(ChitGroupValidationError::NonPositiveChitValue);
    }
    if !positive(command.installment_regular) || !positive(command.installment_allotted) {
        return Err(ChitGroupValidationError::NonPositiveInstallment);
    }
    if command.installment_allotted < command.installment_regular {
        warn!(
            "Group {} charges allotted members less ({:.2}) than regular members ({:.2})",
            name, command.installment_allotted, command.installment_regular
        );
    }

    Ok(ChitGroup {
        id: generate_id("chit"),
        name: name.to_string(),
        chit_value: command.chit_value,
        total_months: command.total_months,
        installment_regular: command.installment_regular,
        installment_allotted: command.installment_allotted,
        start_month: command.start_month,
        status: ChitStatus::Active,
        upi_id: command.upi_id.trim().to_string(),
    })
}
