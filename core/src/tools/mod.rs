pub mod calculator;
pub mod clock;
pub mod weather;

pub use calculator::CalculatorTool;
pub use clock::ClockTool;
pub use weather::WeatherTool;

use crate::agent::ToolRegistry;
use crate::error::AgentResult;
use std::sync::Arc;

pub fn register_default_tools(registry: &mut ToolRegistry) -> AgentResult<()> {
    registry.register(Arc::new(ClockTool))?;
    registry.register(Arc::new(CalculatorTool))?;
    registry.register(Arc::new(WeatherTool))?;
    Ok(())
}
