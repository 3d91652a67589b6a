use crate::traits::Tool;
use async_trait::async_trait;

/// Canned weather report; no weather service is queried.
pub struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather_info"
    }

    fn description(&self) -> &str {
        "Get weather information for a location. Input should be a city name."
    }

    async fn invoke(&self, argument: &str) -> anyhow::Result<String> {
        let location = argument.trim();
        if location.is_empty() {
            anyhow::bail!("Missing location");
        }
        Ok(format!(
            "Weather in {}: Sunny, 22°C (This is a mock response - integrate with a real weather API)",
            location
        ))
    }
}
