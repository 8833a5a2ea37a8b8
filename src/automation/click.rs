// Click injection backends
use crate::command::CommandTemplate;
use crate::config::{ClickConfig, Point};
use crate::error::InjectionError;
use async_trait::async_trait;

/// Performs a click at a screen coordinate.
///
/// Errors are never retried by the caller: a failing sink stops automation.
#[async_trait]
pub trait ClickSink: Send + Sync {
    async fn click(&self, point: Point) -> Result<(), InjectionError>;
}

/// Clicks by running an external tool such as `xdotool`.
pub struct CommandClickSink {
    template: CommandTemplate,
}

impl CommandClickSink {
    pub fn new(config: &ClickConfig) -> Self {
        Self {
            template: CommandTemplate::new(config.command.clone()),
        }
    }
}

#[async_trait]
impl ClickSink for CommandClickSink {
    async fn click(&self, point: Point) -> Result<(), InjectionError> {
        let command = self.template.program().to_string();
        let output = self
            .template
            .run(&[("x", point.x.to_string()), ("y", point.y.to_string())])
            .await
            .map_err(|source| InjectionError::Unavailable {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(InjectionError::CommandFailed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        log::trace!("🖱️ {} clicked ({}, {})", command, point.x, point.y);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_click_tool_is_unavailable() {
        let sink = CommandClickSink::new(&ClickConfig {
            command: vec!["definitely-not-a-click-tool-xyz".into(), "{x}".into(), "{y}".into()],
        });
        let err = sink.click(Point::new(1, 2)).await.unwrap_err();
        assert!(matches!(err, InjectionError::Unavailable { .. }), "got {err}");
    }
}
