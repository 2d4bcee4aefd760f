//! テスト用のコンテナエンジン

use crate::engine::{ContainerEngine, EngineCommand};
use crate::error::{BuildError, BuildResult};
use std::sync::Mutex;

type Predicate = fn(&EngineCommand) -> bool;

/// 発行されたコマンドを記録し、条件に一致したコマンドを失敗させる
#[derive(Default)]
pub struct RecordingEngine {
    commands: Mutex<Vec<EngineCommand>>,
    failures: Vec<(Predicate, String)>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, predicate: Predicate, stderr: &str) -> Self {
        self.failures.push((predicate, stderr.to_string()));
        self
    }

    pub fn commands(&self) -> Vec<EngineCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.commands().iter().map(|c| c.to_string()).collect()
    }
}

impl ContainerEngine for RecordingEngine {
    async fn run(&self, command: &EngineCommand) -> BuildResult<()> {
        self.commands.lock().unwrap().push(command.clone());

        for (predicate, stderr) in &self.failures {
            if predicate(command) {
                return Err(BuildError::CommandFailed {
                    command: command.to_string(),
                    code: Some(1),
                    stderr: stderr.clone(),
                });
            }
        }

        Ok(())
    }
}
