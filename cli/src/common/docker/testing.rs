//! # In-Memory Container Engine for Tests
//!
//! File: cli/src/common/docker/testing.rs
//! Author: Christi Mahu
//!
//! `RecordingEngine` implements [`ContainerEngine`] without a daemon. Each test
//! scripts the responses it needs (images before/after a pull, log lines,
//! inspect data, exec result) and afterwards asserts on the recorded calls.
//!
use super::engine::{ContainerEngine, ExecOutput, LogStream};
use async_trait::async_trait;
use bollard::{
    container::{Config, LogOutput},
    errors::Error as DockerError,
    exec::CreateExecOptions,
    models::{
        ContainerCreateResponse, ContainerInspectResponse, ImageSummary, NetworkSettings,
        PortBinding,
    },
};
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// How the scripted log stream behaves.
#[derive(Clone, Debug)]
pub enum LogScript {
    /// Yield these chunks on stdout, then end.
    Chunks(Vec<String>),
    /// Never yield anything and never end.
    Hang,
    /// Fail on the first poll.
    Fail,
    /// Yield these frames as given, stdout and stderr interleaved.
    Frames(Vec<LogOutput>),
}

#[derive(Default)]
pub(crate) struct Recorded {
    calls: Vec<String>,
    created: Vec<Config<String>>,
    execs: Vec<(String, CreateExecOptions<String>)>,
}

/// Scriptable, call-recording engine.
#[derive(Clone)]
pub struct RecordingEngine {
    pub images_before_pull: Vec<ImageSummary>,
    pub images_after_pull: Vec<ImageSummary>,
    pub container_id: String,
    pub container_name: String,
    pub log_script: LogScript,
    pub port_bindings: Option<Vec<PortBinding>>,
    pub exec_result: ExecOutput,
    pub hang_pull: bool,
    pub fail_create: bool,
    pub fail_exec: bool,
    pub(crate) pulled: Arc<Mutex<bool>>,
    pub(crate) recorded: Arc<Mutex<Recorded>>,
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self {
            images_before_pull: vec![image("sha256:0123456789abcdef", &["rjw57/jupyter:latest"])],
            images_after_pull: Vec::new(),
            container_id: "c0ffee0123456789".to_string(),
            container_name: "/eager_turing".to_string(),
            log_script: LogScript::Chunks(vec![
                "[I 10:00:00.000 NotebookApp] The Jupyter Notebook is running\n".to_string(),
            ]),
            port_bindings: Some(vec![binding("127.0.0.1", "49155")]),
            exec_result: ExecOutput {
                output: String::new(),
                exit_code: Some(0),
            },
            hang_pull: false,
            fail_create: false,
            fail_exec: false,
            pulled: Arc::new(Mutex::new(false)),
            recorded: Arc::new(Mutex::new(Recorded::default())),
        }
    }
}

pub fn image(id: &str, tags: &[&str]) -> ImageSummary {
    ImageSummary {
        id: id.to_string(),
        repo_tags: tags.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    }
}

pub fn stdout(text: &str) -> LogOutput {
    LogOutput::StdOut {
        message: text.to_string().into_bytes().into(),
    }
}

pub fn stderr(text: &str) -> LogOutput {
    LogOutput::StdErr {
        message: text.to_string().into_bytes().into(),
    }
}

pub fn binding(ip: &str, port: &str) -> PortBinding {
    PortBinding {
        host_ip: Some(ip.to_string()),
        host_port: Some(port.to_string()),
    }
}

fn server_error(status_code: u16, message: &str) -> DockerError {
    DockerError::DockerResponseServerError {
        status_code,
        message: message.to_string(),
    }
}

impl RecordingEngine {
    /// Names of the engine calls made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.recorded.lock().unwrap().calls.clone()
    }

    pub fn created_configs(&self) -> Vec<Config<String>> {
        self.recorded.lock().unwrap().created.clone()
    }

    pub fn execs(&self) -> Vec<(String, CreateExecOptions<String>)> {
        self.recorded.lock().unwrap().execs.clone()
    }

    fn record(&self, call: &str) {
        self.recorded.lock().unwrap().calls.push(call.to_string());
    }
}

#[async_trait]
impl ContainerEngine for RecordingEngine {
    async fn list_images(&self, _repository: &str) -> Result<Vec<ImageSummary>, DockerError> {
        self.record("list_images");
        if *self.pulled.lock().unwrap() {
            Ok(self.images_after_pull.clone())
        } else {
            Ok(self.images_before_pull.clone())
        }
    }

    async fn pull_image(&self, _repository: &str) -> Result<(), DockerError> {
        self.record("pull_image");
        if self.hang_pull {
            std::future::pending::<()>().await;
        }
        *self.pulled.lock().unwrap() = true;
        Ok(())
    }

    async fn create_container(
        &self,
        config: Config<String>,
    ) -> Result<ContainerCreateResponse, DockerError> {
        self.record("create_container");
        if self.fail_create {
            return Err(server_error(400, "invalid mount config"));
        }
        self.recorded.lock().unwrap().created.push(config);
        Ok(ContainerCreateResponse {
            id: self.container_id.clone(),
            warnings: Vec::new(),
        })
    }

    async fn start_container(&self, _id: &str) -> Result<(), DockerError> {
        self.record("start_container");
        Ok(())
    }

    fn logs(&self, _id: &str) -> LogStream {
        self.record("logs");
        match &self.log_script {
            LogScript::Chunks(chunks) => stream::iter(
                chunks
                    .iter()
                    .map(|c| {
                        Ok(LogOutput::StdOut {
                            message: c.clone().into_bytes().into(),
                        })
                    })
                    .collect::<Vec<_>>(),
            )
            .boxed(),
            LogScript::Hang => stream::pending::<Result<LogOutput, DockerError>>().boxed(),
            LogScript::Fail => stream::iter(vec![Err(server_error(500, "log stream broke"))]).boxed(),
            LogScript::Frames(frames) => {
                stream::iter(frames.iter().cloned().map(Ok).collect::<Vec<_>>()).boxed()
            }
        }
    }

    async fn run_exec(
        &self,
        id: &str,
        options: CreateExecOptions<String>,
    ) -> Result<ExecOutput, DockerError> {
        self.record("run_exec");
        if self.fail_exec {
            return Err(server_error(409, "container is not running"));
        }
        self.recorded
            .lock()
            .unwrap()
            .execs
            .push((id.to_string(), options));
        Ok(self.exec_result.clone())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerInspectResponse, DockerError> {
        self.record("inspect_container");
        if id != self.container_id {
            return Err(server_error(404, "no such container"));
        }
        let mut ports = HashMap::new();
        ports.insert("8888/tcp".to_string(), self.port_bindings.clone());
        Ok(ContainerInspectResponse {
            id: Some(self.container_id.clone()),
            name: Some(self.container_name.clone()),
            network_settings: Some(NetworkSettings {
                ports: Some(ports),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}
