//! Recognizers backed by an external command.
//!
//! The crop is written to a temporary PNG, the command is run with the file
//! path substituted for `{input}`, and whatever it prints on stdout is the
//! answer. A command that outlives its timeout is killed.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use image::{DynamicImage, ImageFormat};
use regex::Regex;

use super::recognizer::{FormulaRecognizer, TextRecognizer};
use crate::error::{Error, RecognitionError, Result};

/// Placeholder replaced by the path of the crop image.
pub const INPUT_PLACEHOLDER: &str = "{input}";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A recognizer that shells out to a program such as `tesseract`.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    name: String,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandRecognizer {
    /// Create a recognizer from a program and its arguments.
    ///
    /// `{input}` is appended to the arguments when none of them contains it.
    /// The command is killed after [`DEFAULT_RECOGNITION_TIMEOUT`] unless
    /// [`with_timeout`](Self::with_timeout) says otherwise.
    ///
    /// [`DEFAULT_RECOGNITION_TIMEOUT`]: super::DEFAULT_RECOGNITION_TIMEOUT
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let program = program.into();
        let mut args: Vec<String> = args.into_iter().map(Into::into).collect();
        if !args.iter().any(|a| a.contains(INPUT_PLACEHOLDER)) {
            args.push(INPUT_PLACEHOLDER.to_string());
        }
        Self {
            name: program.clone(),
            program,
            args,
            timeout: super::recognizer::DEFAULT_RECOGNITION_TIMEOUT,
        }
    }

    /// Parse a command line such as `tesseract {input} stdout --psm 6`.
    ///
    /// Arguments are split on whitespace; double quotes group words.
    pub fn parse(cmdline: &str) -> Result<Self> {
        let splitter = Regex::new(r#""([^"]*)"|(\S+)"#)
            .map_err(|e| Error::Other(format!("invalid argument pattern: {}", e)))?;
        let mut words = splitter.captures_iter(cmdline).filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string())
        });
        let program = words.next().ok_or_else(|| {
            Error::Configuration("recognizer command line is empty".to_string())
        })?;
        Ok(Self::new(program, words))
    }

    /// Tesseract printing plain text for a single block of text.
    pub fn tesseract() -> Self {
        Self::new("tesseract", [INPUT_PLACEHOLDER, "stdout", "--psm", "6"])
    }

    /// Set the name used in logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set how long the command may run before it is killed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// How long the command may run.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Program to run.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Argument template.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run the command on `image` and return its stdout.
    pub fn run(&self, image: &DynamicImage) -> std::result::Result<String, RecognitionError> {
        let input = tempfile::Builder::new()
            .prefix("pagesplice-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| RecognitionError::Failed(format!("cannot create scratch file: {}", e)))?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| RecognitionError::Failed(format!("cannot write scratch image: {}", e)))?;

        let input_path = input.path().to_string_lossy();
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace(INPUT_PLACEHOLDER, &input_path))
            .collect();

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RecognitionError::Spawn {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let status = self.wait(&mut child)?;

        let stdout = join_output(stdout)?;
        let stderr = join_output(stderr)?;
        if !status.success() {
            return Err(RecognitionError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                status,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    fn wait(&self, child: &mut Child) -> std::result::Result<ExitStatus, RecognitionError> {
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    log::warn!("{} killed after {:?}", self.program, self.timeout);
                    return Err(RecognitionError::Timeout(self.timeout));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    return Err(RecognitionError::Failed(format!(
                        "cannot wait for {}: {}",
                        self.program, e
                    )));
                }
            }
        }
    }
}

type OutputReader = Option<thread::JoinHandle<std::io::Result<Vec<u8>>>>;

/// Read a child pipe to the end on its own thread so the child never blocks.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> OutputReader {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn join_output(reader: OutputReader) -> std::result::Result<Vec<u8>, RecognitionError> {
    match reader {
        Some(handle) => handle
            .join()
            .map_err(|_| RecognitionError::Failed("output reader panicked".to_string()))?
            .map_err(|e| RecognitionError::Failed(format!("cannot read output: {}", e))),
        None => Ok(Vec::new()),
    }
}

impl TextRecognizer for CommandRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn recognize_text(&self, image: &DynamicImage) -> std::result::Result<String, RecognitionError> {
        self.run(image)
    }
}

impl FormulaRecognizer for CommandRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn recognize_latex(&self, image: &DynamicImage) -> std::result::Result<String, RecognitionError> {
        self.run(image)
    }
}
