//! Pipeline stage descriptor.

/// One node in the pipeline DAG, backed by one external process.
#[derive(Debug, Clone)]
pub struct Stage {
    /// Stage name, unique within a pipeline.
    pub name: String,
    /// Process invocation: program followed by its arguments.
    pub command: Vec<String>,
    /// Names of stages that must succeed before this one starts.
    pub depends_on: Vec<String>,
}

impl Stage {
    pub fn new(
        name: impl Into<String>,
        command: Vec<String>,
        depends_on: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            command,
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Program to execute (first element of the command).
    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or("")
    }

    /// Arguments after the program.
    pub fn args(&self) -> &[String] {
        self.command.get(1..).unwrap_or(&[])
    }

    /// Human-readable command line for logs.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}
