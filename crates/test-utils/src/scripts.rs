#![allow(dead_code)]

//! Shell scripts standing in for cluster members.
//!
//! A script prints the configured lines (optionally after a delay), then
//! either exits with a code or keeps running until it is killed.

use std::path::{Path, PathBuf};

use anyhow::Result;

pub struct ScriptBuilder {
    name: String,
    steps: Vec<String>,
    ignore_sigterm: bool,
    ending: Ending,
}

enum Ending {
    Exit(i32),
    RunForever,
}

impl ScriptBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            steps: Vec::new(),
            ignore_sigterm: false,
            ending: Ending::Exit(0),
        }
    }

    pub fn stdout(mut self, line: &str) -> Self {
        self.steps.push(format!("echo {}", quote(line)));
        self
    }

    pub fn stderr(mut self, line: &str) -> Self {
        self.steps.push(format!("echo {} >&2", quote(line)));
        self
    }

    /// Echo every argument the script was started with, one per line.
    pub fn echo_args(mut self) -> Self {
        self.steps
            .push("for a in \"$@\"; do echo \"arg: $a\"; done".to_string());
        self
    }

    /// Echo an environment variable as `env: NAME=value`.
    pub fn echo_env(mut self, var: &str) -> Self {
        self.steps.push(format!("echo \"env: {var}=${var}\""));
        self
    }

    pub fn sleep_ms(mut self, millis: u64) -> Self {
        self.steps
            .push(format!("sleep {}.{:03}", millis / 1000, millis % 1000));
        self
    }

    pub fn ignore_sigterm(mut self) -> Self {
        self.ignore_sigterm = true;
        self
    }

    pub fn exit(mut self, code: i32) -> Self {
        self.ending = Ending::Exit(code);
        self
    }

    /// Keep running (as `sleep`, via `exec`) until killed.
    pub fn run_forever(mut self) -> Self {
        self.ending = Ending::RunForever;
        self
    }

    /// Write the script into `dir` and make it executable.
    pub fn write(self, dir: &Path) -> Result<PathBuf> {
        let mut body = String::from("#!/bin/sh\n");
        if self.ignore_sigterm {
            body.push_str("trap '' TERM\n");
        }
        for step in self.steps {
            body.push_str(&step);
            body.push('\n');
        }
        match self.ending {
            Ending::Exit(code) => body.push_str(&format!("exit {code}\n")),
            Ending::RunForever => body.push_str("exec sleep 3600\n"),
        }

        let path = dir.join(&self.name);
        std::fs::write(&path, body)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
        }

        Ok(path)
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
