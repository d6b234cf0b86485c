use anyhow::Result;
use log::warn;
use rand::Rng;
use rstest::*;
use std::path::{Path, PathBuf};
use std::process::Command;

const COVERAGE_TEST_DATA_DIR: &str = "generated-test-data";

pub fn rid() -> String {
    let mut rng = rand::rng();
    let rid: String = (0..10)
        .map(|_| rng.sample(rand::distr::Alphanumeric) as char)
        .collect();
    rid
}

pub fn get_disg_bin() -> String {
    // Tests may change directories, so anchor on the manifest dir
    let cargo_manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
        .unwrap_or_else(|_| {
            let mut current = std::env::current_dir().unwrap();
            loop {
                if current.join("Cargo.toml").exists() {
                    break current.to_string_lossy().to_string();
                }
                if let Some(parent) = current.parent() {
                    current = parent.to_path_buf();
                } else {
                    panic!("Could not find project root");
                }
            }
        });

    let project_root = Path::new(&cargo_manifest_dir);

    let bin = if let Ok(current_exe) = std::env::current_exe() {
        if current_exe.to_string_lossy().contains("/coverage/") {
            "target/coverage/disg"
        } else {
            "target/debug/disg"
        }
    } else {
        "target/debug/disg"
    };

    let path = project_root.join(bin);
    let absolute_path = path.canonicalize().unwrap_or_else(|_| path.clone());
    absolute_path.to_string_lossy().to_string()
}

/// Runs the disg binary against a scratch directory of its own.
pub struct DisgManager {
    pub name: String,
    pub last_stdout: String,
    pub last_stderr: String,
    pub last_code: Option<i32>,
    pub debug_mode: bool,
    /* we store the binary path so we can chdir as necessary */
    pub disg_bin: String,
    pub no_default_options: bool,
    pub cwd: Option<PathBuf>,
}

impl DisgManager {
    pub fn new() -> Self {
        let name = format!("disg-coverage-test-{}", rid());

        #[allow(clippy::panic)]
        if let Err(e) =
            std::fs::create_dir_all(Path::new(COVERAGE_TEST_DATA_DIR).join(&name))
        {
            panic!("Failed to create {} dir: {}", COVERAGE_TEST_DATA_DIR, e);
        }

        Self {
            name,
            last_stdout: String::new(),
            last_stderr: String::new(),
            last_code: None,
            debug_mode: false,
            disg_bin: get_disg_bin(),
            no_default_options: false,
            cwd: None,
        }
    }

    /* When debug mode is on, the scratch directory is left behind on drop */
    #[allow(dead_code)]
    pub fn set_debug_mode(&mut self, debug_mode: bool) {
        self.debug_mode = debug_mode;
    }

    pub fn scratch_dir(&self) -> PathBuf {
        let dir = Path::new(COVERAGE_TEST_DATA_DIR).join(&self.name);
        dir.canonicalize().unwrap_or(dir)
    }

    /// Store path handed to disg unless the test passes its own `--path`
    pub fn store_path(&self) -> PathBuf {
        self.scratch_dir().join("store")
    }

    pub fn run(&mut self, args: &[&str]) -> Result<std::process::Output> {
        self.run_with_env(args, "", "")
    }

    pub fn run_with_env(
        &mut self,
        args: &[&str],
        env_key: &str,
        env_value: &str,
    ) -> Result<std::process::Output> {
        let mut cmd = Command::new(&self.disg_bin);
        if !env_key.is_empty() {
            println!("Setting env var: {}={}", env_key, env_value);
            cmd.env(env_key, env_value);
        }
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        if !self.no_default_options {
            if !args.iter().any(|arg| {
                arg.starts_with("--log-level") || arg.starts_with("-v")
            }) {
                cmd.args(["-v"]);
            }
            if !args.iter().any(|arg| arg.starts_with("--path")) {
                cmd.args([format!("--path={}", self.store_path().display())]);
            }
        }
        cmd.args(args);
        println!(
            "Running command: {} {}",
            cmd.get_program().to_string_lossy(),
            cmd.get_args()
                .map(|c| c.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = cmd
            .output()
            .map_err(|e| anyhow::anyhow!("Command failed: {}", e))?;
        self.last_stdout = String::from_utf8_lossy(&output.stdout).to_string();
        self.last_stderr = String::from_utf8_lossy(&output.stderr).to_string();
        self.last_code = output.status.code();

        match self.last_code {
            Some(0) => Ok(output),
            Some(code) => Err(anyhow::anyhow!(
                "Command returned non-zero exit code: {}\nstdout: {}\nstderr: {}",
                code,
                self.last_stdout,
                self.last_stderr
            )),
            None => Err(anyhow::anyhow!(
                "Command did not return a valid exit code\nstdout: {}\nstderr: {}",
                self.last_stdout,
                self.last_stderr
            )),
        }
    }

    #[allow(dead_code)]
    pub fn exfail(
        &mut self,
        args: &[&str],
        env_key: &str,
        env_value: &str,
    ) -> bool {
        if self.run_with_env(args, env_key, env_value).is_err() {
            return true;
        }
        println!("last_stderr: {}", self.last_stderr);
        println!("last_stdout: {}", self.last_stdout);
        false
    }

    #[allow(dead_code)]
    pub fn epass(
        &mut self,
        args: &[&str],
        env_key: &str,
        env_value: &str,
    ) -> bool {
        if self.run_with_env(args, env_key, env_value).is_ok() {
            return true;
        }
        println!("last_stderr: {}", self.last_stderr);
        println!("last_stdout: {}", self.last_stdout);
        false
    }

    #[allow(dead_code)]
    pub fn pass(&mut self, args: &[&str]) -> bool {
        if self.run(args).is_ok() {
            return true;
        }
        println!("last_stderr: {}", self.last_stderr);
        println!("last_stdout: {}", self.last_stdout);
        false
    }

    #[allow(dead_code)]
    pub fn xfail(&mut self, args: &[&str]) -> bool {
        if self.run(args).is_err() {
            return true;
        }
        println!("last_stderr: {}", self.last_stderr);
        println!("last_stdout: {}", self.last_stdout);
        false
    }

    /// Whether the kernel lets this user create a user namespace at all.
    #[allow(dead_code)]
    pub fn user_namespaces_available(&self) -> bool {
        Command::new("unshare")
            .args(["--user", "--mount", "true"])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

impl Drop for DisgManager {
    fn drop(&mut self) {
        let dirname = Path::new(COVERAGE_TEST_DATA_DIR).join(&self.name);
        if self.debug_mode {
            warn!("Debug mode is on, *NOT* cleaning up {}", dirname.display());
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&dirname) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {} dir: {}", dirname.display(), e);
            }
        }
    }
}

#[fixture]
pub fn disg() -> DisgManager {
    DisgManager::new()
}

/// The launch chain decides where it is from `/proc/self/uid_map`, so the
/// `--unshare` tests only make sense when the test runner itself is in the
/// initial user namespace.
#[allow(dead_code)]
pub fn runner_in_initial_user_ns() -> bool {
    match std::fs::read_to_string("/proc/self/uid_map") {
        Ok(map) => {
            let fields: Vec<&str> = map
                .lines()
                .next()
                .unwrap_or("")
                .split_whitespace()
                .collect();
            fields == ["0", "0", "4294967295"]
        }
        Err(_) => false,
    }
}
